use log::{error, info};

use super::{consent_allows, load_consent, Store};
use crate::keys;
use crate::models::{ConsentCategory, PrivacyConsent};
use crate::storage::Kv;

impl Store {
    /// Store the consent record atomically, replacing any previous one.
    pub fn set_privacy_consent(&self, consent: PrivacyConsent) -> bool {
        let conn = self.lock();
        match Kv::new(&conn).put_json(keys::PRIVACY_CONSENT, &consent) {
            Ok(()) => {
                info!(
                    "privacy consent recorded (version {})",
                    consent.consent_version
                );
                true
            }
            Err(err) => {
                error!("failed to store privacy consent: {err:#}");
                false
            }
        }
    }

    pub fn privacy_consent(&self) -> Option<PrivacyConsent> {
        let conn = self.lock();
        match load_consent(&Kv::new(&conn)) {
            Ok(consent) => consent,
            Err(err) => {
                error!("failed to read privacy consent: {err:#}");
                None
            }
        }
    }

    /// `true` only when the category is explicitly granted; a missing record
    /// grants nothing.
    pub fn has_consent(&self, category: ConsentCategory) -> bool {
        let conn = self.lock();
        match load_consent(&Kv::new(&conn)) {
            Ok(consent) => consent_allows(&consent, category),
            Err(err) => {
                error!("failed to check consent: {err:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_record_grants_nothing() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.privacy_consent().is_none());
        assert!(!store.has_consent(ConsentCategory::Applications));
        assert!(!store.has_consent(ConsentCategory::SystemHealth));
    }

    #[test]
    fn explicit_false_is_still_denied() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent {
            system_health: false,
            ..PrivacyConsent::grant_all()
        });

        assert!(!store.has_consent(ConsentCategory::SystemHealth));
        assert!(store.has_consent(ConsentCategory::Applications));
    }

    #[test]
    fn record_is_replaced_as_a_whole() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent::grant_all());
        assert!(store.has_consent(ConsentCategory::WindowTitles));

        store.set_privacy_consent(PrivacyConsent::deny_all());
        let consent = store.privacy_consent().unwrap();
        assert!(!consent.applications);
        assert!(!consent.window_titles);
        assert!(!consent.system_health);
        assert!(!consent.device_info);
    }

    #[test]
    fn corrupt_consent_reads_as_no_consent() {
        let store = Store::open_in_memory().unwrap();
        {
            let conn = store.lock();
            Kv::new(&conn).put(keys::PRIVACY_CONSENT, "][").unwrap();
        }
        assert!(store.privacy_consent().is_none());
        assert!(!store.has_consent(ConsentCategory::Applications));
    }
}
