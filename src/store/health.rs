use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, warn};
use rand::Rng;
use serde::Serialize;

use super::{consent_allows, load_consent, Store};
use crate::keys;
use crate::models::{ConsentCategory, HealthReading, SystemHealth, SystemHealthPatch};
use crate::storage::Kv;

/// One row of exported health history, stamped with the owning device.
#[derive(Debug, Clone, Serialize)]
pub struct HealthExportRow {
    pub device_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub snapshot: SystemHealth,
}

impl Store {
    /// Merge a partial sample into the stored snapshot and stamp
    /// `last_updated`. Rejected without `system_health` consent.
    pub fn update_system_health(&self, patch: SystemHealthPatch) -> bool {
        match self.try_update_system_health(patch) {
            Ok(accepted) => accepted,
            Err(err) => {
                error!("failed to update system health: {err:#}");
                false
            }
        }
    }

    fn try_update_system_health(&self, patch: SystemHealthPatch) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open health transaction")?;
        {
            let kv = Kv::new(&tx);
            let consent = load_consent(&kv)?;
            if !consent_allows(&consent, ConsentCategory::SystemHealth) {
                warn!("system health update rejected without consent");
                return Ok(false);
            }

            let mut snapshot: SystemHealth = kv
                .get_json_or_absent(keys::SYSTEM_HEALTH)?
                .unwrap_or_else(|| SystemHealth::zeroed(Utc::now()));
            snapshot.apply(patch);
            snapshot.last_updated = Utc::now();
            kv.put_json(keys::SYSTEM_HEALTH, &snapshot)?;
        }
        tx.commit().context("failed to commit health update")?;
        Ok(true)
    }

    /// Current health reading. Without consent, or before any genuine sample
    /// has been recorded, a synthesized placeholder is returned and tagged as
    /// such; stored consented data comes back as `Real`.
    pub fn system_health(&self) -> HealthReading {
        match self.try_system_health() {
            Ok(reading) => reading,
            Err(err) => {
                error!("failed to read system health: {err:#}");
                HealthReading::Placeholder(sample_snapshot())
            }
        }
    }

    fn try_system_health(&self) -> Result<HealthReading> {
        let conn = self.lock();
        let kv = Kv::new(&conn);
        let consent = load_consent(&kv)?;
        let stored: Option<SystemHealth> = kv.get_json_or_absent(keys::SYSTEM_HEALTH)?;

        if consent_allows(&consent, ConsentCategory::SystemHealth) {
            if let Some(snapshot) = stored {
                // The zeroed first-run placeholder has no cpu reading yet.
                if snapshot.cpu_usage > 0.0 {
                    return Ok(HealthReading::Real(snapshot));
                }
            }
        }
        Ok(HealthReading::Placeholder(sample_snapshot()))
    }

    /// Stored health history for export. The store keeps a single latest
    /// snapshot, so the history is at most one row.
    pub fn export_health_history(&self) -> Vec<HealthExportRow> {
        let conn = self.lock();
        let kv = Kv::new(&conn);
        let stored = match kv.get_json_or_absent::<SystemHealth>(keys::SYSTEM_HEALTH) {
            Ok(stored) => stored,
            Err(err) => {
                error!("failed to export system health: {err:#}");
                None
            }
        };
        let device_id = kv.get(keys::DEVICE_ID).unwrap_or_default();

        stored
            .map(|snapshot| {
                vec![HealthExportRow {
                    device_id,
                    recorded_at: snapshot.last_updated,
                    snapshot,
                }]
            })
            .unwrap_or_default()
    }
}

/// Display values in the same ranges the product has always shown while no
/// real sample is available.
fn sample_snapshot() -> SystemHealth {
    let mut rng = rand::thread_rng();
    SystemHealth {
        cpu_usage: rng.gen_range(35.0..50.0),
        memory_usage: rng.gen_range(60.0..70.0),
        disk_usage: rng.gen_range(50.0..70.0),
        network_in: rng.gen_range(0.0..102_400.0),
        network_out: rng.gen_range(0.0..51_200.0),
        processes_count: rng.gen_range(30..50),
        battery_level: rng.gen_range(70.0..100.0),
        battery_charging: rng.gen_bool(0.5),
        temperature: rng.gen_range(40.0..50.0),
        uptime_secs: rng.gen_range(0..86_400),
        last_updated: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrivacyConsent;

    fn cpu_patch(cpu_usage: f64) -> SystemHealthPatch {
        SystemHealthPatch {
            cpu_usage: Some(cpu_usage),
            memory_usage: Some(41.5),
            processes_count: Some(120),
            ..SystemHealthPatch::default()
        }
    }

    #[test]
    fn update_is_rejected_without_consent() {
        let store = Store::open_in_memory().unwrap();

        // No consent record at all.
        assert!(!store.update_system_health(cpu_patch(12.0)));

        // A record that explicitly denies the category.
        store.set_privacy_consent(PrivacyConsent {
            system_health: false,
            ..PrivacyConsent::grant_all()
        });
        assert!(!store.update_system_health(cpu_patch(12.0)));
    }

    #[test]
    fn reading_is_a_placeholder_until_a_real_sample_lands() {
        let store = Store::open_in_memory().unwrap();

        // Unconsented: synthesized, flagged.
        assert!(store.system_health().is_placeholder());

        store.set_privacy_consent(PrivacyConsent::grant_all());
        // Consented but still only the zeroed first-run snapshot.
        assert!(store.system_health().is_placeholder());

        assert!(store.update_system_health(cpu_patch(23.4)));
        let reading = store.system_health();
        assert!(!reading.is_placeholder());
        assert!((reading.snapshot().cpu_usage - 23.4).abs() < 1e-9);
        assert!((reading.snapshot().memory_usage - 41.5).abs() < 1e-9);
    }

    #[test]
    fn update_merges_into_the_existing_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent::grant_all());

        store.update_system_health(cpu_patch(23.4));
        store.update_system_health(SystemHealthPatch {
            disk_usage: Some(77.0),
            ..SystemHealthPatch::default()
        });

        let reading = store.system_health();
        let snapshot = reading.snapshot();
        // Earlier fields survive the partial update.
        assert!((snapshot.cpu_usage - 23.4).abs() < 1e-9);
        assert!((snapshot.disk_usage - 77.0).abs() < 1e-9);
        assert_eq!(snapshot.processes_count, 120);
    }

    #[test]
    fn consent_withdrawal_hides_real_data_behind_a_placeholder() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent::grant_all());
        store.update_system_health(cpu_patch(23.4));
        assert!(!store.system_health().is_placeholder());

        store.set_privacy_consent(PrivacyConsent::deny_all());
        assert!(store.system_health().is_placeholder());
    }

    #[test]
    fn export_carries_the_device_id() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent::grant_all());
        store.update_system_health(cpu_patch(23.4));

        let rows = store.export_health_history();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_id, store.device_id());
        assert!((rows[0].snapshot.cpu_usage - 23.4).abs() < 1e-9);
    }
}
