use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CONSENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentCategory {
    Applications,
    WindowTitles,
    SystemHealth,
    DeviceInfo,
}

impl ConsentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentCategory::Applications => "applications",
            ConsentCategory::WindowTitles => "window_titles",
            ConsentCategory::SystemHealth => "system_health",
            ConsentCategory::DeviceInfo => "device_info",
        }
    }
}

/// One atomic consent record. Absence of the record means no consent for
/// anything; a category is granted only when explicitly `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyConsent {
    pub applications: bool,
    pub window_titles: bool,
    pub system_health: bool,
    pub device_info: bool,
    pub consent_date: DateTime<Utc>,
    pub consent_version: String,
}

impl PrivacyConsent {
    pub fn grant_all() -> Self {
        Self {
            applications: true,
            window_titles: true,
            system_health: true,
            device_info: true,
            consent_date: Utc::now(),
            consent_version: CONSENT_VERSION.into(),
        }
    }

    pub fn deny_all() -> Self {
        Self {
            applications: false,
            window_titles: false,
            system_health: false,
            device_info: false,
            consent_date: Utc::now(),
            consent_version: CONSENT_VERSION.into(),
        }
    }

    pub fn granted(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Applications => self.applications,
            ConsentCategory::WindowTitles => self.window_titles,
            ConsentCategory::SystemHealth => self.system_health,
            ConsentCategory::DeviceInfo => self.device_info,
        }
    }
}
