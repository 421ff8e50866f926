use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor of the device this store lives on. Without `device_info`
/// consent only the generic fields are populated and `requires_consent` is
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub os: String,
    pub os_version: Option<String>,
    pub requires_consent: bool,
    pub tracking_enabled: bool,
    pub last_active: DateTime<Utc>,
}

/// Descriptor of the current session. When `applications` consent is absent
/// the session is reported inactive with `requires_consent` set and the
/// identity fields left empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: String,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub requires_consent: bool,
    pub productivity_score: Option<f64>,
}
