use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An insight payload keyed by insight type. The payload shape is owned by
/// whichever analysis produced it; the store only stamps `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRecord {
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}
