//! Local-first activity tracking store: a consent-gated, capped, key-value
//! backed record of user activity, suggestions, feedback, settings and
//! system health, plus the derived views a UI reads.

mod ids;
mod keys;
mod models;
mod sampler;
mod storage;
mod store;

pub use models::{
    ActiveSession, Activity, ActivityKind, ActivityPatch, ConsentCategory, DeviceInfo,
    FeedbackEntry, FeedbackRating, HealthReading, InsightRecord, NewActivity, NewSuggestion,
    PrivacyConsent, PrivacyLevel, Settings, SettingsPatch, Suggestion, SuggestionStatus,
    SystemHealth, SystemHealthPatch, Theme, CONSENT_VERSION,
};
pub use sampler::HealthSampler;
pub use store::{
    ActivityStatistics, AppUsage, HealthExportRow, StorageUsage, Store, StoreOptions,
    REDACTED_WINDOW_TITLE, STORAGE_BUDGET_BYTES, STORE_VERSION,
};
