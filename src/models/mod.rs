mod activity;
mod consent;
mod device;
mod health;
mod insight;
mod settings;
mod suggestion;

pub use activity::{Activity, ActivityKind, ActivityPatch, NewActivity};
pub use consent::{ConsentCategory, PrivacyConsent, CONSENT_VERSION};
pub use device::{ActiveSession, DeviceInfo};
pub use health::{HealthReading, SystemHealth, SystemHealthPatch};
pub use insight::InsightRecord;
pub use settings::{PrivacyLevel, Settings, SettingsPatch, Theme};
pub use suggestion::{FeedbackEntry, FeedbackRating, NewSuggestion, Suggestion, SuggestionStatus};
