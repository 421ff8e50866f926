//! Fixed key layout for the store's namespace.
//!
//! Every entity is serialized independently under its own key; all keys share
//! the `worktrace_` prefix so storage accounting and resets can scan the
//! namespace without touching anything else in the same medium.

pub const PREFIX: &str = "worktrace_";

pub const VERSION: &str = "worktrace_version";
pub const USER_ID: &str = "worktrace_user_id";
pub const DEVICE_ID: &str = "worktrace_device_id";
pub const SESSION_ID: &str = "worktrace_session_id";
pub const ACTIVITIES: &str = "worktrace_activities";
pub const SUGGESTIONS: &str = "worktrace_suggestions";
pub const FEEDBACK: &str = "worktrace_feedback";
pub const SETTINGS: &str = "worktrace_settings";
pub const SYSTEM_HEALTH: &str = "worktrace_system_health";
pub const INSIGHTS: &str = "worktrace_insights";
pub const THEME: &str = "worktrace_theme";
pub const PRIVACY_CONSENT: &str = "worktrace_privacy_consent";
