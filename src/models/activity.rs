use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of tracked activity. Application usage is the only kind gated by the
/// `applications` consent category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AppUsage,
    FileAccess,
    Browsing,
    Idle,
    System,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::AppUsage => "app_usage",
            ActivityKind::FileAccess => "file_access",
            ActivityKind::Browsing => "browsing",
            ActivityKind::Idle => "idle",
            ActivityKind::System => "system",
        }
    }
}

/// A single tracked activity record. Once stored, `id` is non-empty and
/// unique and `timestamp` is always valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub application_name: String,
    pub window_title: Option<String>,
    pub duration_secs: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub productivity_score: Option<f64>,
    pub session_id: Option<String>,
}

impl Activity {
    pub fn apply(&mut self, patch: ActivityPatch) {
        if let Some(application_name) = patch.application_name {
            self.application_name = application_name;
        }
        if let Some(window_title) = patch.window_title {
            self.window_title = Some(window_title);
        }
        if let Some(duration_secs) = patch.duration_secs {
            self.duration_secs = duration_secs;
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(productivity_score) = patch.productivity_score {
            self.productivity_score = Some(productivity_score);
        }
        if let Some(session_id) = patch.session_id {
            self.session_id = Some(session_id);
        }
    }
}

/// Input record for `Store::add_activity`. Id and timestamp are assigned by
/// the store when absent.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub id: Option<String>,
    pub application_name: String,
    pub window_title: Option<String>,
    pub duration_secs: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: ActivityKind,
    pub productivity_score: Option<f64>,
    pub session_id: Option<String>,
}

impl NewActivity {
    pub fn new(application_name: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            id: None,
            application_name: application_name.into(),
            window_title: None,
            duration_secs: 0,
            timestamp: None,
            kind,
            productivity_score: None,
            session_id: None,
        }
    }
}

/// Shallow-merge patch for `Store::update_activity`. Fields left as `None`
/// keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ActivityPatch {
    pub application_name: Option<String>,
    pub window_title: Option<String>,
    pub duration_secs: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: Option<ActivityKind>,
    pub productivity_score: Option<f64>,
    pub session_id: Option<String>,
}
