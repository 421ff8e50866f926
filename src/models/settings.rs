use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_name(name: &str) -> Option<Theme> {
        match name {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    Strict,
    #[default]
    Standard,
    Relaxed,
}

/// Flat user configuration. Missing fields deserialize to their defaults so
/// a partially written record still reads as a full settings object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub track_applications: bool,
    pub track_files: bool,
    pub track_browsing: bool,
    pub track_idle_time: bool,
    pub track_keyboard: bool,
    pub track_mouse: bool,
    pub learning_enabled: bool,
    pub privacy_level: PrivacyLevel,
    pub work_hours_start: String,
    pub work_hours_end: String,
    pub work_days: Vec<u8>,
    pub excluded_apps: Vec<String>,
    pub excluded_websites: Vec<String>,
    pub excluded_directories: Vec<String>,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track_applications: true,
            track_files: true,
            track_browsing: true,
            track_idle_time: true,
            track_keyboard: false,
            track_mouse: false,
            learning_enabled: true,
            privacy_level: PrivacyLevel::Standard,
            work_hours_start: "09:00".into(),
            work_hours_end: "17:00".into(),
            // Monday to Friday
            work_days: vec![0, 1, 2, 3, 4],
            excluded_apps: Vec::new(),
            excluded_websites: Vec::new(),
            excluded_directories: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl Settings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(track_applications) = patch.track_applications {
            self.track_applications = track_applications;
        }
        if let Some(track_files) = patch.track_files {
            self.track_files = track_files;
        }
        if let Some(track_browsing) = patch.track_browsing {
            self.track_browsing = track_browsing;
        }
        if let Some(track_idle_time) = patch.track_idle_time {
            self.track_idle_time = track_idle_time;
        }
        if let Some(track_keyboard) = patch.track_keyboard {
            self.track_keyboard = track_keyboard;
        }
        if let Some(track_mouse) = patch.track_mouse {
            self.track_mouse = track_mouse;
        }
        if let Some(learning_enabled) = patch.learning_enabled {
            self.learning_enabled = learning_enabled;
        }
        if let Some(privacy_level) = patch.privacy_level {
            self.privacy_level = privacy_level;
        }
        if let Some(work_hours_start) = patch.work_hours_start {
            self.work_hours_start = work_hours_start;
        }
        if let Some(work_hours_end) = patch.work_hours_end {
            self.work_hours_end = work_hours_end;
        }
        if let Some(work_days) = patch.work_days {
            self.work_days = work_days;
        }
        if let Some(excluded_apps) = patch.excluded_apps {
            self.excluded_apps = excluded_apps;
        }
        if let Some(excluded_websites) = patch.excluded_websites {
            self.excluded_websites = excluded_websites;
        }
        if let Some(excluded_directories) = patch.excluded_directories {
            self.excluded_directories = excluded_directories;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}

/// Shallow-merge patch for `Store::update_settings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub track_applications: Option<bool>,
    pub track_files: Option<bool>,
    pub track_browsing: Option<bool>,
    pub track_idle_time: Option<bool>,
    pub track_keyboard: Option<bool>,
    pub track_mouse: Option<bool>,
    pub learning_enabled: Option<bool>,
    pub privacy_level: Option<PrivacyLevel>,
    pub work_hours_start: Option<String>,
    pub work_hours_end: Option<String>,
    pub work_days: Option<Vec<u8>>,
    pub excluded_apps: Option<Vec<String>>,
    pub excluded_websites: Option<Vec<String>>,
    pub excluded_directories: Option<Vec<String>>,
    pub theme: Option<Theme>,
}
