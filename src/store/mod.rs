//! The storage/consent engine.
//!
//! A [`Store`] is an explicit handle constructed once per process and passed
//! to consumers; it owns the persistence medium and every read or write goes
//! through it. Public operations never panic and never return errors: failures
//! are logged and collapse to sentinel values (`None`, `false`, empty
//! collections) so a broken medium can degrade the UI but not crash it.

mod activities;
mod config;
mod consent;
mod health;
mod suggestions;

pub use activities::{ActivityStatistics, AppUsage, REDACTED_WINDOW_TITLE};
pub use health::HealthExportRow;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sysinfo::System;

use crate::ids;
use crate::keys;
use crate::models::{
    Activity, ActiveSession, ConsentCategory, DeviceInfo, FeedbackEntry, InsightRecord,
    PrivacyConsent, Settings, Suggestion, SystemHealth, Theme,
};
use crate::storage::{self, Kv};

/// Version marker written under the namespace; a mismatch triggers an
/// identity-preserving reset.
pub const STORE_VERSION: &str = "1.0.0";

/// Fixed budget the usage percentage is reported against.
pub const STORAGE_BUDGET_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Grant every consent category during first-run population. Off by
    /// default: consent is explicit, and neither error-path resets nor
    /// `clear_all_data` ever grant it.
    pub seed_full_consent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub used_kb: f64,
    pub percent_used: f64,
    pub budget_bytes: u64,
}

pub struct Store {
    conn: Mutex<Connection>,
    options: StoreOptions,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let conn = storage::open_connection(path.as_ref())?;
        Ok(Self::start(conn, options))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::start(storage::open_in_memory()?, StoreOptions::default()))
    }

    pub fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
        Ok(Self::start(storage::open_in_memory()?, options))
    }

    /// Opening a store starts a session: initialization runs first, then the
    /// session id is regenerated.
    fn start(conn: Connection, options: StoreOptions) -> Self {
        let store = Self {
            conn: Mutex::new(conn),
            options,
        };
        store.initialize();
        store.reset_session();
        store
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Idempotent initialization. Detects a missing version marker and
    /// performs first-run population; a version mismatch or any internal
    /// failure resets to a minimal baseline that keeps the user and device
    /// ids and grants no consent.
    pub fn initialize(&self) -> bool {
        match self.try_initialize() {
            Ok(()) => true,
            Err(err) => {
                error!("store initialization failed, resetting to baseline: {err:#}");
                match self.try_reset_to_baseline() {
                    Ok(()) => true,
                    Err(reset_err) => {
                        error!("baseline reset failed: {reset_err:#}");
                        false
                    }
                }
            }
        }
    }

    fn try_initialize(&self) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().context("failed to open init transaction")?;
        {
            let kv = Kv::new(&tx);
            match kv.get(keys::VERSION)? {
                None => {
                    kv.put(keys::VERSION, STORE_VERSION)?;
                    populate_defaults(&kv)?;
                    if self.options.seed_full_consent {
                        kv.put_json(keys::PRIVACY_CONSENT, &PrivacyConsent::grant_all())?;
                    }
                    info!("store initialized with empty collections");
                }
                Some(version) if version != STORE_VERSION => {
                    warn!("stored version {version} does not match {STORE_VERSION}, resetting");
                    reset_keeping_identity(&kv)?;
                }
                Some(_) => {
                    // Repair anything a partial write may have left missing.
                    populate_defaults(&kv)?;
                }
            }
        }
        tx.commit().context("failed to commit initialization")?;
        Ok(())
    }

    fn try_reset_to_baseline(&self) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open reset transaction")?;
        {
            let kv = Kv::new(&tx);
            reset_keeping_identity(&kv)?;
        }
        tx.commit().context("failed to commit baseline reset")?;
        Ok(())
    }

    /// Issue a fresh session id; user and device ids are untouched.
    pub fn reset_session(&self) -> Option<String> {
        let session_id = ids::generate("session");
        let conn = self.lock();
        match Kv::new(&conn).put(keys::SESSION_ID, &session_id) {
            Ok(()) => Some(session_id),
            Err(err) => {
                error!("failed to reset session: {err:#}");
                None
            }
        }
    }

    /// Start a new session under a context label ("work", "personal", ...).
    pub fn start_session(&self, context: &str) -> Option<String> {
        let session_id = self.reset_session()?;
        info!("started session {session_id} with context {context}");
        Some(session_id)
    }

    /// Session teardown hook. The session record itself lives with the
    /// activities that reference it, so there is nothing to persist here.
    pub fn end_session(&self, productivity_score: Option<f64>) -> bool {
        match productivity_score {
            Some(score) => info!("ended session with productivity score {score:.2}"),
            None => info!("ended session"),
        }
        true
    }

    pub fn user_id(&self) -> Option<String> {
        self.read_raw(keys::USER_ID)
    }

    pub fn device_id(&self) -> Option<String> {
        self.read_raw(keys::DEVICE_ID)
    }

    pub fn session_id(&self) -> Option<String> {
        self.read_raw(keys::SESSION_ID)
    }

    /// Descriptor of the current session. Without `applications` consent the
    /// session is reported inactive and awaiting consent.
    pub fn active_session(&self) -> Option<ActiveSession> {
        let session_id = self.session_id()?;
        if !self.has_consent(ConsentCategory::Applications) {
            return Some(ActiveSession {
                id: session_id,
                user_id: None,
                device_id: None,
                started_at: None,
                is_active: false,
                requires_consent: true,
                productivity_score: None,
            });
        }
        Some(ActiveSession {
            id: session_id,
            user_id: self.user_id(),
            device_id: self.device_id(),
            started_at: Some(Utc::now()),
            is_active: true,
            requires_consent: false,
            productivity_score: None,
        })
    }

    /// Descriptor of this device. Host details are only queried with
    /// `device_info` consent; otherwise generic values are reported.
    pub fn current_device(&self) -> Option<DeviceInfo> {
        let device_id = self.device_id()?;
        let now = Utc::now();

        if !self.has_consent(ConsentCategory::DeviceInfo) {
            return Some(DeviceInfo {
                id: device_id,
                name: "this device".into(),
                device_type: device_type().into(),
                os: std::env::consts::OS.into(),
                os_version: None,
                requires_consent: true,
                tracking_enabled: false,
                last_active: now,
            });
        }

        Some(DeviceInfo {
            id: device_id,
            name: System::host_name().unwrap_or_else(|| "this device".into()),
            device_type: device_type().into(),
            os: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
            os_version: System::os_version(),
            requires_consent: false,
            tracking_enabled: self.has_consent(ConsentCategory::Applications),
            last_active: now,
        })
    }

    /// Hard reset that keeps identity and theme: everything else is
    /// destroyed, collections are recreated empty and settings return to
    /// their defaults with the preserved theme reinjected.
    pub fn clear_all_data(&self) -> bool {
        match self.try_clear_all_data() {
            Ok(()) => true,
            Err(err) => {
                error!("failed to clear store: {err:#}");
                false
            }
        }
    }

    fn try_clear_all_data(&self) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open clear transaction")?;
        {
            let kv = Kv::new(&tx);
            let user_id = kv.get(keys::USER_ID)?;
            let device_id = kv.get(keys::DEVICE_ID)?;
            let session_id = kv.get(keys::SESSION_ID)?;
            let theme = kv
                .get(keys::THEME)?
                .and_then(|raw| Theme::from_name(&raw))
                .unwrap_or_default();

            kv.remove_prefix(keys::PREFIX)?;

            kv.put(keys::VERSION, STORE_VERSION)?;
            kv.put(
                keys::USER_ID,
                &user_id.unwrap_or_else(|| ids::generate("user")),
            )?;
            kv.put(
                keys::DEVICE_ID,
                &device_id.unwrap_or_else(|| ids::generate("device")),
            )?;
            kv.put(
                keys::SESSION_ID,
                &session_id.unwrap_or_else(|| ids::generate("session")),
            )?;
            kv.put(keys::THEME, theme.as_str())?;

            write_empty_collections(&kv)?;

            let settings = Settings {
                theme,
                ..Settings::default()
            };
            kv.put_json(keys::SETTINGS, &settings)?;
            kv.put_json(keys::SYSTEM_HEALTH, &SystemHealth::zeroed(Utc::now()))?;
        }
        tx.commit().context("failed to commit clear")?;
        info!("store cleared, identity and theme preserved");
        Ok(())
    }

    /// Bytes consumed by this store's namespace, against the fixed budget.
    pub fn storage_usage(&self) -> StorageUsage {
        let used_bytes = {
            let conn = self.lock();
            match Kv::new(&conn).usage_bytes(keys::PREFIX) {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!("failed to compute storage usage: {err:#}");
                    0
                }
            }
        };
        StorageUsage {
            used_bytes,
            used_kb: used_bytes as f64 / 1024.0,
            percent_used: used_bytes as f64 / STORAGE_BUDGET_BYTES as f64 * 100.0,
            budget_bytes: STORAGE_BUDGET_BYTES,
        }
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        let conn = self.lock();
        match Kv::new(&conn).get(key) {
            Ok(value) => value,
            Err(err) => {
                error!("failed to read {key}: {err:#}");
                None
            }
        }
    }
}

fn device_type() -> &'static str {
    if cfg!(any(target_os = "android", target_os = "ios")) {
        "mobile"
    } else {
        "desktop"
    }
}

/// Create whatever baseline keys are missing; existing values, in particular
/// user and device ids, are never overwritten.
fn populate_defaults(kv: &Kv) -> Result<()> {
    if kv.get(keys::USER_ID)?.is_none() {
        kv.put(keys::USER_ID, &ids::generate("user"))?;
    }
    if kv.get(keys::DEVICE_ID)?.is_none() {
        kv.put(keys::DEVICE_ID, &ids::generate("device"))?;
    }
    if kv.get(keys::SESSION_ID)?.is_none() {
        kv.put(keys::SESSION_ID, &ids::generate("session"))?;
    }
    if kv.get(keys::ACTIVITIES)?.is_none() {
        kv.put_json(keys::ACTIVITIES, &Vec::<Activity>::new())?;
    }
    if kv.get(keys::SUGGESTIONS)?.is_none() {
        kv.put_json(keys::SUGGESTIONS, &Vec::<Suggestion>::new())?;
    }
    if kv.get(keys::FEEDBACK)?.is_none() {
        kv.put_json(keys::FEEDBACK, &HashMap::<String, FeedbackEntry>::new())?;
    }
    if kv.get(keys::INSIGHTS)?.is_none() {
        kv.put_json(keys::INSIGHTS, &HashMap::<String, InsightRecord>::new())?;
    }
    if kv.get(keys::SETTINGS)?.is_none() {
        kv.put_json(keys::SETTINGS, &Settings::default())?;
    }
    if kv.get(keys::SYSTEM_HEALTH)?.is_none() {
        kv.put_json(keys::SYSTEM_HEALTH, &SystemHealth::zeroed(Utc::now()))?;
    }
    if kv.get(keys::THEME)?.is_none() {
        kv.put(keys::THEME, Theme::default().as_str())?;
    }
    Ok(())
}

/// Minimal baseline: identity survives, a fresh session starts, collections
/// come back empty and no consent is granted.
fn reset_keeping_identity(kv: &Kv) -> Result<()> {
    let user_id = kv.get(keys::USER_ID)?.unwrap_or_else(|| ids::generate("user"));
    let device_id = kv
        .get(keys::DEVICE_ID)?
        .unwrap_or_else(|| ids::generate("device"));

    kv.remove_prefix(keys::PREFIX)?;

    kv.put(keys::VERSION, STORE_VERSION)?;
    kv.put(keys::USER_ID, &user_id)?;
    kv.put(keys::DEVICE_ID, &device_id)?;
    kv.put(keys::SESSION_ID, &ids::generate("session"))?;
    populate_defaults(kv)?;
    Ok(())
}

fn write_empty_collections(kv: &Kv) -> Result<()> {
    kv.put_json(keys::ACTIVITIES, &Vec::<Activity>::new())?;
    kv.put_json(keys::SUGGESTIONS, &Vec::<Suggestion>::new())?;
    kv.put_json(keys::FEEDBACK, &HashMap::<String, FeedbackEntry>::new())?;
    kv.put_json(keys::INSIGHTS, &HashMap::<String, InsightRecord>::new())?;
    Ok(())
}

/// Read a collection entity, treating a missing or corrupt value as empty.
fn read_or_default<T: DeserializeOwned + Default>(kv: &Kv, key: &str) -> Result<T> {
    Ok(kv.get_json_or_absent(key)?.unwrap_or_default())
}

/// Enforce a collection cap: sort newest-first by timestamp and truncate, so
/// eviction always removes strictly the oldest excess.
fn evict_oldest<T>(items: &mut Vec<T>, cap: usize, timestamp: fn(&T) -> DateTime<Utc>) {
    if items.len() > cap {
        items.sort_by(|a, b| timestamp(b).cmp(&timestamp(a)));
        items.truncate(cap);
    }
}

fn load_consent(kv: &Kv) -> Result<Option<PrivacyConsent>> {
    kv.get_json_or_absent(keys::PRIVACY_CONSENT)
}

fn consent_allows(consent: &Option<PrivacyConsent>, category: ConsentCategory) -> bool {
    consent
        .as_ref()
        .map(|record| record.granted(category))
        .unwrap_or(false)
}
