use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use log::error;
use serde_json::Value;

use super::{read_or_default, Store};
use crate::keys;
use crate::models::{InsightRecord, Settings, SettingsPatch, Theme};
use crate::storage::Kv;

impl Store {
    /// Shallow-merge a patch into the stored settings. A theme change also
    /// refreshes the denormalized theme key in the same transaction.
    pub fn update_settings(&self, patch: SettingsPatch) -> bool {
        match self.try_update_settings(patch) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to update settings: {err:#}");
                false
            }
        }
    }

    fn try_update_settings(&self, patch: SettingsPatch) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open settings transaction")?;
        {
            let kv = Kv::new(&tx);
            let mut settings: Settings = read_or_default(&kv, keys::SETTINGS)?;
            let theme_change = patch.theme;
            settings.apply(patch);
            kv.put_json(keys::SETTINGS, &settings)?;
            if let Some(theme) = theme_change {
                kv.put(keys::THEME, theme.as_str())?;
            }
        }
        tx.commit().context("failed to commit settings")?;
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        let conn = self.lock();
        match read_or_default(&Kv::new(&conn), keys::SETTINGS) {
            Ok(settings) => settings,
            Err(err) => {
                error!("failed to read settings: {err:#}");
                Settings::default()
            }
        }
    }

    /// Set the theme. The theme key and the `theme` field inside settings are
    /// written together; there is no path that changes only one side.
    pub fn update_theme(&self, theme: Theme) -> bool {
        match self.try_update_theme(theme) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to update theme: {err:#}");
                false
            }
        }
    }

    fn try_update_theme(&self, theme: Theme) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open theme transaction")?;
        {
            let kv = Kv::new(&tx);
            kv.put(keys::THEME, theme.as_str())?;
            let mut settings: Settings = read_or_default(&kv, keys::SETTINGS)?;
            settings.theme = theme;
            kv.put_json(keys::SETTINGS, &settings)?;
        }
        tx.commit().context("failed to commit theme")?;
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        let conn = self.lock();
        match Kv::new(&conn).get(keys::THEME) {
            Ok(raw) => raw
                .and_then(|name| Theme::from_name(&name))
                .unwrap_or_default(),
            Err(err) => {
                error!("failed to read theme: {err:#}");
                Theme::default()
            }
        }
    }

    /// Upsert an insight payload under its type, stamping `updated_at`.
    pub fn save_insight(&self, insight_type: &str, data: Value) -> bool {
        match self.try_save_insight(insight_type, data) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to save insight {insight_type}: {err:#}");
                false
            }
        }
    }

    fn try_save_insight(&self, insight_type: &str, data: Value) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open insight transaction")?;
        {
            let kv = Kv::new(&tx);
            let mut insights: HashMap<String, InsightRecord> =
                read_or_default(&kv, keys::INSIGHTS)?;
            insights.insert(
                insight_type.to_string(),
                InsightRecord {
                    data,
                    updated_at: Utc::now(),
                },
            );
            kv.put_json(keys::INSIGHTS, &insights)?;
        }
        tx.commit().context("failed to commit insight")?;
        Ok(())
    }

    pub fn insight(&self, insight_type: &str) -> Option<InsightRecord> {
        let mut insights = self.insights();
        insights.remove(insight_type)
    }

    pub fn insights(&self) -> HashMap<String, InsightRecord> {
        let conn = self.lock();
        match read_or_default(&Kv::new(&conn), keys::INSIGHTS) {
            Ok(insights) => insights,
            Err(err) => {
                error!("failed to read insights: {err:#}");
                HashMap::new()
            }
        }
    }
}
