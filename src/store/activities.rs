use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, warn};
use serde::Serialize;

use super::{consent_allows, evict_oldest, load_consent, read_or_default, Store};
use crate::ids;
use crate::keys;
use crate::models::{Activity, ActivityKind, ActivityPatch, ConsentCategory, NewActivity};
use crate::storage::Kv;

/// Retention cap; the oldest entries by timestamp are evicted beyond it.
const MAX_ACTIVITIES: usize = 1000;

/// Stored in place of a window title recorded without `window_titles`
/// consent.
pub const REDACTED_WINDOW_TITLE: &str = "[window title hidden by privacy settings]";

/// Per-application usage aggregate, ordered by count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUsage {
    pub app: String,
    pub count: u64,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityStatistics {
    pub activities: usize,
    pub productive_time_secs: u64,
    pub avg_score: f64,
    pub sessions: usize,
}

impl Store {
    /// Record an activity. App-usage activities are rejected without
    /// `applications` consent; a window title without `window_titles` consent
    /// is stored redacted, with duration and metadata intact. Returns the
    /// stored id, or `None` when the write was rejected or failed.
    pub fn add_activity(&self, activity: NewActivity) -> Option<String> {
        match self.try_add_activity(activity) {
            Ok(id) => id,
            Err(err) => {
                error!("failed to add activity: {err:#}");
                None
            }
        }
    }

    fn try_add_activity(&self, draft: NewActivity) -> Result<Option<String>> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open activity transaction")?;
        let assigned_id = {
            let kv = Kv::new(&tx);
            let consent = load_consent(&kv)?;

            if draft.kind == ActivityKind::AppUsage
                && !consent_allows(&consent, ConsentCategory::Applications)
            {
                warn!("application usage tracking rejected without consent");
                return Ok(None);
            }

            let mut record = Activity {
                id: draft
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| ids::generate("activity")),
                application_name: draft.application_name,
                window_title: draft.window_title,
                duration_secs: draft.duration_secs,
                timestamp: draft.timestamp.unwrap_or_else(Utc::now),
                kind: draft.kind,
                productivity_score: draft.productivity_score,
                session_id: draft.session_id,
            };

            if record.window_title.is_some()
                && !consent_allows(&consent, ConsentCategory::WindowTitles)
            {
                record.window_title = Some(REDACTED_WINDOW_TITLE.into());
            }

            let id = record.id.clone();
            let mut activities: Vec<Activity> = read_or_default(&kv, keys::ACTIVITIES)?;
            activities.push(record);
            evict_oldest(&mut activities, MAX_ACTIVITIES, |a: &Activity| a.timestamp);
            kv.put_json(keys::ACTIVITIES, &activities)?;
            id
        };
        tx.commit().context("failed to commit activity")?;
        Ok(Some(assigned_id))
    }

    /// Shallow-merge a patch into the matching record; `false` when the id is
    /// unknown.
    pub fn update_activity(&self, activity_id: &str, patch: ActivityPatch) -> bool {
        match self.try_update_activity(activity_id, patch) {
            Ok(updated) => updated,
            Err(err) => {
                error!("failed to update activity {activity_id}: {err:#}");
                false
            }
        }
    }

    fn try_update_activity(&self, activity_id: &str, patch: ActivityPatch) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open activity transaction")?;
        let updated = {
            let kv = Kv::new(&tx);
            let mut activities: Vec<Activity> = read_or_default(&kv, keys::ACTIVITIES)?;
            match activities.iter_mut().find(|a| a.id == activity_id) {
                Some(record) => {
                    record.apply(patch);
                    kv.put_json(keys::ACTIVITIES, &activities)?;
                    true
                }
                None => false,
            }
        };
        tx.commit().context("failed to commit activity update")?;
        Ok(updated)
    }

    /// Remove exactly one matching record; `false` when nothing was removed.
    pub fn delete_activity(&self, activity_id: &str) -> bool {
        match self.try_delete_activity(activity_id) {
            Ok(removed) => removed,
            Err(err) => {
                error!("failed to delete activity {activity_id}: {err:#}");
                false
            }
        }
    }

    fn try_delete_activity(&self, activity_id: &str) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open activity transaction")?;
        let removed = {
            let kv = Kv::new(&tx);
            let mut activities: Vec<Activity> = read_or_default(&kv, keys::ACTIVITIES)?;
            let before = activities.len();
            if let Some(index) = activities.iter().position(|a| a.id == activity_id) {
                activities.remove(index);
            }
            if activities.len() != before {
                kv.put_json(keys::ACTIVITIES, &activities)?;
                true
            } else {
                false
            }
        };
        tx.commit().context("failed to commit activity delete")?;
        Ok(removed)
    }

    /// All activities, newest first. Missing or corrupt data reads as empty.
    pub fn activities(&self) -> Vec<Activity> {
        let mut activities = self.all_activities();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities
    }

    pub fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        let mut activities = self.activities();
        activities.truncate(limit);
        activities
    }

    /// Stored-order read, for export.
    pub fn all_activities(&self) -> Vec<Activity> {
        let conn = self.lock();
        match read_or_default(&Kv::new(&conn), keys::ACTIVITIES) {
            Ok(activities) => activities,
            Err(err) => {
                error!("failed to read activities: {err:#}");
                Vec::new()
            }
        }
    }

    /// Top applications by activity count, ties kept in first-encountered
    /// order.
    pub fn app_usage_stats(&self, limit: usize) -> Vec<AppUsage> {
        let activities = self.all_activities();

        let mut order: Vec<String> = Vec::new();
        let mut by_app: HashMap<String, AppUsage> = HashMap::new();
        for activity in &activities {
            if activity.application_name.is_empty() {
                continue;
            }
            let entry = by_app
                .entry(activity.application_name.clone())
                .or_insert_with(|| {
                    order.push(activity.application_name.clone());
                    AppUsage {
                        app: activity.application_name.clone(),
                        count: 0,
                        duration_secs: 0,
                    }
                });
            entry.count += 1;
            entry.duration_secs += activity.duration_secs;
        }

        let mut stats: Vec<AppUsage> = order
            .into_iter()
            .filter_map(|app| by_app.remove(&app))
            .collect();
        // Stable sort keeps first-encountered order across equal counts.
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats.truncate(limit);
        stats
    }

    /// Aggregate statistics over the stored activities.
    pub fn statistics(&self) -> ActivityStatistics {
        let activities = self.all_activities();

        let mut productive_time_secs = 0u64;
        let mut total_score = 0.0f64;
        let mut scored = 0usize;
        let mut sessions: HashSet<&str> = HashSet::new();

        for activity in &activities {
            if let Some(score) = activity.productivity_score {
                if score > 0.5 {
                    productive_time_secs += activity.duration_secs;
                }
                total_score += score;
                scored += 1;
            }
            if let Some(session_id) = activity.session_id.as_deref() {
                sessions.insert(session_id);
            }
        }

        ActivityStatistics {
            activities: activities.len(),
            productive_time_secs,
            avg_score: if scored > 0 {
                total_score / scored as f64
            } else {
                0.5
            },
            sessions: sessions.len().max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrivacyConsent;
    use chrono::{DateTime, Duration, Utc};

    fn consented_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent::grant_all());
        store
    }

    fn activity_at(app: &str, timestamp: DateTime<Utc>, duration_secs: u64) -> NewActivity {
        let mut activity = NewActivity::new(app, ActivityKind::AppUsage);
        activity.timestamp = Some(timestamp);
        activity.duration_secs = duration_secs;
        activity
    }

    #[test]
    fn app_usage_is_rejected_without_consent() {
        let store = Store::open_in_memory().unwrap();

        let id = store.add_activity(NewActivity::new("VS Code", ActivityKind::AppUsage));
        assert_eq!(id, None);
        assert!(store.activities().is_empty());
    }

    #[test]
    fn non_app_usage_kinds_are_not_consent_gated() {
        let store = Store::open_in_memory().unwrap();

        let id = store.add_activity(NewActivity::new("nautilus", ActivityKind::FileAccess));
        assert!(id.is_some());
        assert_eq!(store.activities().len(), 1);
    }

    #[test]
    fn window_title_is_redacted_without_title_consent() {
        let store = Store::open_in_memory().unwrap();
        store.set_privacy_consent(PrivacyConsent {
            window_titles: false,
            ..PrivacyConsent::grant_all()
        });

        let mut activity = NewActivity::new("Chrome", ActivityKind::AppUsage);
        activity.window_title = Some("GitHub - Pull Requests".into());
        activity.duration_secs = 120;
        let id = store.add_activity(activity).unwrap();

        let stored = store
            .activities()
            .into_iter()
            .find(|a| a.id == id)
            .unwrap();
        assert_eq!(stored.window_title.as_deref(), Some(REDACTED_WINDOW_TITLE));
        assert_eq!(stored.duration_secs, 120);
    }

    #[test]
    fn missing_id_and_timestamp_are_assigned() {
        let store = consented_store();

        let id = store
            .add_activity(NewActivity::new("Terminal", ActivityKind::AppUsage))
            .unwrap();
        assert!(id.starts_with("activity_"));

        let stored = store.activities();
        assert_eq!(stored[0].id, id);
        assert!(Utc::now() - stored[0].timestamp < Duration::seconds(5));
    }

    #[test]
    fn cap_keeps_the_most_recent_thousand() {
        let store = consented_store();
        let base = Utc::now() - Duration::days(1);

        for i in 0..1005u32 {
            let mut activity =
                activity_at("App", base + Duration::seconds(i64::from(i)), 1);
            activity.id = Some(format!("activity_{i:04}"));
            assert!(store.add_activity(activity).is_some());
        }

        let stored = store.all_activities();
        assert_eq!(stored.len(), 1000);
        // The five oldest entries are the evicted ones.
        for i in 0..5u32 {
            let id = format!("activity_{i:04}");
            assert!(!stored.iter().any(|a| a.id == id), "{id} should be evicted");
        }
        assert!(stored.iter().any(|a| a.id == "activity_1004"));
    }

    #[test]
    fn update_merges_and_reports_missing_ids() {
        let store = consented_store();
        let id = store
            .add_activity(activity_at("Slack", Utc::now(), 30))
            .unwrap();

        let patch = ActivityPatch {
            duration_secs: Some(90),
            productivity_score: Some(0.4),
            ..ActivityPatch::default()
        };
        assert!(store.update_activity(&id, patch));

        let stored = store.activities().into_iter().find(|a| a.id == id).unwrap();
        assert_eq!(stored.duration_secs, 90);
        assert_eq!(stored.productivity_score, Some(0.4));
        assert_eq!(stored.application_name, "Slack");

        assert!(!store.update_activity("activity_missing", ActivityPatch::default()));
    }

    #[test]
    fn delete_removes_exactly_one_record() {
        let store = consented_store();
        let keep = store
            .add_activity(activity_at("Zoom", Utc::now(), 10))
            .unwrap();
        let gone = store
            .add_activity(activity_at("Zoom", Utc::now(), 20))
            .unwrap();

        assert!(store.delete_activity(&gone));
        assert!(!store.delete_activity(&gone));

        let remaining = store.activities();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[test]
    fn reads_are_sorted_newest_first() {
        let store = consented_store();
        let now = Utc::now();
        store.add_activity(activity_at("Old", now - Duration::hours(2), 1));
        store.add_activity(activity_at("New", now, 1));
        store.add_activity(activity_at("Mid", now - Duration::hours(1), 1));

        let names: Vec<String> = store
            .activities()
            .into_iter()
            .map(|a| a.application_name)
            .collect();
        assert_eq!(names, ["New", "Mid", "Old"]);

        let recent = store.recent_activities(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].application_name, "New");
    }

    #[test]
    fn corrupt_collection_reads_as_empty_and_recovers() {
        let store = consented_store();
        {
            let conn = store.lock();
            Kv::new(&conn).put(keys::ACTIVITIES, "{ not json").unwrap();
        }

        assert!(store.activities().is_empty());

        // The next write starts from an empty collection.
        assert!(store
            .add_activity(activity_at("Firefox", Utc::now(), 5))
            .is_some());
        assert_eq!(store.activities().len(), 1);
    }

    #[test]
    fn usage_stats_group_and_rank_by_count() {
        let store = consented_store();
        let now = Utc::now();
        store.add_activity(activity_at("A", now - Duration::minutes(3), 10));
        store.add_activity(activity_at("B", now - Duration::minutes(2), 5));
        store.add_activity(activity_at("A", now - Duration::minutes(1), 3));

        let stats = store.app_usage_stats(2);
        assert_eq!(
            stats,
            [
                AppUsage {
                    app: "A".into(),
                    count: 2,
                    duration_secs: 13
                },
                AppUsage {
                    app: "B".into(),
                    count: 1,
                    duration_secs: 5
                },
            ]
        );
    }

    #[test]
    fn statistics_cover_productive_time_scores_and_sessions() {
        let store = consented_store();
        let now = Utc::now();

        let mut first = activity_at("A", now, 100);
        first.productivity_score = Some(0.8);
        first.session_id = Some("session_1".into());
        store.add_activity(first);

        let mut second = activity_at("B", now, 50);
        second.productivity_score = Some(0.3);
        second.session_id = Some("session_2".into());
        store.add_activity(second);

        // Unscored activity: excluded from the mean, counts toward the total.
        store.add_activity(activity_at("C", now, 10));

        let stats = store.statistics();
        assert_eq!(stats.activities, 3);
        assert_eq!(stats.productive_time_secs, 100);
        assert!((stats.avg_score - 0.55).abs() < 1e-9);
        assert_eq!(stats.sessions, 2);
    }

    #[test]
    fn statistics_defaults_for_an_empty_store() {
        let store = Store::open_in_memory().unwrap();
        let stats = store.statistics();
        assert_eq!(stats.activities, 0);
        assert_eq!(stats.productive_time_secs, 0);
        assert!((stats.avg_score - 0.5).abs() < 1e-9);
        assert_eq!(stats.sessions, 1);
    }
}
