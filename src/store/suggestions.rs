use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use log::error;

use super::{evict_oldest, read_or_default, Store};
use crate::ids;
use crate::keys;
use crate::models::{FeedbackEntry, FeedbackRating, NewSuggestion, Suggestion};
use crate::storage::Kv;

/// Retention cap; the oldest entries by timestamp are evicted beyond it.
const MAX_SUGGESTIONS: usize = 100;

impl Store {
    /// Record a generated suggestion. Suggestions are system output rather
    /// than raw tracking data, so no consent gate applies.
    pub fn add_suggestion(&self, suggestion: NewSuggestion) -> Option<String> {
        match self.try_add_suggestion(suggestion) {
            Ok(id) => Some(id),
            Err(err) => {
                error!("failed to add suggestion: {err:#}");
                None
            }
        }
    }

    fn try_add_suggestion(&self, draft: NewSuggestion) -> Result<String> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open suggestion transaction")?;
        let assigned_id = {
            let kv = Kv::new(&tx);

            let record = Suggestion {
                id: draft
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| ids::generate("suggestion")),
                text: draft.text,
                category: draft.category,
                source: draft.source,
                confidence: draft.confidence,
                timestamp: draft.timestamp.unwrap_or_else(Utc::now),
                status: draft.status,
                feedback: draft.feedback,
            };

            let id = record.id.clone();
            let mut suggestions: Vec<Suggestion> = read_or_default(&kv, keys::SUGGESTIONS)?;
            suggestions.push(record);
            evict_oldest(&mut suggestions, MAX_SUGGESTIONS, |s: &Suggestion| s.timestamp);
            kv.put_json(keys::SUGGESTIONS, &suggestions)?;
            id
        };
        tx.commit().context("failed to commit suggestion")?;
        Ok(assigned_id)
    }

    /// Record a feedback vote for a suggestion. The feedback map entry and the
    /// suggestion's own `feedback` field are written together in one
    /// transaction; callers cannot perform half of the pair.
    pub fn update_suggestion_feedback(&self, suggestion_id: &str, rating: FeedbackRating) -> bool {
        match self.try_update_suggestion_feedback(suggestion_id, rating) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to record feedback for {suggestion_id}: {err:#}");
                false
            }
        }
    }

    fn try_update_suggestion_feedback(
        &self,
        suggestion_id: &str,
        rating: FeedbackRating,
    ) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .context("failed to open feedback transaction")?;
        {
            let kv = Kv::new(&tx);

            let mut feedback: HashMap<String, FeedbackEntry> =
                read_or_default(&kv, keys::FEEDBACK)?;
            feedback.insert(
                suggestion_id.to_string(),
                FeedbackEntry {
                    rating,
                    timestamp: Utc::now(),
                },
            );
            kv.put_json(keys::FEEDBACK, &feedback)?;

            // The suggestion may already be evicted; the map entry stands on
            // its own in that case.
            let mut suggestions: Vec<Suggestion> = read_or_default(&kv, keys::SUGGESTIONS)?;
            if let Some(record) = suggestions.iter_mut().find(|s| s.id == suggestion_id) {
                record.feedback = Some(rating);
                kv.put_json(keys::SUGGESTIONS, &suggestions)?;
            }
        }
        tx.commit().context("failed to commit feedback")?;
        Ok(())
    }

    pub fn suggestion_feedback(&self, suggestion_id: &str) -> Option<FeedbackEntry> {
        let mut feedback = self.all_feedback();
        feedback.remove(suggestion_id)
    }

    pub fn all_feedback(&self) -> HashMap<String, FeedbackEntry> {
        let conn = self.lock();
        match read_or_default(&Kv::new(&conn), keys::FEEDBACK) {
            Ok(feedback) => feedback,
            Err(err) => {
                error!("failed to read feedback: {err:#}");
                HashMap::new()
            }
        }
    }

    /// All suggestions, newest first. Missing or corrupt data reads as empty.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        let mut suggestions = self.all_suggestions();
        suggestions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        suggestions
    }

    pub fn recent_suggestions(&self, limit: usize) -> Vec<Suggestion> {
        let mut suggestions = self.suggestions();
        suggestions.truncate(limit);
        suggestions
    }

    /// Stored-order read, for export.
    pub fn all_suggestions(&self) -> Vec<Suggestion> {
        let conn = self.lock();
        match read_or_default(&Kv::new(&conn), keys::SUGGESTIONS) {
            Ok(suggestions) => suggestions,
            Err(err) => {
                error!("failed to read suggestions: {err:#}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn suggestion_at(text: &str, timestamp: DateTime<Utc>) -> NewSuggestion {
        let mut suggestion = NewSuggestion::new(text, "productivity", "activity_pattern");
        suggestion.timestamp = Some(timestamp);
        suggestion.confidence = 0.8;
        suggestion
    }

    #[test]
    fn suggestions_need_no_consent() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .add_suggestion(NewSuggestion::new("take a break", "wellbeing", "work_hours"))
            .unwrap();
        assert!(id.starts_with("suggestion_"));
        assert_eq!(store.suggestions().len(), 1);
    }

    #[test]
    fn cap_keeps_the_most_recent_hundred() {
        let store = Store::open_in_memory().unwrap();
        let base = Utc::now() - Duration::hours(12);

        for i in 0..103u32 {
            let mut suggestion =
                suggestion_at("text", base + Duration::minutes(i64::from(i)));
            suggestion.id = Some(format!("suggestion_{i:03}"));
            store.add_suggestion(suggestion);
        }

        let stored = store.all_suggestions();
        assert_eq!(stored.len(), 100);
        for i in 0..3u32 {
            let id = format!("suggestion_{i:03}");
            assert!(!stored.iter().any(|s| s.id == id), "{id} should be evicted");
        }
    }

    #[test]
    fn feedback_updates_map_and_suggestion_together() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .add_suggestion(suggestion_at("use shortcuts", Utc::now()))
            .unwrap();

        assert!(store.update_suggestion_feedback(&id, FeedbackRating::Helpful));

        let entry = store.suggestion_feedback(&id).unwrap();
        assert_eq!(entry.rating, FeedbackRating::Helpful);
        assert!(Utc::now() - entry.timestamp < Duration::seconds(5));

        let stored = store.suggestions().into_iter().find(|s| s.id == id).unwrap();
        assert_eq!(stored.feedback, Some(FeedbackRating::Helpful));
    }

    #[test]
    fn feedback_overwrites_an_earlier_vote() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .add_suggestion(suggestion_at("close tabs", Utc::now()))
            .unwrap();

        store.update_suggestion_feedback(&id, FeedbackRating::Helpful);
        store.update_suggestion_feedback(&id, FeedbackRating::NotHelpful);

        let entry = store.suggestion_feedback(&id).unwrap();
        assert_eq!(entry.rating, FeedbackRating::NotHelpful);
        let stored = store.suggestions().into_iter().find(|s| s.id == id).unwrap();
        assert_eq!(stored.feedback, Some(FeedbackRating::NotHelpful));
    }

    #[test]
    fn feedback_for_an_evicted_suggestion_still_records() {
        let store = Store::open_in_memory().unwrap();

        assert!(store.update_suggestion_feedback("suggestion_gone", FeedbackRating::SomewhatHelpful));
        let entry = store.suggestion_feedback("suggestion_gone").unwrap();
        assert_eq!(entry.rating, FeedbackRating::SomewhatHelpful);
        assert_eq!(store.all_feedback().len(), 1);
    }

    #[test]
    fn recent_suggestions_sort_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        store.add_suggestion(suggestion_at("old", now - Duration::hours(2)));
        store.add_suggestion(suggestion_at("new", now));
        store.add_suggestion(suggestion_at("mid", now - Duration::hours(1)));

        let recent = store.recent_suggestions(2);
        let texts: Vec<String> = recent.into_iter().map(|s| s.text).collect();
        assert_eq!(texts, ["new", "mid"]);
    }
}
