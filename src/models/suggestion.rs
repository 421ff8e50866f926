use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Implemented,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Implemented => "implemented",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackRating {
    Helpful,
    SomewhatHelpful,
    NotHelpful,
}

impl FeedbackRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackRating::Helpful => "helpful",
            FeedbackRating::SomewhatHelpful => "somewhat_helpful",
            FeedbackRating::NotHelpful => "not_helpful",
        }
    }
}

/// A generated suggestion. Suggestions are system output, not raw tracking
/// data, so they are stored without a consent gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub text: String,
    pub category: String,
    pub source: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub status: SuggestionStatus,
    pub feedback: Option<FeedbackRating>,
}

/// Input record for `Store::add_suggestion`. Id and timestamp are assigned
/// by the store when absent.
#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub id: Option<String>,
    pub text: String,
    pub category: String,
    pub source: String,
    pub confidence: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: SuggestionStatus,
    pub feedback: Option<FeedbackRating>,
}

impl NewSuggestion {
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            text: text.into(),
            category: category.into(),
            source: source.into(),
            confidence: 0.0,
            timestamp: None,
            status: SuggestionStatus::Pending,
            feedback: None,
        }
    }
}

/// One feedback vote keyed by suggestion id. Mirrors the `feedback` field on
/// the suggestion itself for as long as that suggestion survives eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub rating: FeedbackRating,
    pub timestamp: DateTime<Utc>,
}
