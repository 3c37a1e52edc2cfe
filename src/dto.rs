//! # Mood Tracker: Request/Response DTOs
//!
//! All API contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Validation is expressed via `validator` derive macros

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::entry::{EntryTime, MoodEntry, TIMESTAMP_FORMAT};
use crate::models::mood::Mood;

// ============================================================================
// Common
// ============================================================================

/// One logged row as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// Formatted timestamp, `None` when the stored value could not be parsed
    pub timestamp: Option<String>,
    /// Stored text of an unparseable timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_timestamp: Option<String>,
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_label: Option<String>,
    pub note: Option<String>,
}

impl EntryResponse {
    fn with_format(entry: &MoodEntry, format: &str) -> Self {
        let (timestamp, raw_timestamp) = match &entry.timestamp {
            EntryTime::At(at) => (Some(at.format(format).to_string()), None),
            EntryTime::Missing(raw) => (None, Some(raw.clone()).filter(|r| !r.is_empty())),
        };
        Self {
            timestamp,
            raw_timestamp,
            mood: entry.mood.clone(),
            mood_label: entry.catalog_mood().map(Mood::label),
            note: entry.note.clone(),
        }
    }

    /// Full `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn full(entry: &MoodEntry) -> Self {
        Self::with_format(entry, TIMESTAMP_FORMAT)
    }

    /// Time of day only, for single-day listings.
    pub fn time_of_day(entry: &MoodEntry) -> Self {
        Self::with_format(entry, "%H:%M:%S")
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/moods/catalog
#[derive(Debug, Serialize)]
pub struct CatalogItem {
    pub name: &'static str,
    pub label: String,
    pub symbol: &'static str,
    pub color: &'static str,
    pub default: bool,
}

// ============================================================================
// Logging
// ============================================================================

/// POST /api/moods
#[derive(Debug, Deserialize, Validate)]
pub struct LogMoodRequest {
    /// Symbol, selector label, or name of a catalog mood
    #[serde(default)]
    #[validate(length(min = 1, message = "Please select a mood."))]
    pub mood: String,

    #[validate(length(max = 500, message = "Note must be under 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogMoodResponse {
    pub entry: EntryResponse,
    pub message: String,
}

// ============================================================================
// Reading
// ============================================================================

/// GET /api/dashboard
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// GET /api/moods
#[derive(Debug, Serialize)]
pub struct AllEntriesResponse {
    pub as_of: DateTime<Utc>,
    pub total: usize,
    pub unparsed_timestamps: usize,
    pub entries: Vec<EntryResponse>,
}

/// POST /api/refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub refreshed_at: DateTime<Utc>,
}
