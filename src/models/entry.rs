use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::mood::Mood;

/// Format written to the `Timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A logged timestamp, or the raw cell text when it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTime {
    At(NaiveDateTime),
    Missing(String),
}

impl EntryTime {
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            EntryTime::At(at) => Some(*at),
            EntryTime::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, EntryTime::Missing(_))
    }
}

/// Parse a stored timestamp. Never fails: unparseable input becomes
/// [`EntryTime::Missing`].
pub fn parse_timestamp(raw: &str) -> EntryTime {
    let trimmed = raw.trim();

    for format in DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return EntryTime::At(at);
        }
    }

    // Offset-qualified values keep their wall-clock time.
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return EntryTime::At(at.naive_local());
    }

    if let Some(at) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return EntryTime::At(at);
    }

    EntryTime::Missing(raw.to_string())
}

/// A row as read from the store, keyed by header name. Any column may be
/// absent when the sheet's header has drifted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: Option<String>,
    pub mood: Option<String>,
    pub note: Option<String>,
}

impl RawRecord {
    #[cfg(test)]
    pub fn new(timestamp: &str, mood: &str, note: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            mood: Some(mood.to_string()),
            note: Some(note.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntry {
    pub timestamp: EntryTime,
    pub mood: Option<String>,
    pub note: Option<String>,
}

impl MoodEntry {
    pub fn from_record(record: RawRecord) -> Self {
        let timestamp = match record.timestamp {
            Some(raw) => parse_timestamp(&raw),
            None => EntryTime::Missing(String::new()),
        };
        Self {
            timestamp,
            mood: non_empty(record.mood),
            note: non_empty(record.note),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.datetime().map(|at| at.date())
    }

    /// The catalog mood this entry was logged with, if it is one.
    pub fn catalog_mood(&self) -> Option<Mood> {
        self.mood.as_deref().and_then(Mood::from_symbol)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Every entry read from the store at one point in time.
#[derive(Debug, Clone)]
pub struct MoodSnapshot {
    pub entries: Vec<MoodEntry>,
    pub loaded_at: DateTime<Utc>,
}

impl MoodSnapshot {
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let entries: Vec<MoodEntry> = records.into_iter().map(MoodEntry::from_record).collect();

        let snapshot = Self {
            entries,
            loaded_at: Utc::now(),
        };

        let malformed = snapshot.malformed_count();
        if malformed > 0 {
            tracing::warn!(
                malformed,
                total = snapshot.entries.len(),
                "Could not parse all timestamps; rows with invalid timestamps are ignored for date filtering"
            );
        }

        snapshot
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn malformed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.timestamp.is_missing()).count()
    }

    pub fn has_valid_timestamps(&self) -> bool {
        self.entries.iter().any(|e| !e.timestamp.is_missing())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
