//! Daily mood aggregation over a [`MoodSnapshot`].
//!
//! Everything here is a pure function of its inputs: no caching, no clock,
//! no mutation of the snapshot.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::entry::{MoodEntry, MoodSnapshot};
use crate::models::mood::Mood;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

/// Zero-filled counts for one day, one row per catalog mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountTable {
    pub date: NaiveDate,
    pub rows: Vec<MoodCount>,
    /// Rows on the date whose mood is not in the catalog.
    pub unrecognized: usize,
}

impl CountTable {
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    #[cfg(test)]
    pub fn count_for(&self, mood: Mood) -> usize {
        self.rows
            .iter()
            .find(|r| r.mood == mood)
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

fn on_date(entry: &MoodEntry, date: NaiveDate) -> bool {
    entry.date() == Some(date)
}

/// Per-mood counts for `date`. Rows without a parseable timestamp are
/// skipped; the result always has one row per catalog mood, ordered by
/// symbol.
pub fn counts_for_date(snapshot: &MoodSnapshot, date: NaiveDate) -> CountTable {
    let mut counts: HashMap<Mood, usize> = HashMap::new();
    let mut unrecognized = 0;

    for entry in snapshot.entries.iter().filter(|e| on_date(e, date)) {
        match entry.catalog_mood() {
            Some(mood) => *counts.entry(mood).or_insert(0) += 1,
            None => unrecognized += 1,
        }
    }

    let rows = Mood::sorted_by_symbol()
        .into_iter()
        .map(|mood| MoodCount {
            mood,
            count: counts.get(&mood).copied().unwrap_or(0),
        })
        .collect();

    CountTable {
        date,
        rows,
        unrecognized,
    }
}

/// Entries logged on `date`, most recent first. Ties keep store order.
pub fn details_for_date(snapshot: &MoodSnapshot, date: NaiveDate) -> Vec<&MoodEntry> {
    let mut details: Vec<&MoodEntry> = snapshot
        .entries
        .iter()
        .filter(|e| on_date(e, date))
        .collect();
    details.sort_by_key(|e| Reverse(e.timestamp.datetime()));
    details
}

/// The unfiltered view: every entry, most recent first, with unparseable
/// timestamps at the end.
pub fn all_entries(snapshot: &MoodSnapshot) -> Vec<&MoodEntry> {
    let mut entries: Vec<&MoodEntry> = snapshot.entries.iter().collect();
    // None sorts below Some, so Reverse puts missing timestamps last.
    entries.sort_by_key(|e| Reverse(e.timestamp.datetime()));
    entries
}

/// Selectable date range: the earliest parsed entry date (if any) to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: Option<NaiveDate>,
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date <= self.max && self.min.map_or(true, |min| date >= min)
    }
}

pub fn date_bounds(snapshot: &MoodSnapshot, today: NaiveDate) -> DateBounds {
    DateBounds {
        min: snapshot.entries.iter().filter_map(|e| e.date()).min(),
        max: today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::RawRecord;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn example_snapshot() -> MoodSnapshot {
        MoodSnapshot::from_records(vec![
            RawRecord::new("2024-01-01 09:00:00", "😊", ""),
            RawRecord::new("2024-01-01 09:05:00", "😠", "slow"),
            RawRecord::new("2024-01-02 10:00:00", "😊", ""),
        ])
    }

    #[test]
    fn test_counts_example_day() {
        let table = counts_for_date(&example_snapshot(), ymd(2024, 1, 1));
        assert_eq!(table.rows.len(), 7);
        assert_eq!(table.count_for(Mood::Happy), 1);
        assert_eq!(table.count_for(Mood::Frustrated), 1);
        for mood in [Mood::Confused, Mood::Celebratory, Mood::Sad, Mood::Thoughtful, Mood::Tired] {
            assert_eq!(table.count_for(mood), 0, "{} should be zero", mood.name());
        }
        assert_eq!(table.total(), 2);
        assert_eq!(table.unrecognized, 0);
    }

    #[test]
    fn test_details_example_day_most_recent_first() {
        let snapshot = example_snapshot();
        let details = details_for_date(&snapshot, ymd(2024, 1, 1));
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].mood.as_deref(), Some("😠"));
        assert_eq!(details[0].note.as_deref(), Some("slow"));
        assert_eq!(details[1].mood.as_deref(), Some("😊"));
    }

    #[test]
    fn test_empty_snapshot_is_all_zero() {
        let snapshot = MoodSnapshot::empty();
        let table = counts_for_date(&snapshot, ymd(2024, 5, 5));
        assert_eq!(table.rows.len(), 7);
        assert!(table.rows.iter().all(|r| r.count == 0));
        assert!(details_for_date(&snapshot, ymd(2024, 5, 5)).is_empty());
        assert!(all_entries(&snapshot).is_empty());
    }

    #[test]
    fn test_rows_are_ordered_by_symbol() {
        let table = counts_for_date(&example_snapshot(), ymd(2024, 1, 1));
        let order: Vec<Mood> = table.rows.iter().map(|r| r.mood).collect();
        assert_eq!(order, Mood::sorted_by_symbol());
    }

    #[test]
    fn test_malformed_timestamp_only_in_all_entries() {
        let snapshot = MoodSnapshot::from_records(vec![
            RawRecord::new("2024-01-01 09:00:00", "😊", ""),
            RawRecord::new("not-a-date", "😴", "ghost"),
        ]);

        for date in [ymd(2024, 1, 1), ymd(1970, 1, 1)] {
            assert_eq!(counts_for_date(&snapshot, date).count_for(Mood::Tired), 0);
            assert!(details_for_date(&snapshot, date)
                .iter()
                .all(|e| e.note.as_deref() != Some("ghost")));
        }

        let all = all_entries(&snapshot);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].note.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_sum_matches_valid_rows_on_date() {
        let snapshot = MoodSnapshot::from_records(vec![
            RawRecord::new("2024-03-10 08:00:00", "😊", ""),
            RawRecord::new("2024-03-10 12:00:00", "🤔", ""),
            RawRecord::new("2024-03-10 13:00:00", "🙃", "off-catalog"),
            RawRecord::new("2024-03-10 14:00:00", "😊", ""),
            RawRecord::new("2024-03-11 00:00:00", "😊", ""),
            RawRecord::new("garbage", "😊", ""),
        ]);
        let date = ymd(2024, 3, 10);
        let table = counts_for_date(&snapshot, date);
        let valid_on_date = snapshot.entries.iter().filter(|e| e.date() == Some(date)).count();
        assert_eq!(table.total() + table.unrecognized, valid_on_date);
        assert_eq!(table.unrecognized, 1);
        assert_eq!(table.count_for(Mood::Happy), 2);
    }

    #[test]
    fn test_details_non_increasing() {
        let snapshot = MoodSnapshot::from_records(vec![
            RawRecord::new("2024-03-10 08:00:00", "😊", "a"),
            RawRecord::new("2024-03-10 17:45:10", "😥", "b"),
            RawRecord::new("2024-03-10 12:00:00", "🤔", "c"),
            RawRecord::new("2024-03-10 12:00:00", "😴", "d"),
        ]);
        let details = details_for_date(&snapshot, ymd(2024, 3, 10));
        assert_eq!(details.len(), 4);
        assert!(details
            .windows(2)
            .all(|w| w[0].timestamp.datetime() >= w[1].timestamp.datetime()));
        // equal timestamps keep store order
        assert_eq!(details[1].note.as_deref(), Some("c"));
        assert_eq!(details[2].note.as_deref(), Some("d"));
    }

    #[test]
    fn test_counts_idempotent() {
        let snapshot = example_snapshot();
        let first = counts_for_date(&snapshot, ymd(2024, 1, 2));
        let second = counts_for_date(&snapshot, ymd(2024, 1, 2));
        assert_eq!(first, second);
        assert_eq!(first.count_for(Mood::Happy), 1);
    }

    #[test]
    fn test_date_bounds() {
        let today = ymd(2024, 6, 1);
        let bounds = date_bounds(&example_snapshot(), today);
        assert_eq!(bounds.min, Some(ymd(2024, 1, 1)));
        assert!(bounds.contains(ymd(2024, 1, 1)));
        assert!(bounds.contains(today));
        assert!(!bounds.contains(ymd(2023, 12, 31)));
        assert!(!bounds.contains(ymd(2024, 6, 2)));

        let empty = date_bounds(&MoodSnapshot::empty(), today);
        assert_eq!(empty.min, None);
        assert!(empty.contains(ymd(2000, 1, 1)));
    }
}
