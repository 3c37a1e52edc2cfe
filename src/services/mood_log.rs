//! Read and write paths between the handlers and the store.

use std::sync::Arc;

use chrono::NaiveDateTime;

use super::cache::TtlCache;
use crate::error::{AppError, AppResult};
use crate::models::entry::{EntryTime, MoodEntry, MoodSnapshot, TIMESTAMP_FORMAT};
use crate::models::mood::Mood;
use crate::store::{MoodStore, StoreError};

pub type SnapshotCache = TtlCache<Arc<MoodSnapshot>>;

/// Current snapshot, at most one cache TTL stale.
pub async fn load_snapshot(
    store: &MoodStore,
    cache: &SnapshotCache,
) -> Result<Arc<MoodSnapshot>, StoreError> {
    cache
        .get_or_try_fetch(|| async {
            let records = store.read_all().await?;
            let snapshot = MoodSnapshot::from_records(records);
            tracing::debug!(
                backend = store.backend_name(),
                rows = snapshot.len(),
                "Loaded mood snapshot"
            );
            Ok::<_, StoreError>(Arc::new(snapshot))
        })
        .await
}

/// Append one entry stamped with `now`. A failed append is reported as
/// [`AppError::WriteFailed`]; a successful one invalidates cached reads.
pub async fn log_mood(
    store: &MoodStore,
    cache: &SnapshotCache,
    mood: Mood,
    note: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<MoodEntry> {
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let note = note.map(str::trim).unwrap_or_default();

    store
        .append(&timestamp, mood.symbol(), note)
        .await
        .map_err(AppError::WriteFailed)?;

    cache.force_invalidate().await;
    tracing::info!(mood = %mood, has_note = !note.is_empty(), "Mood logged");

    Ok(MoodEntry {
        timestamp: EntryTime::At(now),
        mood: Some(mood.symbol().to_string()),
        note: Some(note.to_string()).filter(|n| !n.is_empty()),
    })
}

/// Drop cached reads and the store connection.
pub async fn refresh(store: &MoodStore, cache: &SnapshotCache) {
    cache.force_invalidate().await;
    store.reset_connection().await;
    tracing::info!(backend = store.backend_name(), "Caches invalidated");
}
