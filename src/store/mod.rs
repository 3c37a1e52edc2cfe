//! Row-based persistence for mood entries.
//!
//! A store does two things: append one `Timestamp, Mood, Note` row, and
//! return every row keyed by column name. The backend is chosen once at
//! startup from [`Config::store_backend`].

pub mod memory;
pub mod postgres;
pub mod sheets;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::service_account::ServiceAccountKey;
use crate::config::{Config, StoreBackend};
use crate::models::entry::RawRecord;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sheets::SheetsStore;

/// Column headers, in write order.
pub const HEADER: [&str; 3] = ["Timestamp", "Mood", "Note"];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("{0}")]
    DestinationNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Errors that should stop the service at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Credentials(_) | StoreError::DestinationNotFound(_) | StoreError::Config(_)
        )
    }
}

#[derive(Clone)]
pub enum MoodStore {
    Sheets(SheetsStore),
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl MoodStore {
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        match config.store_backend {
            StoreBackend::Sheets => {
                if config.spreadsheet_id.is_empty() {
                    return Err(StoreError::Config(
                        "SPREADSHEET_ID must be set for the sheets backend".into(),
                    ));
                }
                let key = ServiceAccountKey::load(
                    config.service_account_json.as_deref(),
                    &config.service_account_file,
                )?;
                let store = SheetsStore::new(
                    Arc::new(key),
                    &config.spreadsheet_id,
                    &config.worksheet_name,
                    Duration::from_secs(config.connection_cache_ttl_secs),
                )?;
                Ok(MoodStore::Sheets(store))
            }
            StoreBackend::Postgres => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    StoreError::Config("DATABASE_URL must be set for the postgres backend".into())
                })?;
                Ok(MoodStore::Postgres(PgStore::connect(url).await?))
            }
            StoreBackend::Memory => Ok(MoodStore::Memory(MemoryStore::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            MoodStore::Sheets(_) => "sheets",
            MoodStore::Postgres(_) => "postgres",
            MoodStore::Memory(_) => "memory",
        }
    }

    /// Append one row. Not retried.
    pub async fn append(&self, timestamp: &str, mood: &str, note: &str) -> Result<(), StoreError> {
        match self {
            MoodStore::Sheets(s) => s.append(timestamp, mood, note).await,
            MoodStore::Postgres(s) => s.append(timestamp, mood, note).await,
            MoodStore::Memory(s) => {
                s.append(timestamp, mood, note).await;
                Ok(())
            }
        }
    }

    pub async fn read_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        match self {
            MoodStore::Sheets(s) => s.read_all().await,
            MoodStore::Postgres(s) => s.read_all().await,
            MoodStore::Memory(s) => Ok(s.read_all().await),
        }
    }

    /// Verify the destination is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            MoodStore::Sheets(s) => s.ping().await,
            MoodStore::Postgres(s) => s.ping().await,
            MoodStore::Memory(_) => Ok(()),
        }
    }

    /// Drop any memoized connection so the next call reconnects.
    pub async fn reset_connection(&self) {
        if let MoodStore::Sheets(s) = self {
            s.reset_session().await;
        }
    }
}

/// Map header-led rows to records by column name. Missing columns are
/// synthesized as empty; blank rows are skipped.
pub fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<RawRecord> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let column = |name: &str| header.iter().position(|h| h.trim() == name);
    let (ts_idx, mood_idx, note_idx) = (column(HEADER[0]), column(HEADER[1]), column(HEADER[2]));

    let missing: Vec<&str> = HEADER
        .iter()
        .zip([ts_idx, mood_idx, note_idx])
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Store header is missing expected columns; treating them as empty");
    }

    let cell = |row: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i)).cloned()
    };

    rows.filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| RawRecord {
            timestamp: cell(row.as_slice(), ts_idx),
            mood: cell(row.as_slice(), mood_idx),
            note: cell(row.as_slice(), note_idx),
        })
        .collect()
}
