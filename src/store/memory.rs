use std::sync::Arc;

use tokio::sync::RwLock;

use super::{records_from_rows, HEADER};
use crate::models::entry::RawRecord;

/// Process-local sheet: header row plus appended rows.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with pre-existing sheet contents, header included.
    #[cfg(test)]
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    pub async fn append(&self, timestamp: &str, mood: &str, note: &str) {
        let mut rows = self.rows.write().await;
        if rows.is_empty() {
            rows.push(HEADER.iter().map(|h| h.to_string()).collect());
        }
        rows.push(vec![timestamp.to_string(), mood.to_string(), note.to_string()]);
    }

    pub async fn read_all(&self) -> Vec<RawRecord> {
        let rows = self.rows.read().await.clone();
        records_from_rows(rows)
    }

    #[cfg(test)]
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}
