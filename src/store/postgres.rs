use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::StoreError;
use crate::models::entry::RawRecord;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = create_pool(database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    pub async fn append(&self, timestamp: &str, mood: &str, note: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO mood_entries (logged_at, mood, note) VALUES ($1, $2, $3)")
            .bind(timestamp)
            .bind(mood)
            .bind(note)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn read_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(
            "SELECT logged_at, mood, note FROM mood_entries ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, mood, note)| RawRecord {
                timestamp,
                mood,
                note,
            })
            .collect())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
