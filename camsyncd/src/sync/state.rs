use camsync_core::MediaCategory;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Last-synced timestamps, in epoch milliseconds, for each camera category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWatermark {
    pub id: i64,
    pub pictures_last_sync: i64,
    pub videos_last_sync: i64,
}

impl SyncWatermark {
    pub fn last_sync(&self, category: MediaCategory) -> i64 {
        match category {
            MediaCategory::Pictures => self.pictures_last_sync,
            MediaCategory::Videos => self.videos_last_sync,
        }
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Single global watermark row. There is no account or device key.
#[derive(Clone)]
pub struct SyncStateStore {
    pool: SqlitePool,
}

impl SyncStateStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_watermark(&self) -> Result<Option<SyncWatermark>, StateError> {
        let row = sqlx::query(
            "SELECT id, pictures_last_sync, videos_last_sync FROM camera_sync WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(SyncWatermark {
            id: row.try_get("id")?,
            pictures_last_sync: row.try_get("pictures_last_sync")?,
            videos_last_sync: row.try_get("videos_last_sync")?,
        }))
    }

    /// Overwrites the category's timestamp. This is not a max-merge: callers
    /// must advance in ascending order. Does nothing while uninitialized.
    pub async fn advance(&self, category: MediaCategory, timestamp: i64) -> Result<(), StateError> {
        let sql = match category {
            MediaCategory::Pictures => "UPDATE camera_sync SET pictures_last_sync = ?1 WHERE id = 1",
            MediaCategory::Videos => "UPDATE camera_sync SET videos_last_sync = ?1 WHERE id = 1",
        };
        sqlx::query(sql).bind(timestamp).execute(&self.pool).await?;
        Ok(())
    }

    /// Seeds both categories with `timestamp` unless a watermark already exists.
    pub async fn initialize(&self, timestamp: i64) -> Result<SyncWatermark, StateError> {
        sqlx::query(
            "INSERT INTO camera_sync (id, pictures_last_sync, videos_last_sync)
             VALUES (1, ?1, ?1)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(self.get_watermark().await?.unwrap_or(SyncWatermark {
            id: 1,
            pictures_last_sync: timestamp,
            videos_last_sync: timestamp,
        }))
    }

    /// Moves one category's watermark to `timestamp`, e.g. after its source
    /// folder changed. Creates the row when missing.
    pub async fn reset(
        &self,
        category: MediaCategory,
        timestamp: i64,
    ) -> Result<SyncWatermark, StateError> {
        let sql = match category {
            MediaCategory::Pictures => {
                "INSERT INTO camera_sync (id, pictures_last_sync, videos_last_sync)
                 VALUES (1, ?1, ?1)
                 ON CONFLICT(id) DO UPDATE SET pictures_last_sync = excluded.pictures_last_sync"
            }
            MediaCategory::Videos => {
                "INSERT INTO camera_sync (id, pictures_last_sync, videos_last_sync)
                 VALUES (1, ?1, ?1)
                 ON CONFLICT(id) DO UPDATE SET videos_last_sync = excluded.videos_last_sync"
            }
        };
        sqlx::query(sql).bind(timestamp).execute(&self.pool).await?;

        Ok(self.get_watermark().await?.unwrap_or(SyncWatermark {
            id: 1,
            pictures_last_sync: timestamp,
            videos_last_sync: timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::db::memory_pool;

    async fn make_store() -> SyncStateStore {
        SyncStateStore::from_pool(memory_pool().await)
    }

    #[tokio::test]
    async fn fresh_store_is_uninitialized() {
        let store = make_store().await;
        assert_eq!(store.get_watermark().await.unwrap(), None);
    }

    #[tokio::test]
    async fn advance_before_initialize_keeps_store_empty() {
        let store = make_store().await;
        store.advance(MediaCategory::Pictures, 500).await.unwrap();
        assert_eq!(store.get_watermark().await.unwrap(), None);
    }

    #[tokio::test]
    async fn initialize_seeds_both_categories_once() {
        let store = make_store().await;
        let seeded = store.initialize(100).await.unwrap();
        assert_eq!(seeded.pictures_last_sync, 100);
        assert_eq!(seeded.videos_last_sync, 100);
        assert_eq!(seeded.id, 1);

        let again = store.initialize(999).await.unwrap();
        assert_eq!(again, seeded);
    }

    #[tokio::test]
    async fn advance_overwrites_only_its_category() {
        let store = make_store().await;
        store.initialize(100).await.unwrap();

        store.advance(MediaCategory::Pictures, 150).await.unwrap();
        let watermark = store.get_watermark().await.unwrap().unwrap();
        assert_eq!(watermark.last_sync(MediaCategory::Pictures), 150);
        assert_eq!(watermark.last_sync(MediaCategory::Videos), 100);
    }

    #[tokio::test]
    async fn advance_is_last_write_wins() {
        let store = make_store().await;
        store.initialize(100).await.unwrap();

        store.advance(MediaCategory::Videos, 300).await.unwrap();
        store.advance(MediaCategory::Videos, 200).await.unwrap();
        let watermark = store.get_watermark().await.unwrap().unwrap();
        assert_eq!(watermark.videos_last_sync, 200);
    }

    #[tokio::test]
    async fn reset_creates_row_or_updates_one_category() {
        let store = make_store().await;
        let created = store.reset(MediaCategory::Videos, 42).await.unwrap();
        assert_eq!(created.pictures_last_sync, 42);
        assert_eq!(created.videos_last_sync, 42);

        let updated = store.reset(MediaCategory::Pictures, 7).await.unwrap();
        assert_eq!(updated.pictures_last_sync, 7);
        assert_eq!(updated.videos_last_sync, 42);
    }
}
