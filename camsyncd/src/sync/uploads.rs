use std::path::PathBuf;

use camsync_core::{BehaviorAfterUpload, CreatedBy, UploadIntent};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use super::engine::{RequestError, TransferRequester};
use super::state::now_millis;

/// Upload persisted for the transfer subsystem to pick up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpload {
    pub id: i64,
    pub local_path: PathBuf,
    pub remote_path: String,
    pub account: Option<String>,
    pub behavior: BehaviorAfterUpload,
    pub mime_type: String,
    pub create_parent: bool,
    pub created_by: CreatedBy,
    pub requested_at: i64,
}

/// SQLite-backed [`TransferRequester`]: requesting an upload only records it.
#[derive(Clone)]
pub struct UploadQueue {
    pool: SqlitePool,
}

impl UploadQueue {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn push(&self, intent: &UploadIntent) -> Result<i64, RequestError> {
        let local_path = intent.local_path.to_str().ok_or_else(|| {
            RequestError::Rejected(format!(
                "local path is not valid UTF-8: {}",
                intent.local_path.display()
            ))
        })?;
        let result = sqlx::query(
            "INSERT INTO pending_uploads (
                local_path,
                remote_path,
                account,
                behavior,
                mime_type,
                create_parent,
                created_by,
                requested_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(local_path)
        .bind(&intent.remote_path)
        .bind(&intent.account)
        .bind(intent.behavior.as_str())
        .bind(&intent.mime_type)
        .bind(if intent.create_parent { 1 } else { 0 })
        .bind(intent.created_by.as_str())
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingUpload>, RequestError> {
        let rows = sqlx::query(
            "SELECT id, local_path, remote_path, account, behavior, mime_type, create_parent, created_by, requested_at
             FROM pending_uploads
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let local_path: String = row.try_get("local_path")?;
            let behavior: String = row.try_get("behavior")?;
            let created_by: String = row.try_get("created_by")?;
            let create_parent: i64 = row.try_get("create_parent")?;
            out.push(PendingUpload {
                id: row.try_get("id")?,
                local_path: PathBuf::from(local_path),
                remote_path: row.try_get("remote_path")?,
                account: row.try_get("account")?,
                behavior: BehaviorAfterUpload::from_setting(Some(&behavior)),
                mime_type: row.try_get("mime_type")?,
                create_parent: create_parent != 0,
                created_by: parse_created_by(&created_by)?,
                requested_at: row.try_get("requested_at")?,
            });
        }
        Ok(out)
    }

    /// Drops an entry once the transfer subsystem has taken it over.
    pub async fn complete(&self, id: i64) -> Result<bool, RequestError> {
        let result = sqlx::query("DELETE FROM pending_uploads WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl TransferRequester for UploadQueue {
    async fn enqueue(&self, intent: &UploadIntent) -> Result<(), RequestError> {
        self.push(intent).await.map(|_| ())
    }
}

fn parse_created_by(value: &str) -> Result<CreatedBy, RequestError> {
    match value {
        "camera-upload-picture" => Ok(CreatedBy::CameraUploadPicture),
        "camera-upload-video" => Ok(CreatedBy::CameraUploadVideo),
        other => Err(RequestError::Rejected(format!("unknown created_by tag: {other}"))),
    }
}
