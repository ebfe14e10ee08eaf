use std::future::Future;

use camsync_core::{MediaCategory, MediaFileDescriptor, PathError, UploadIntent};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;

use super::scanner::MediaScanner;
use super::state::{StateError, SyncStateStore, SyncWatermark};
use crate::config::{CategoryConfig, ConfigurationSnapshot};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("upload request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("upload request failed: {0}")]
    Request(#[from] RequestError),
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

/// Hands an upload intent to whatever performs the transfer.
pub trait TransferRequester: Send + Sync {
    fn enqueue(
        &self,
        intent: &UploadIntent,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

/// Notifications the engine sends back to the trigger that fired it.
pub trait TriggerCallbacks: Send + Sync {
    /// Neither category is enabled; the trigger should stop firing.
    fn on_disabled(&self);
    fn on_run_complete(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub pictures_enqueued: usize,
    pub videos_enqueued: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.pictures_enqueued + self.videos_enqueued
    }

    fn record(&mut self, category: MediaCategory, count: usize) {
        match category {
            MediaCategory::Pictures => self.pictures_enqueued += count,
            MediaCategory::Videos => self.videos_enqueued += count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Disabled,
    Uninitialized,
    Completed(RunSummary),
}

pub struct SyncEngine<R> {
    scanner: MediaScanner,
    state: SyncStateStore,
    requester: R,
    // Scoped to this instance only; overlapping runs are kept apart by the trigger.
    handle_lock: Mutex<()>,
}

impl<R: TransferRequester> SyncEngine<R> {
    pub fn new(scanner: MediaScanner, state: SyncStateStore, requester: R) -> Self {
        Self {
            scanner,
            state,
            requester,
            handle_lock: Mutex::new(()),
        }
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    /// One sync pass. Enqueue and state failures abort the run; in that case
    /// `on_run_complete` is left to the caller.
    pub async fn run<C>(
        &self,
        config: &ConfigurationSnapshot,
        callbacks: &C,
    ) -> Result<RunOutcome, EngineError>
    where
        C: TriggerCallbacks + ?Sized,
    {
        if !config.any_enabled() {
            tracing::info!("camera uploads disabled, cancelling the periodic trigger");
            callbacks.on_disabled();
            callbacks.on_run_complete();
            return Ok(RunOutcome::Disabled);
        }

        let Some(watermark) = self.state.get_watermark().await? else {
            tracing::debug!("no watermark stored yet, nothing to compare with");
            callbacks.on_run_complete();
            return Ok(RunOutcome::Uninitialized);
        };

        let mut summary = RunSummary::default();
        for category in MediaCategory::ALL {
            let category_config = config.category(category);
            if !category_config.enabled {
                continue;
            }
            let count = self
                .sync_category(category, category_config, &watermark)
                .await?;
            summary.record(category, count);
        }

        tracing::debug!(
            pictures = summary.pictures_enqueued,
            videos = summary.videos_enqueued,
            "all files synced, finishing run"
        );
        callbacks.on_run_complete();
        Ok(RunOutcome::Completed(summary))
    }

    async fn sync_category(
        &self,
        category: MediaCategory,
        config: &CategoryConfig,
        watermark: &SyncWatermark,
    ) -> Result<usize, EngineError> {
        let last_sync = watermark.last_sync(category);
        let files = self.scanner.scan(&config.source_dir, category).await;

        let mut enqueued = 0;
        for file in &files {
            if file.last_modified <= last_sync {
                tracing::debug!(
                    %category,
                    path = %file.absolute_path.display(),
                    "created before period to check, ignoring {} <= {}",
                    format_millis(file.last_modified),
                    format_millis(last_sync)
                );
                continue;
            }
            self.handle_file(category, config, file).await?;
            enqueued += 1;
        }
        Ok(enqueued)
    }

    async fn handle_file(
        &self,
        category: MediaCategory,
        config: &CategoryConfig,
        file: &MediaFileDescriptor,
    ) -> Result<(), EngineError> {
        let _guard = self.handle_lock.lock().await;

        let intent = UploadIntent::for_file(
            category,
            &config.source_dir,
            &config.dest_dir,
            &file.file_name,
            &file.mime_type,
            config.account.as_deref(),
            config.behavior,
        )?;
        self.requester.enqueue(&intent).await?;

        tracing::debug!(%category, timestamp = file.last_modified, "updating watermark");
        self.state.advance(category, file.last_modified).await?;

        match intent.account.as_deref() {
            Some(account) => tracing::info!(
                local = %intent.local_path.display(),
                remote = %intent.remote_path,
                account,
                "requested upload"
            ),
            None => tracing::warn!(
                local = %intent.local_path.display(),
                remote = %intent.remote_path,
                "requested upload with no account"
            ),
        }
        Ok(())
    }
}

fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
