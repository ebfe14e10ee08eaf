use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use camsync_core::{ExtensionMimeResolver, MimeResolver};
use sqlx::SqlitePool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigurationSnapshot, expand_with_home, parse_bool};
use crate::sync::db;
use crate::sync::engine::{RunOutcome, SyncEngine, TriggerCallbacks};
use crate::sync::scanner::MediaScanner;
use crate::sync::state::SyncStateStore;
use crate::sync::uploads::UploadQueue;

// Period of the camera-uploads job on Android.
const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;

#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub interval: Duration,
    pub db_path: PathBuf,
    pub network_metered: bool,
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("home directory is unavailable")?;
        let db_path = match std::env::var("CAMSYNC_DB_PATH") {
            Ok(value) => expand_with_home(&value, &home),
            Err(_) => db::default_db_path().context("failed to resolve state database path")?,
        };
        let interval =
            Duration::from_secs(read_u64_env("CAMSYNC_INTERVAL_SECS", DEFAULT_INTERVAL_SECS));
        let network_metered = parse_bool(
            std::env::var("CAMSYNC_NETWORK_METERED").ok().as_deref(),
            false,
        );

        Ok(Self {
            interval,
            db_path,
            network_metered,
        })
    }
}

/// Trigger-side state shared with every run it fires.
#[derive(Debug, Default)]
pub struct TriggerState {
    cancel: CancellationToken,
    running: AtomicBool,
}

impl TriggerState {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    fn release(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl TriggerCallbacks for TriggerState {
    fn on_disabled(&self) {
        self.cancel.cancel();
    }

    fn on_run_complete(&self) {
        self.release();
    }
}

pub struct DaemonRuntime {
    config: DaemonConfig,
    pool: SqlitePool,
    resolver: Arc<dyn MimeResolver>,
    trigger: Arc<TriggerState>,
}

impl DaemonRuntime {
    pub async fn bootstrap(config: DaemonConfig) -> anyhow::Result<Self> {
        let pool = db::open_file(&config.db_path)
            .await
            .with_context(|| format!("failed to open state database at {:?}", config.db_path))?;
        Ok(Self::with_pool(config, pool))
    }

    pub fn with_pool(config: DaemonConfig, pool: SqlitePool) -> Self {
        Self {
            config,
            pool,
            resolver: Arc::new(ExtensionMimeResolver),
            trigger: Arc::new(TriggerState::default()),
        }
    }

    pub fn state_store(&self) -> SyncStateStore {
        SyncStateStore::from_pool(self.pool.clone())
    }

    pub fn upload_queue(&self) -> UploadQueue {
        UploadQueue::from_pool(self.pool.clone())
    }

    pub fn trigger(&self) -> &TriggerState {
        &self.trigger
    }

    /// Fires until the feature is disabled or a shutdown signal arrives.
    /// Ticks that come due while a run is still in flight are skipped.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            db = %self.config.db_path.display(),
            "camera sync started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.fire_once().await {
                        tracing::error!("camera sync run failed: {err:#}");
                    }
                }
                _ = self.trigger.cancel.cancelled() => {
                    tracing::info!("camera uploads disabled, trigger stopped");
                    break;
                }
                res = &mut shutdown => {
                    res.context("failed waiting for shutdown signal")?;
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }
        Ok(())
    }

    /// One firing with configuration read from the environment.
    pub async fn fire_once(&self) -> anyhow::Result<Option<RunOutcome>> {
        let snapshot =
            ConfigurationSnapshot::from_env().context("failed to read camera upload settings")?;
        self.fire_with(snapshot).await
    }

    /// Runs a fresh engine on its own task. Returns `None` when the firing was
    /// skipped.
    pub async fn fire_with(
        &self,
        snapshot: ConfigurationSnapshot,
    ) -> anyhow::Result<Option<RunOutcome>> {
        if !self.trigger.try_begin() {
            tracing::debug!("previous run still in flight, skipping firing");
            return Ok(None);
        }
        if self.config.network_metered && snapshot.requires_unmetered_network() {
            tracing::info!("waiting for an unmetered network, skipping firing");
            self.trigger.release();
            return Ok(None);
        }

        let engine = SyncEngine::new(
            MediaScanner::new(Arc::clone(&self.resolver)),
            self.state_store(),
            self.upload_queue(),
        );
        let trigger = Arc::clone(&self.trigger);
        let handle = tokio::spawn(async move { engine.run(&snapshot, trigger.as_ref()).await });

        let result = handle.await;
        // The engine does not report completion when it fails.
        self.trigger.release();
        let outcome = result
            .context("camera sync task panicked")?
            .context("camera sync run aborted")?;
        if let RunOutcome::Completed(summary) = outcome
            && summary.total() > 0
        {
            tracing::info!(
                pictures = summary.pictures_enqueued,
                videos = summary.videos_enqueued,
                "camera sync requested uploads"
            );
        }
        Ok(Some(outcome))
    }
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
