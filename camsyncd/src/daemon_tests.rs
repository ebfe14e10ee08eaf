use super::*;
use crate::config::CategoryConfig;
use crate::sync::db::memory_pool;
use crate::sync::engine::RunSummary;
use camsync_core::BehaviorAfterUpload;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tempfile::tempdir;

fn daemon_config(network_metered: bool) -> DaemonConfig {
    DaemonConfig {
        interval: Duration::from_secs(60),
        db_path: PathBuf::from(":memory:"),
        network_metered,
    }
}

fn snapshot(source: &Path, enabled: bool, wifi_only: bool) -> ConfigurationSnapshot {
    let category = CategoryConfig {
        enabled,
        wifi_only,
        source_dir: source.to_path_buf(),
        dest_dir: "/CameraUpload/".into(),
        account: Some("alice@cloud".into()),
        behavior: BehaviorAfterUpload::Forget,
    };
    ConfigurationSnapshot {
        pictures: category.clone(),
        videos: CategoryConfig {
            enabled: false,
            ..category
        },
    }
}

fn touch(dir: &Path, name: &str, mtime_ms: u64) {
    let file = std::fs::File::create(dir.join(name)).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_millis(mtime_ms))
        .unwrap();
}

#[test]
fn reads_interval_from_env_or_default() {
    assert_eq!(read_u64_env("NO_SUCH_ENV_FOR_CAMSYNC_TEST", 42), 42);
}

#[tokio::test]
async fn firing_enqueues_into_upload_queue() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_0001.jpg", 2_000);
    let runtime = DaemonRuntime::with_pool(daemon_config(false), memory_pool().await);
    runtime.state_store().initialize(1_000).await.unwrap();

    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, false))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Some(RunOutcome::Completed(RunSummary {
            pictures_enqueued: 1,
            videos_enqueued: 0,
        }))
    );
    let pending = runtime.upload_queue().list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].local_path, dir.path().join("IMG_0001.jpg"));
    assert!(!runtime.trigger().is_running());
}

#[tokio::test]
async fn disabled_feature_cancels_trigger() {
    let dir = tempdir().unwrap();
    let runtime = DaemonRuntime::with_pool(daemon_config(false), memory_pool().await);

    let outcome = runtime
        .fire_with(snapshot(dir.path(), false, false))
        .await
        .unwrap();

    assert_eq!(outcome, Some(RunOutcome::Disabled));
    assert!(runtime.trigger().is_cancelled());
    assert!(!runtime.trigger().is_running());
}

#[tokio::test]
async fn metered_network_defers_wifi_only_firing() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_0001.jpg", 2_000);
    let runtime = DaemonRuntime::with_pool(daemon_config(true), memory_pool().await);
    runtime.state_store().initialize(1_000).await.unwrap();

    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, true))
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert!(runtime.upload_queue().list_pending().await.unwrap().is_empty());
    assert!(!runtime.trigger().is_running());

    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, false))
        .await
        .unwrap();
    assert!(matches!(outcome, Some(RunOutcome::Completed(_))));
}

#[tokio::test]
async fn firing_is_skipped_while_a_run_is_in_flight() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_0001.jpg", 2_000);
    let runtime = DaemonRuntime::with_pool(daemon_config(false), memory_pool().await);
    runtime.state_store().initialize(1_000).await.unwrap();

    assert!(runtime.trigger.try_begin());
    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, false))
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert!(runtime.upload_queue().list_pending().await.unwrap().is_empty());

    runtime.trigger.release();
    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, false))
        .await
        .unwrap();
    assert!(matches!(outcome, Some(RunOutcome::Completed(_))));
}

#[tokio::test]
async fn uninitialized_store_releases_running_marker() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_0001.jpg", 2_000);
    let runtime = DaemonRuntime::with_pool(daemon_config(false), memory_pool().await);

    let outcome = runtime
        .fire_with(snapshot(dir.path(), true, false))
        .await
        .unwrap();
    assert_eq!(outcome, Some(RunOutcome::Uninitialized));
    assert!(!runtime.trigger().is_running());
    assert!(!runtime.trigger().is_cancelled());
}
