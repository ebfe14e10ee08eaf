use anyhow::Context;
use camsync_core::MediaCategory;
use camsyncd::daemon::{DaemonConfig, DaemonRuntime};
use camsyncd::sync::engine::RunOutcome;
use camsyncd::sync::state::now_millis;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run,
    Once,
    Init,
    Reset {
        category: MediaCategory,
        timestamp: Option<i64>,
    },
    Pending,
    Complete(i64),
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run;
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--once" => mode = CliMode::Once,
            "--init" => mode = CliMode::Init,
            "--pending" => mode = CliMode::Pending,
            "--reset" => {
                let category = args
                    .next()
                    .context("--reset requires a category (pictures or videos)")?
                    .parse::<MediaCategory>()?;
                mode = CliMode::Reset {
                    category,
                    timestamp: None,
                };
            }
            "--complete" => {
                let id = args
                    .next()
                    .context("--complete requires a pending upload id")?;
                let id = id
                    .parse::<i64>()
                    .with_context(|| format!("invalid upload id: {id}"))?;
                mode = CliMode::Complete(id);
            }
            "--help" | "-h" => mode = CliMode::Help,
            other => match &mut mode {
                CliMode::Reset { timestamp, .. } if timestamp.is_none() => {
                    let value = other
                        .parse::<i64>()
                        .with_context(|| format!("invalid timestamp: {other}"))?;
                    *timestamp = Some(value);
                }
                _ => anyhow::bail!("unknown argument: {other}"),
            },
        }
    }
    Ok(mode)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mode = parse_cli_mode(std::env::args())?;
    if mode == CliMode::Help {
        println!(
            "Usage: camsyncd [--once | --init | --reset <category> [<epoch-ms>] | --pending | --complete <id>]"
        );
        println!("  --once      Run a single sync pass and exit");
        println!("  --init      Seed the watermark with the current time");
        println!("  --reset     Move one category's watermark (default: now)");
        println!("  --pending   Print uploads waiting for the transfer service");
        println!("  --complete  Drop a pending upload taken over by the transfer service");
        return Ok(());
    }

    let config = DaemonConfig::from_env()?;
    let daemon = DaemonRuntime::bootstrap(config).await?;
    match mode {
        CliMode::Run => daemon.run().await,
        CliMode::Once => {
            match daemon.fire_once().await? {
                Some(RunOutcome::Completed(summary)) => println!(
                    "requested {} picture and {} video uploads",
                    summary.pictures_enqueued, summary.videos_enqueued
                ),
                Some(RunOutcome::Uninitialized) => {
                    println!("watermark not initialized, run `camsyncd --init` first")
                }
                Some(RunOutcome::Disabled) => println!("camera uploads are disabled"),
                None => println!("run skipped"),
            }
            Ok(())
        }
        CliMode::Init => {
            let watermark = daemon
                .state_store()
                .initialize(now_millis())
                .await
                .context("failed to initialize watermark")?;
            println!(
                "watermark: pictures={} videos={}",
                watermark.pictures_last_sync, watermark.videos_last_sync
            );
            Ok(())
        }
        CliMode::Reset {
            category,
            timestamp,
        } => {
            let watermark = daemon
                .state_store()
                .reset(category, timestamp.unwrap_or_else(now_millis))
                .await
                .with_context(|| format!("failed to reset {category} watermark"))?;
            println!(
                "watermark: pictures={} videos={}",
                watermark.pictures_last_sync, watermark.videos_last_sync
            );
            Ok(())
        }
        CliMode::Pending => {
            for upload in daemon.upload_queue().list_pending().await? {
                println!("{}", serde_json::to_string(&upload)?);
            }
            Ok(())
        }
        CliMode::Complete(id) => {
            if daemon.upload_queue().complete(id).await? {
                println!("upload {id} completed");
            } else {
                println!("no pending upload with id {id}");
            }
            Ok(())
        }
        CliMode::Help => Ok(()),
    }
}
