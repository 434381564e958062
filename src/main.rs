use anyhow::{Context, Result};
use std::sync::Arc;
use teleinfo_sync::bootstrap::{bootstrap, JsonFileSource};
use teleinfo_sync::bus::EventBus;
use teleinfo_sync::config::{self, SyncConfig};
use teleinfo_sync::event::BusMessage;
use teleinfo_sync::state::{DeviceRegistry, EventSynchronizer, SyncMetrics};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Replays newline-delimited JSON events from stdin against the device
/// registry, then prints the final registry and metrics.
#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the final report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teleinfo_sync=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("teleinfo-sync starting...");

    let mut config = match config::config_path_from_env() {
        Some(path) => config::load_config(&path)?,
        None => SyncConfig::default(),
    };
    config::apply_env_overrides(&mut config);

    // Registry must be populated before patches flow
    let registry = Arc::new(DeviceRegistry::new());
    match &config.bootstrap.devices_file {
        Some(path) => {
            bootstrap(&registry, &JsonFileSource::new(path))?;
        }
        None => warn!("No devices file configured, starting with an empty registry"),
    }

    let metrics = SyncMetrics::new();
    let bus = Arc::new(EventBus::new(&config.bus, metrics.clone()));
    let sync = Arc::new(EventSynchronizer::new(Arc::clone(&registry), metrics.clone()));
    sync.attach(&bus, &config.bus)
        .context("Failed to subscribe synchronizer")?;

    let (tx, rx) = mpsc::channel(config.bus.queue_capacity);
    let pump = tokio::spawn(Arc::clone(&bus).run(rx));

    // Raw bytes so a line that is not UTF-8 is skipped instead of ending input
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        match parse_line(&buf) {
            Ok(None) => continue,
            Ok(Some(message)) => {
                if tx.send(message).await.is_err() {
                    warn!("Event bus stopped, no longer reading input");
                    break;
                }
            }
            Err(e) => {
                metrics.record_rejected();
                warn!(error = %format!("{:#}", e), "Failed to parse event line, skipping");
            }
        }
    }

    // Closing the queue lets the pump drain and exit
    drop(tx);
    let received = pump.await.context("Event bus task failed")?;
    info!(received = received, "Input exhausted");

    let report = serde_json::json!({
        "devices": registry.snapshot(),
        "metrics": metrics.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Decode one input line. Blank lines yield `None`.
fn parse_line(raw: &[u8]) -> Result<Option<BusMessage>> {
    let line = std::str::from_utf8(raw).context("Event line is not valid UTF-8")?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let message = serde_json::from_str(line).context("Event line is not a bus message")?;
    Ok(Some(message))
}
