//! # Skynet Bridge
//!
//! Fly an MSP flight controller over UDP with a game controller.
//!
//! Reads one gamepad, runs it through the controller pipeline on a fixed tick
//! and sends the resulting commands to the flight controller's network bridge.
//! Telemetry coming back on the same socket is decoded and published.

use std::time::Instant;

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use skynet_bridge::bridge::Bridge;
use skynet_bridge::config::{Config, LoggingConfig};
use skynet_bridge::controller::gamepad;
use skynet_bridge::controller::pipeline::{ControllerPipeline, PipelineOptions};
use skynet_bridge::controller::stats::StatsSampler;
use skynet_bridge::telemetry::TelemetryHub;
use skynet_bridge::transport::{DatagramIO, UdpLink};

/// Used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for Skynet Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first CLI argument or `config/default.toml`)
///    - Set up logging (console, plus a daily file when enabled)
///    - Open the UDP link and start the gamepad reader
///
/// 2. **Main Loop**
///    - Pipeline tick (default 16 ms): sample the gamepad, send commands
///    - Incoming datagrams: decode and publish telemetry
///    - Stats tick (default 1 s): log sample and command rates
///    - Ctrl+C: shut down
///
/// # Errors
///
/// Returns error if the configuration is invalid or the link cannot be opened.
/// A missing gamepad is not an error; the pipeline stays disabled until one
/// appears.
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path(std::env::args());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("Skynet Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    let link = UdpLink::from_config(&config.link)
        .await
        .context("Failed to open UDP link")?;

    let pipeline = ControllerPipeline::new(PipelineOptions::from_config(&config));
    let mut sampler = StatsSampler::new(pipeline.counters(), Instant::now());
    let mut bridge = Bridge::new(link, pipeline, TelemetryHub::new());

    // Never joined; the thread may be parked in a blocking read at exit
    let (controller_rx, _reader) =
        gamepad::spawn_reader(config.controller.clone()).context("Failed to start gamepad reader")?;

    let mut tick = interval(config.pipeline.tick_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats = interval(config.pipeline.stats_interval());

    let mut buf = vec![0u8; config.link.recv_buffer_size];

    info!(
        "Running: tick {} ms, safe mode {}",
        config.pipeline.tick_interval_ms,
        if bridge.pipeline().safe_mode() { "on" } else { "off" }
    );
    info!("Press Start on the controller to enable input, Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let sample = controller_rx.borrow().clone();
                bridge.on_tick(sample.as_ref(), Instant::now()).await;
            }

            result = bridge.link().recv(&mut buf) => {
                match result {
                    Ok(n) => {
                        bridge.on_datagram(&buf[..n]);
                    }
                    Err(e) => debug!("Receive failed: {}", e),
                }
            }

            _ = stats.tick() => {
                let rates = sampler.sample(Instant::now());
                debug!(
                    "Pipeline: {:.1} samples/s, {:.1} commands/s",
                    rates.samples_per_sec, rates.commands_per_sec
                );
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let telemetry = bridge.hub().snapshot();
    info!("Telemetry frames received: {}", telemetry.frames);

    Ok(())
}

/// Configuration path from the command line, skipping the program name
fn config_path(mut args: impl Iterator<Item = String>) -> String {
    args.nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Console logging, plus a daily rolling file when enabled
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until shutdown so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if config.file_enabled {
        let appender = tracing_appender::rolling::daily(&config.log_dir, "skynet-bridge.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();
        Some(guard)
    } else {
        registry.init();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_config_path_default() {
        assert_eq!(config_path(args(&["skynet-bridge"])), "config/default.toml");
        assert_eq!(config_path(args(&[])), "config/default.toml");
    }

    #[test]
    fn test_config_path_from_args() {
        assert_eq!(
            config_path(args(&["skynet-bridge", "/etc/skynet.toml"])),
            "/etc/skynet.toml"
        );
    }

    #[test]
    fn test_default_config_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        assert!(Config::load(path).is_ok());
    }
}
