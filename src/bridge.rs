//! # Bridge
//!
//! Wires the controller pipeline, the telemetry decoder and the datagram link
//! together. The binary drives it from a `tokio::select!` loop; tests drive it
//! directly with a mock link.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::command::encoder::encode;
use crate::command::protocol::{validate, Command, CommandKind};
use crate::controller::pipeline::ControllerPipeline;
use crate::controller::sample::ControllerSample;
use crate::msp::decoder::decode;
use crate::error::Result;
use crate::telemetry::TelemetryHub;
use crate::transport::DatagramIO;

/// Controller-to-drone bridge over one datagram link
pub struct Bridge<D: DatagramIO> {
    link: D,
    pipeline: ControllerPipeline,
    hub: TelemetryHub,
}

impl<D: DatagramIO> Bridge<D> {
    #[must_use]
    pub fn new(link: D, pipeline: ControllerPipeline, hub: TelemetryHub) -> Self {
        Self { link, pipeline, hub }
    }

    pub fn link(&self) -> &D {
        &self.link
    }

    pub fn pipeline(&self) -> &ControllerPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ControllerPipeline {
        &mut self.pipeline
    }

    pub fn hub(&self) -> &TelemetryHub {
        &self.hub
    }

    /// Run one pipeline tick and send whatever it emits
    ///
    /// # Returns
    ///
    /// Number of commands handed to the link without error
    pub async fn on_tick(&mut self, sample: Option<&ControllerSample>, now: Instant) -> usize {
        let commands = self.pipeline.tick(sample, now);
        let mut sent = 0;
        for command in &commands {
            if self.send(command).await {
                sent += 1;
            }
        }
        sent
    }

    /// Decode one received datagram and publish it if it is telemetry
    ///
    /// # Returns
    ///
    /// `true` if the datagram decoded to a telemetry record
    pub fn on_datagram(&self, bytes: &[u8]) -> bool {
        match decode(bytes) {
            Some(telemetry) => {
                trace!("Telemetry: {:?}", telemetry);
                self.hub.publish(telemetry);
                true
            }
            None => false,
        }
    }

    /// Encode a one-off intent (UI button or slider) with the current safe
    /// mode and send it
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use skynet_bridge::bridge::Bridge;
    /// use skynet_bridge::command::protocol::CommandKind;
    /// use skynet_bridge::controller::pipeline::{ControllerPipeline, PipelineOptions};
    /// use skynet_bridge::telemetry::TelemetryHub;
    /// use skynet_bridge::transport::UdpLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = UdpLink::connect(14551, "192.168.4.1:14550").await?;
    ///     let bridge = Bridge::new(link, ControllerPipeline::new(PipelineOptions::default()), TelemetryHub::new());
    ///
    ///     let command = bridge.send_intent(CommandKind::ThrottlePercentage, 95).await;
    ///     assert_eq!(command.value, 80);
    ///     Ok(())
    /// }
    /// ```
    pub async fn send_intent(&self, kind: CommandKind, value: i32) -> Command {
        let command = encode(kind, value, self.pipeline.safe_mode());
        self.send(&command).await;
        command
    }

    /// Parse, check and send an intent given by wire name, e.g. from a UI
    ///
    /// # Arguments
    ///
    /// * `name` - Command wire name such as `"hover"` or `"yaw_left"`
    /// * `value` - Raw intent value, checked with [`validate`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidCommand` for an unknown name or an out-of-range value;
    /// nothing is sent in that case
    pub async fn send_named(&self, name: &str, value: i32) -> Result<Command> {
        let kind: CommandKind = name.parse()?;
        validate(kind, value)?;
        Ok(self.send_intent(kind, value).await)
    }

    /// Serialize and send; failures are logged and dropped
    async fn send(&self, command: &Command) -> bool {
        let wire = match command.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Failed to serialize {}: {}", command, e);
                return false;
            }
        };

        match self.link.send(wire.as_bytes()).await {
            Ok(_) => {
                debug!("Sent {} ({})", command, command.describe());
                true
            }
            Err(e) => {
                debug!("Send failed for {}: {}", command, e);
                false
            }
        }
    }
}
