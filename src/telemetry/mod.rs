//! # Telemetry Module
//!
//! Latest-value store for decoded flight controller telemetry, with change
//! notification for any number of observers.
//!
//! This module handles:
//! - Folding each decoded [`Telemetry`] record into a [`TelemetryState`]
//! - Publishing the state through a `tokio::sync::watch` channel
//!
//! Observers (a UI, a logger) hold a [`watch::Receiver`] and see every state
//! change; slow observers only ever see the newest state.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::msp::protocol::{Altitude, Attitude, GpsData, RawImu, RcChannels, Status, Telemetry};

/// Latest value of every telemetry kind
///
/// RC channels start at their defaults (centered, throttle and aux1 low) so a
/// consumer never sees an empty channel set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryState {
    pub attitude: Option<Attitude>,
    pub altitude: Option<Altitude>,
    pub gps: Option<GpsData>,
    pub status: Option<Status>,
    pub rc: RcChannels,
    pub imu: Option<RawImu>,
    /// Records applied since start
    pub frames: u64,
    /// Unix epoch milliseconds of the last applied record
    pub updated_at: Option<i64>,
}

impl TelemetryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored value for the record's kind
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::msp::protocol::{Altitude, Telemetry};
    /// use skynet_bridge::telemetry::TelemetryState;
    ///
    /// let mut state = TelemetryState::new();
    /// state.apply(Telemetry::Altitude(Altitude { altitude_cm: 250, velocity_cms: -4 }));
    /// assert_eq!(state.altitude.unwrap().altitude_cm, 250);
    /// assert_eq!(state.frames, 1);
    /// ```
    pub fn apply(&mut self, telemetry: Telemetry) {
        match telemetry {
            Telemetry::Attitude(v) => self.attitude = Some(v),
            Telemetry::Altitude(v) => self.altitude = Some(v),
            Telemetry::Gps(v) => self.gps = Some(v),
            Telemetry::Status(v) => self.status = Some(v),
            Telemetry::Rc(v) => self.rc = v,
            Telemetry::RawImu(v) => self.imu = Some(v),
        }
        self.frames += 1;
        self.updated_at = Some(Utc::now().timestamp_millis());
    }

    /// Armed flag from the last status frame, false before the first one
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.status.map(|s| s.is_armed()).unwrap_or(false)
    }
}

/// Publisher side of the telemetry store
#[derive(Debug)]
pub struct TelemetryHub {
    tx: watch::Sender<TelemetryState>,
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryHub {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TelemetryState::default());
        Self { tx }
    }

    /// Fold `telemetry` into the state and notify every subscriber
    ///
    /// Publishing with no subscribers still updates the state.
    pub fn publish(&self, telemetry: Telemetry) {
        self.tx.send_modify(|state| state.apply(telemetry));
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TelemetryState> {
        self.tx.subscribe()
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> TelemetryState {
        self.tx.borrow().clone()
    }
}
