//! # MSP Protocol Constants and Types
//!
//! Core definitions for the MSP v1 telemetry frames the flight controller
//! pushes over the datagram link.
//!
//! Frame structure: magic(3) + length(1) + command(1) + payload(N) + checksum(1)

use serde::Serialize;
use std::fmt;

/// MSP v1 response header: `$M>`
pub const MSP_MAGIC: [u8; 3] = [0x24, 0x4D, 0x3E];

/// Bytes surrounding the payload: magic(3) + length(1) + command(1) + checksum(1)
pub const MSP_FRAME_OVERHEAD: usize = 6;

/// Offset of the first payload byte
pub const MSP_PAYLOAD_OFFSET: usize = 5;

/// Flight status, battery, armed state
pub const MSP_STATUS: u8 = 101;
/// Accelerometer, gyro, magnetometer
pub const MSP_RAW_IMU: u8 = 102;
/// Motor outputs (recognized but not decoded)
pub const MSP_MOTOR: u8 = 104;
/// RC channel values
pub const MSP_RC: u8 = 105;
/// GPS fix and position
pub const MSP_RAW_GPS: u8 = 106;
/// Roll, pitch, yaw
pub const MSP_ATTITUDE: u8 = 108;
/// Altitude and climb rate
pub const MSP_ALTITUDE: u8 = 109;

/// Minimum payload sizes per command
pub const ATTITUDE_PAYLOAD_SIZE: usize = 6;
pub const ALTITUDE_PAYLOAD_SIZE: usize = 6;
pub const GPS_PAYLOAD_SIZE: usize = 16;
pub const STATUS_PAYLOAD_SIZE: usize = 11;
pub const RC_PAYLOAD_SIZE: usize = RC_CHANNEL_COUNT * 2;
pub const RAW_IMU_PAYLOAD_SIZE: usize = 18;

/// Number of RC channels reported by MSP_RC
pub const RC_CHANNEL_COUNT: usize = 8;

/// RC channel indices
pub mod channels {
    pub const ROLL: usize = 0;
    pub const PITCH: usize = 1;
    pub const THROTTLE: usize = 2;
    pub const YAW: usize = 3;
    pub const AUX1: usize = 4;
}

/// Default PWM for centered channels
pub const RC_DEFAULT_CENTER: u16 = 1500;
/// Default PWM for throttle and AUX1 (low / off)
pub const RC_DEFAULT_LOW: u16 = 1000;

/// Flight-mode bit reporting the armed state
pub const FLIGHT_MODE_ARMED_BIT: u32 = 0x01;

/// Flight mode reported in the status frame.
///
/// The firmware can have several mode bits set at once; only the
/// highest-priority one is reported (see [`FlightMode::from_bits`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightMode {
    Angle,
    Horizon,
    NavAltHold,
    NavPosHold,
    NavRth,
    NavWp,
    HeadFree,
    Acro,
}

impl FlightMode {
    /// Mode bits in priority order.
    const PRIORITY: [(u32, FlightMode); 7] = [
        (0x02, FlightMode::Angle),
        (0x04, FlightMode::Horizon),
        (0x08, FlightMode::NavAltHold),
        (0x10, FlightMode::NavPosHold),
        (0x20, FlightMode::NavRth),
        (0x40, FlightMode::NavWp),
        (0x80, FlightMode::HeadFree),
    ];

    /// Decodes the flight-mode bitmask: first matching bit wins, ACRO otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::msp::protocol::FlightMode;
    ///
    /// assert_eq!(FlightMode::from_bits(0b0000_0110), FlightMode::Angle);
    /// assert_eq!(FlightMode::from_bits(0x01), FlightMode::Acro);
    /// ```
    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        Self::PRIORITY
            .iter()
            .find(|(mask, _)| bits & mask != 0)
            .map(|&(_, mode)| mode)
            .unwrap_or(FlightMode::Acro)
    }

    /// Name as displayed by the firmware configurator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightMode::Angle => "ANGLE",
            FlightMode::Horizon => "HORIZON",
            FlightMode::NavAltHold => "NAV_ALTHOLD",
            FlightMode::NavPosHold => "NAV_POSHOLD",
            FlightMode::NavRth => "NAV_RTH",
            FlightMode::NavWp => "NAV_WP",
            FlightMode::HeadFree => "HEADFREE",
            FlightMode::Acro => "ACRO",
        }
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Barometric / estimated altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Altitude {
    /// Altitude in centimeters
    pub altitude_cm: i32,
    /// Vertical velocity in cm/s
    pub velocity_cms: i16,
}

/// GPS fix and position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsData {
    pub fix: bool,
    pub satellites: u8,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude as reported (meters)
    pub altitude: u16,
    /// Ground speed as reported (cm/s)
    pub speed: u16,
    /// Course over ground in degrees
    pub course: f32,
}

/// Flight controller status
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Status {
    /// Main loop cycle time in microseconds
    pub cycle_time: u16,
    pub i2c_errors: u16,
    /// Sensor presence bitmask (not used downstream)
    pub sensors: u16,
    /// Raw flight-mode bitmask
    pub flight_mode_bits: u32,
    /// Battery voltage in volts
    pub battery_voltage: f32,
}

impl Status {
    /// Armed flag (bit 0 of the flight-mode bitmask)
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.flight_mode_bits & FLIGHT_MODE_ARMED_BIT != 0
    }

    /// Highest-priority active flight mode
    #[must_use]
    pub fn flight_mode(&self) -> FlightMode {
        FlightMode::from_bits(self.flight_mode_bits)
    }
}

/// RC channel values as seen by the flight controller (PWM, 1000-2000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RcChannels {
    pub values: [u16; RC_CHANNEL_COUNT],
}

impl Default for RcChannels {
    fn default() -> Self {
        let mut values = [RC_DEFAULT_CENTER; RC_CHANNEL_COUNT];
        values[channels::THROTTLE] = RC_DEFAULT_LOW;
        values[channels::AUX1] = RC_DEFAULT_LOW;
        Self { values }
    }
}

impl RcChannels {
    /// Channel value by index, falling back to the channel's default when absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::msp::protocol::{RcChannels, channels};
    ///
    /// let rc = RcChannels::default();
    /// assert_eq!(rc.channel(channels::ROLL), 1500);
    /// assert_eq!(rc.channel(channels::THROTTLE), 1000);
    /// assert_eq!(rc.channel(12), 1500);
    /// ```
    #[must_use]
    pub fn channel(&self, index: usize) -> u16 {
        match self.values.get(index) {
            Some(&value) => value,
            None if index == channels::THROTTLE || index == channels::AUX1 => RC_DEFAULT_LOW,
            None => RC_DEFAULT_CENTER,
        }
    }

    pub fn roll(&self) -> u16 {
        self.channel(channels::ROLL)
    }

    pub fn pitch(&self) -> u16 {
        self.channel(channels::PITCH)
    }

    pub fn throttle(&self) -> u16 {
        self.channel(channels::THROTTLE)
    }

    pub fn yaw(&self) -> u16 {
        self.channel(channels::YAW)
    }

    pub fn aux1(&self) -> u16 {
        self.channel(channels::AUX1)
    }
}

/// Raw IMU readings in sensor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawImu {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub mag: [i16; 3],
}

/// One decoded telemetry record; exactly one variant per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Telemetry {
    Attitude(Attitude),
    Altitude(Altitude),
    Gps(GpsData),
    Status(Status),
    Rc(RcChannels),
    RawImu(RawImu),
}

/// A framed MSP message borrowed from a receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MspFrame<'a> {
    /// Command identifier
    pub command: u8,

    /// Payload bytes (length given by the frame header)
    pub payload: &'a [u8],
}

impl<'a> MspFrame<'a> {
    pub fn new(command: u8, payload: &'a [u8]) -> Self {
        Self { command, payload }
    }

    /// MSP v1 XOR checksum over length, command and payload.
    ///
    /// The decoder never checks it; it exists so that simulators and tests
    /// produce frames the real firmware would accept.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.payload
            .iter()
            .fold(self.payload.len() as u8 ^ self.command, |acc, &b| acc ^ b)
    }

    /// Serializes the frame. Payloads longer than 255 bytes are truncated.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = &self.payload[..self.payload.len().min(u8::MAX as usize)];
        let frame = MspFrame::new(self.command, payload);

        let mut bytes = Vec::with_capacity(MSP_FRAME_OVERHEAD + payload.len());
        bytes.extend_from_slice(&MSP_MAGIC);
        bytes.push(payload.len() as u8);
        bytes.push(self.command);
        bytes.extend_from_slice(payload);
        bytes.push(frame.checksum());
        bytes
    }
}
