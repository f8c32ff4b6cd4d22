//! # Flight Command Types
//!
//! Command kinds, the outbound wire message and the numeric safety envelopes.
//!
//! Wire format (one UDP datagram per command):
//!
//! ```text
//! {"command":"hover","value":1550,"safeMode":true,"timestamp":1718000000000}
//! ```
//!
//! The legacy motor self-test is the bare string `test`, not JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Absolute minimum throttle (motors stopped)
pub const THROTTLE_MIN: i32 = 1000;
/// Safe-mode minimum throttle; motors keep spinning
pub const THROTTLE_SAFE_MIN: i32 = 1200;
/// Safe-mode maximum throttle
pub const THROTTLE_SAFE_MAX: i32 = 1800;
/// Absolute maximum throttle
pub const THROTTLE_MAX: i32 = 2000;

/// Throttle at which the craft holds altitude
pub const THROTTLE_HOVER_BASE: i32 = 1450;
/// Throttle added per centimeter of requested hover altitude
pub const THROTTLE_PER_CM: i32 = 2;

pub const THROTTLE_PERCENT_MIN: i32 = 0;
pub const THROTTLE_PERCENT_SAFE_MIN: i32 = 20;
pub const THROTTLE_PERCENT_SAFE_MAX: i32 = 80;
pub const THROTTLE_PERCENT_MAX: i32 = 100;

/// Movement intensity ceiling in safe mode (percent)
pub const MOVEMENT_MAX_SAFE: i32 = 60;
/// Movement intensity ceiling outside safe mode (percent)
pub const MOVEMENT_MAX_UNSAFE: i32 = 80;

/// Accepted hover altitude for operator intents (cm)
pub const HOVER_ALTITUDE_RANGE: std::ops::RangeInclusive<i32> = 10..=300;
/// Accepted movement intensity for operator intents (percent)
pub const MOVEMENT_INTENSITY_RANGE: std::ops::RangeInclusive<i32> = 10..=100;

/// Named hover setting offered to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverPreset {
    pub name: &'static str,
    pub altitude_cm: i32,
    /// PWM sent for this preset
    pub throttle: i32,
}

/// Hover presets, lowest first
pub const HOVER_PRESETS: [HoverPreset; 5] = [
    HoverPreset { name: "Safe Low (30cm)", altitude_cm: 30, throttle: 1250 },
    HoverPreset { name: "Low (30cm)", altitude_cm: 30, throttle: 1300 },
    HoverPreset { name: "Medium (50cm)", altitude_cm: 50, throttle: 1450 },
    HoverPreset { name: "High (100cm)", altitude_cm: 100, throttle: 1600 },
    HoverPreset { name: "Very High (150cm)", altitude_cm: 150, throttle: 1750 },
];

/// Named movement intensity offered to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementIntensity {
    pub name: &'static str,
    /// Percent
    pub value: i32,
}

/// Movement intensities, gentlest first
pub const MOVEMENT_INTENSITIES: [MovementIntensity; 5] = [
    MovementIntensity { name: "Safe (15%)", value: 15 },
    MovementIntensity { name: "Gentle (20%)", value: 20 },
    MovementIntensity { name: "Normal (30%)", value: 30 },
    MovementIntensity { name: "Aggressive (50%)", value: 50 },
    MovementIntensity { name: "Maximum (80%)", value: 80 },
];

/// RC center value used when describing stick effects
const RC_CENTER: i32 = 1500;
/// PWM offset per percent of movement intensity
const RC_PER_PERCENT: i32 = 3;

/// Numeric limits applied to outgoing commands for one safety mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub throttle_min: i32,
    pub throttle_max: i32,
    pub percent_min: i32,
    pub percent_max: i32,
    pub movement_max: i32,
}

impl Envelope {
    /// Envelope enforced while safe mode is on
    pub const SAFE: Envelope = Envelope {
        throttle_min: THROTTLE_SAFE_MIN,
        throttle_max: THROTTLE_SAFE_MAX,
        percent_min: THROTTLE_PERCENT_SAFE_MIN,
        percent_max: THROTTLE_PERCENT_SAFE_MAX,
        movement_max: MOVEMENT_MAX_SAFE,
    };

    /// Envelope enforced while safe mode is off
    pub const FULL: Envelope = Envelope {
        throttle_min: THROTTLE_MIN,
        throttle_max: THROTTLE_MAX,
        percent_min: THROTTLE_PERCENT_MIN,
        percent_max: THROTTLE_PERCENT_MAX,
        movement_max: MOVEMENT_MAX_UNSAFE,
    };

    #[must_use]
    pub fn for_mode(safe_mode: bool) -> &'static Envelope {
        if safe_mode {
            &Self::SAFE
        } else {
            &Self::FULL
        }
    }

    /// Clamp a throttle PWM value into this envelope
    #[must_use]
    pub fn clamp_throttle(&self, pwm: i32) -> i32 {
        pwm.clamp(self.throttle_min, self.throttle_max)
    }
}

/// Kind of flight command understood by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Arm,
    Disarm,
    SafeDisarm,
    /// Emergency stop
    Stop,
    Hover,
    SafeHover,
    ThrottlePercentage,
    Forward,
    Backward,
    Left,
    Right,
    YawLeft,
    YawRight,
    Restart,
    /// Legacy motor self-test, sent as a bare string
    Test,
}

impl CommandKind {
    pub const ALL: [CommandKind; 15] = [
        CommandKind::Arm,
        CommandKind::Disarm,
        CommandKind::SafeDisarm,
        CommandKind::Stop,
        CommandKind::Hover,
        CommandKind::SafeHover,
        CommandKind::ThrottlePercentage,
        CommandKind::Forward,
        CommandKind::Backward,
        CommandKind::Left,
        CommandKind::Right,
        CommandKind::YawLeft,
        CommandKind::YawRight,
        CommandKind::Restart,
        CommandKind::Test,
    ];

    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Arm => "arm",
            CommandKind::Disarm => "disarm",
            CommandKind::SafeDisarm => "safe_disarm",
            CommandKind::Stop => "stop",
            CommandKind::Hover => "hover",
            CommandKind::SafeHover => "safe_hover",
            CommandKind::ThrottlePercentage => "throttle_percentage",
            CommandKind::Forward => "forward",
            CommandKind::Backward => "backward",
            CommandKind::Left => "left",
            CommandKind::Right => "right",
            CommandKind::YawLeft => "yaw_left",
            CommandKind::YawRight => "yaw_right",
            CommandKind::Restart => "restart",
            CommandKind::Test => "test",
        }
    }

    /// True for the six stick-intensity commands
    #[must_use]
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            CommandKind::Forward
                | CommandKind::Backward
                | CommandKind::Left
                | CommandKind::Right
                | CommandKind::YawLeft
                | CommandKind::YawRight
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = BridgeError;

    /// Parse a wire name such as `yaw_left`
    ///
    /// # Errors
    ///
    /// Returns `InvalidCommand` for any name the firmware does not know
    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BridgeError::InvalidCommand(format!("Unknown command: {}", s)))
    }
}

/// An encoded command, ready for the wire
///
/// Build these with [`encode`](super::encoder::encode) so the safety envelope
/// is always applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    pub kind: CommandKind,

    pub value: i32,

    /// Safety mode actually applied (always false for `stop`)
    #[serde(rename = "safeMode")]
    pub safe_mode: bool,

    /// Generation time, Unix epoch milliseconds
    pub timestamp: i64,
}

impl Command {
    /// Render the datagram text
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::command::encoder::encode_at;
    /// use skynet_bridge::command::protocol::CommandKind;
    ///
    /// let cmd = encode_at(CommandKind::Forward, 30, true, 1_700_000_000_000);
    /// assert_eq!(
    ///     cmd.to_wire()?,
    ///     r#"{"command":"forward","value":30,"safeMode":true,"timestamp":1700000000000}"#
    /// );
    ///
    /// let test = encode_at(CommandKind::Test, 0, true, 0);
    /// assert_eq!(test.to_wire()?, "test");
    /// # Ok::<(), skynet_bridge::error::BridgeError>(())
    /// ```
    pub fn to_wire(&self) -> Result<String> {
        match self.kind {
            CommandKind::Test => Ok(CommandKind::Test.as_str().to_string()),
            _ => Ok(serde_json::to_string(self)?),
        }
    }

    /// Human description of the expected RC-channel effect on the firmware
    pub fn describe(&self) -> String {
        let offset = self.value.saturating_mul(RC_PER_PERCENT);
        match self.kind {
            CommandKind::Arm => "AUX1 2000 (armed)".to_string(),
            CommandKind::Disarm => "AUX1 1000 (disarmed), throttle cut".to_string(),
            CommandKind::SafeDisarm => format!("throttle spin-down from {}", self.value),
            CommandKind::Stop => "throttle cut and disarm (emergency)".to_string(),
            CommandKind::Hover | CommandKind::SafeHover => format!("throttle {}", self.value),
            CommandKind::ThrottlePercentage => format!(
                "throttle {} ({}% power)",
                THROTTLE_MIN.saturating_add(self.value.saturating_mul(10)),
                self.value
            ),
            CommandKind::Forward => format!("pitch {}", RC_CENTER + offset),
            CommandKind::Backward => format!("pitch {}", RC_CENTER - offset),
            CommandKind::Left => format!("roll {}", RC_CENTER - offset),
            CommandKind::Right => format!("roll {}", RC_CENTER + offset),
            CommandKind::YawLeft => format!("yaw {}", RC_CENTER - offset),
            CommandKind::YawRight => format!("yaw {}", RC_CENTER + offset),
            CommandKind::Restart => "flight controller restart".to_string(),
            CommandKind::Test => "motor self-test".to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.kind,
            self.value,
            if self.safe_mode { " [safe]" } else { "" }
        )
    }
}

/// Check an operator intent before it is encoded
///
/// Advisory only: [`encode`](super::encoder::encode) accepts any value and
/// clamps it. Only `hover` is checked as an altitude; `safe_hover` and the
/// remaining kinds accept anything.
///
/// # Errors
///
/// Returns `InvalidCommand` when the value is outside the accepted range:
/// hover 10-300 cm, throttle percentage 0-100, movement 10-100.
///
/// # Examples
///
/// ```
/// use skynet_bridge::command::protocol::{validate, CommandKind};
///
/// assert!(validate(CommandKind::Hover, 50).is_ok());
/// assert!(validate(CommandKind::Forward, 5).is_err());
/// ```
pub fn validate(kind: CommandKind, value: i32) -> Result<()> {
    let (range, what) = match kind {
        CommandKind::Hover => (HOVER_ALTITUDE_RANGE, "Hover altitude must be between 10-300 cm"),
        CommandKind::ThrottlePercentage => (
            THROTTLE_PERCENT_MIN..=THROTTLE_PERCENT_MAX,
            "Throttle percentage must be between 0-100%",
        ),
        k if k.is_movement() => (
            MOVEMENT_INTENSITY_RANGE,
            "Movement intensity must be between 10-100%",
        ),
        _ => return Ok(()),
    };

    if range.contains(&value) {
        Ok(())
    } else {
        Err(BridgeError::InvalidCommand(format!("{} (got {})", what, value)))
    }
}
