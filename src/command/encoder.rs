//! # Safe Command Encoder
//!
//! Turns a pilot intent (kind, value, safe mode) into a [`Command`] whose value
//! is inside the active safety envelope.
//!
//! Encoding is total: out-of-range input is clamped, never rejected.
//!
//! | kind | safe | unsafe |
//! |------|------|--------|
//! | hover / safe_hover (PWM) | 1200-1800 | 1000-2000 |
//! | throttle_percentage | 20-80 | 0-100 |
//! | forward … yaw_right | ≤ 60 | ≤ 80 |
//!
//! `stop` is always value 0 with safe mode off: the safe-mode throttle floor
//! keeps rotors spinning, which an emergency stop must never do.

use chrono::Utc;

use super::protocol::*;

/// Encode a command stamped with the current time
///
/// # Arguments
///
/// * `kind` - Command kind
/// * `value` - Requested value (PWM, altitude in cm, percent or intensity)
/// * `safe_mode` - Apply the narrow safe-mode envelope
///
/// # Examples
///
/// ```
/// use skynet_bridge::command::encoder::encode;
/// use skynet_bridge::command::protocol::CommandKind;
///
/// let cmd = encode(CommandKind::Hover, 50, true); // 50 cm
/// assert_eq!(cmd.value, 1550);
///
/// let stop = encode(CommandKind::Stop, 1999, true);
/// assert_eq!(stop.value, 0);
/// assert!(!stop.safe_mode);
/// ```
pub fn encode(kind: CommandKind, value: i32, safe_mode: bool) -> Command {
    encode_at(kind, value, safe_mode, Utc::now().timestamp_millis())
}

/// Encode a command with an explicit timestamp (Unix epoch milliseconds)
///
/// Deterministic counterpart of [`encode`].
pub fn encode_at(kind: CommandKind, value: i32, safe_mode: bool, timestamp: i64) -> Command {
    let envelope = Envelope::for_mode(safe_mode);

    let (value, safe_mode) = match kind {
        CommandKind::Arm => (1, safe_mode),
        CommandKind::Disarm => (0, safe_mode),
        // Spin down from the safe floor instead of cutting the motors
        CommandKind::SafeDisarm => (THROTTLE_SAFE_MIN, safe_mode),
        CommandKind::Stop => (0, false),
        CommandKind::Hover | CommandKind::SafeHover => (hover_throttle(value, envelope), safe_mode),
        CommandKind::ThrottlePercentage => (
            value.clamp(envelope.percent_min, envelope.percent_max),
            safe_mode,
        ),
        CommandKind::Forward
        | CommandKind::Backward
        | CommandKind::Left
        | CommandKind::Right
        | CommandKind::YawLeft
        | CommandKind::YawRight => (value.min(envelope.movement_max), safe_mode),
        CommandKind::Restart | CommandKind::Test => (value, safe_mode),
    };

    Command {
        kind,
        value,
        safe_mode,
        timestamp,
    }
}

/// Hover throttle for a value that is either a PWM value or an altitude
///
/// Values in 1000..=2000 are taken as PWM; anything else is an altitude in
/// centimeters converted with `1450 + 2 × cm`.
#[must_use]
pub fn hover_throttle(value: i32, envelope: &Envelope) -> i32 {
    let pwm = if (THROTTLE_MIN..=THROTTLE_MAX).contains(&value) {
        value
    } else {
        THROTTLE_HOVER_BASE.saturating_add(value.saturating_mul(THROTTLE_PER_CM))
    };
    envelope.clamp_throttle(pwm)
}
