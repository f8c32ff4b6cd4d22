//! # Controller Sample
//!
//! One normalized snapshot of the gamepad, as consumed by the pipeline.
//!
//! | Field | Range | Flight meaning |
//! |-------|-------|----------------|
//! | `left_stick` | -1.0..=1.0 | Movement (x: left/right, y: backward/forward) |
//! | `right_stick.x` | -1.0..=1.0 | Yaw |
//! | `right_stick.y` | -1.0..=1.0 | Throttle |
//! | `left_trigger` | 0.0..=1.0 | Throttle trim down |
//! | `right_trigger` | 0.0..=1.0 | Throttle trim up |
//!
//! Stick `y` is positive when the stick is pushed away from the pilot.

use std::collections::HashMap;
use std::fmt;

/// Logical buttons the pipeline reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Toggles arm / disarm.
    Arm,
    /// Immediate motor stop; also disarms.
    EmergencyStop,
    /// Toggles the safe-mode envelope.
    SafeMode,
    /// Hover at the preset altitude.
    Hover,
    /// Toggles whether the pipeline sends anything at all.
    Enable,
}

impl Button {
    /// Every logical button
    pub const ALL: [Button; 5] = [
        Button::Arm,
        Button::EmergencyStop,
        Button::SafeMode,
        Button::Hover,
        Button::Enable,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Button::Arm => "arm",
            Button::EmergencyStop => "emergency_stop",
            Button::SafeMode => "safe_mode",
            Button::Hover => "hover",
            Button::Enable => "enable",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pressed state per logical button; absent means released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonStates(HashMap<Button, bool>);

impl ButtonStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `button` is currently held
    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.0.get(&button).copied().unwrap_or(false)
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        self.0.insert(button, pressed);
    }

    /// Builder form of [`ButtonStates::set`]
    #[must_use]
    pub fn with(mut self, button: Button, pressed: bool) -> Self {
        self.set(button, pressed);
        self
    }

    /// Buttons that are pressed now but were released in `previous`
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::controller::sample::{Button, ButtonStates};
    ///
    /// let before = ButtonStates::new().with(Button::Arm, true);
    /// let now = ButtonStates::new()
    ///     .with(Button::Arm, true)
    ///     .with(Button::Hover, true);
    ///
    /// assert_eq!(now.rising_edges(&before), vec![Button::Hover]);
    /// ```
    #[must_use]
    pub fn rising_edges(&self, previous: &ButtonStates) -> Vec<Button> {
        Button::ALL
            .into_iter()
            .filter(|b| self.is_pressed(*b) && !previous.is_pressed(*b))
            .collect()
    }
}

/// Two-axis analog stick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stick {
    pub x: f32,
    pub y: f32,
}

impl Stick {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both axes are exactly zero
    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Normalized controller snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSample {
    pub left_stick: Stick,
    pub right_stick: Stick,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub buttons: ButtonStates,
}

impl ControllerSample {
    /// Centered sticks, released triggers and buttons
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest per-axis absolute difference to `other` across all six axes
    #[must_use]
    pub fn max_axis_delta(&self, other: &ControllerSample) -> f32 {
        [
            self.left_stick.x - other.left_stick.x,
            self.left_stick.y - other.left_stick.y,
            self.right_stick.x - other.right_stick.x,
            self.right_stick.y - other.right_stick.y,
            self.left_trigger - other.left_trigger,
            self.right_trigger - other.right_trigger,
        ]
        .into_iter()
        .fold(0.0_f32, |acc, d| acc.max(d.abs()))
    }
}
