//! # Controller Pipeline
//!
//! Turns a stream of [`ControllerSample`]s into rate-limited flight commands.
//!
//! Each [`ControllerPipeline::tick`] runs, in order:
//!
//! 1. Button edges (press only): arm toggle, emergency stop, safe-mode toggle,
//!    hover preset, enable toggle. Never rate limited.
//! 2. Shaping: deadzone and response curve on the four stick axes, triggers
//!    clamped to 0..=1.
//! 3. Smoothing against the previous tick's filtered value. The throttle
//!    axis is not smoothed.
//! 4. Change detection against the last emitted sample.
//! 5. Analog mapping (throttle, movement, yaw), only while armed and only on
//!    a significant change or once the minimum interval has passed.
//!
//! A missing sample means the controller is gone: the pipeline disables
//! itself and forgets all history.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::command::encoder::encode;
use crate::command::protocol::{Command, CommandKind, Envelope};
use crate::config::Config;

use super::sample::{Button, ButtonStates, ControllerSample, Stick};
use super::shaping::{smooth, Shaper, STICK_SMOOTHING, TRIGGER_SMOOTHING};
use super::stats::PipelineCounters;

/// Triggers below this are treated as released for throttle mapping
pub const TRIGGER_ACTIVE_THRESHOLD: f32 = 0.05;

/// PWM offset of a fully pressed trigger
pub const TRIGGER_THROTTLE_SPAN: f32 = 100.0;

/// Default minimum interval between analog emissions
pub const DEFAULT_MIN_COMMAND_INTERVAL: Duration = Duration::from_millis(33);

/// Default per-axis change that counts as significant
pub const DEFAULT_CHANGE_THRESHOLD: f32 = 0.015;

/// Default altitude for the hover button
pub const DEFAULT_HOVER_PRESET_CM: i32 = 50;

/// Tunables for [`ControllerPipeline`]
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub shaper: Shaper,
    pub stick_smoothing: f32,
    pub trigger_smoothing: f32,
    pub change_threshold: f32,
    pub min_command_interval: Duration,
    pub hover_preset_cm: i32,
    /// Safe mode at startup
    pub safe_mode: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            shaper: Shaper::default(),
            stick_smoothing: STICK_SMOOTHING,
            trigger_smoothing: TRIGGER_SMOOTHING,
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
            min_command_interval: DEFAULT_MIN_COMMAND_INTERVAL,
            hover_preset_cm: DEFAULT_HOVER_PRESET_CM,
            safe_mode: true,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            shaper: Shaper::new(config.controller.deadzone, config.controller.curve_exponent),
            stick_smoothing: config.controller.stick_smoothing,
            trigger_smoothing: config.controller.trigger_smoothing,
            change_threshold: config.pipeline.change_threshold,
            min_command_interval: config.pipeline.min_command_interval(),
            hover_preset_cm: config.safety.hover_preset_cm,
            safe_mode: config.safety.safe_mode_default,
        }
    }
}

/// Stateful sample-to-command pipeline
///
/// Owns the previous filtered sample, the last emitted sample and the
/// previous button states. Starts disabled and disarmed.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use skynet_bridge::controller::pipeline::{ControllerPipeline, PipelineOptions};
/// use skynet_bridge::controller::sample::{Button, ControllerSample};
/// use skynet_bridge::command::protocol::CommandKind;
///
/// let mut pipeline = ControllerPipeline::new(PipelineOptions::default());
/// pipeline.enable();
///
/// let t0 = Instant::now();
/// let idle = ControllerSample::default();
/// let mut arm = ControllerSample::default();
/// arm.buttons.set(Button::Arm, true);
///
/// assert!(pipeline.tick(Some(&idle), t0).is_empty());
/// let commands = pipeline.tick(Some(&arm), t0 + Duration::from_millis(16));
/// assert_eq!(commands[0].kind, CommandKind::Arm);
/// assert!(pipeline.is_armed());
/// ```
#[derive(Debug)]
pub struct ControllerPipeline {
    options: PipelineOptions,
    enabled: bool,
    armed: bool,
    safe_mode: bool,
    /// Previous tick's filtered axes
    filtered: ControllerSample,
    /// Filtered axes at the last analog emission
    last_emitted: Option<ControllerSample>,
    last_emit_at: Option<Instant>,
    /// None until the first sample after start or a disconnect
    prev_buttons: Option<ButtonStates>,
    counters: Arc<PipelineCounters>,
}

impl ControllerPipeline {
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        let safe_mode = options.safe_mode;
        Self {
            options,
            enabled: false,
            armed: false,
            safe_mode,
            filtered: ControllerSample::default(),
            last_emitted: None,
            last_emit_at: None,
            prev_buttons: None,
            counters: Arc::new(PipelineCounters::new()),
        }
    }

    /// Shared handle to the pipeline's counters
    #[must_use]
    pub fn counters(&self) -> Arc<PipelineCounters> {
        Arc::clone(&self.counters)
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            info!("Controller input enabled");
        }
        self.enabled = true;
    }

    /// Stop emitting commands and drop filter history
    pub fn disable(&mut self) {
        if self.enabled {
            info!("Controller input disabled");
        }
        self.enabled = false;
        self.reset_filters();
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn set_safe_mode(&mut self, safe_mode: bool) {
        if self.safe_mode != safe_mode {
            info!("Safe mode {}", if safe_mode { "on" } else { "off" });
        }
        self.safe_mode = safe_mode;
    }

    /// Armed as far as this pipeline knows (last arm/disarm/stop it sent)
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Process one sample and return the commands to send, in order
    ///
    /// # Arguments
    ///
    /// * `sample` - Current controller state, or `None` if the controller is absent
    /// * `now` - Monotonic time of this tick
    ///
    /// # Returns
    ///
    /// Button commands first, then throttle, movement and yaw. Empty when
    /// disabled, disconnected, or nothing is due.
    pub fn tick(&mut self, sample: Option<&ControllerSample>, now: Instant) -> Vec<Command> {
        let Some(sample) = sample else {
            if self.enabled || self.prev_buttons.is_some() {
                warn!("Controller lost, disabling input");
            }
            self.enabled = false;
            self.reset_filters();
            self.prev_buttons = None;
            return Vec::new();
        };

        self.counters.record_sample();

        let edges = match &self.prev_buttons {
            Some(previous) => sample.buttons.rising_edges(previous),
            None => Vec::new(),
        };
        self.prev_buttons = Some(sample.buttons.clone());

        let mut commands = Vec::new();

        if !self.enabled {
            if edges.contains(&Button::Enable) {
                self.enable();
            }
            return commands;
        }

        for button in edges {
            self.handle_button(button, &mut commands);
            if !self.enabled {
                self.counters.record_commands(commands.len());
                return commands;
            }
        }

        let filtered = self.filter(sample);
        self.filtered = filtered.clone();

        if self.armed && self.analog_due(&filtered, now) {
            let before = commands.len();
            self.map_analog(&filtered, &mut commands);
            if commands.len() > before {
                self.last_emit_at = Some(now);
                self.last_emitted = Some(filtered);
            }
        }

        if !commands.is_empty() {
            trace!("Tick emitted {} command(s)", commands.len());
        }
        self.counters.record_commands(commands.len());
        commands
    }

    fn handle_button(&mut self, button: Button, commands: &mut Vec<Command>) {
        debug!("Button pressed: {}", button);
        match button {
            Button::Arm => {
                let kind = if self.armed {
                    CommandKind::Disarm
                } else {
                    CommandKind::Arm
                };
                self.armed = !self.armed;
                info!("{}", if self.armed { "Arming" } else { "Disarming" });
                commands.push(encode(kind, 0, self.safe_mode));
            }
            Button::EmergencyStop => {
                warn!("Emergency stop");
                self.armed = false;
                commands.push(encode(CommandKind::Stop, 0, self.safe_mode));
            }
            Button::SafeMode => {
                let toggled = !self.safe_mode;
                self.set_safe_mode(toggled);
            }
            Button::Hover => {
                commands.push(encode(
                    CommandKind::Hover,
                    self.options.hover_preset_cm,
                    self.safe_mode,
                ));
            }
            Button::Enable => self.disable(),
        }
    }

    /// Shape and smooth the analog axes; buttons are not carried
    fn filter(&self, sample: &ControllerSample) -> ControllerSample {
        let shaper = &self.options.shaper;
        let k_stick = self.options.stick_smoothing;
        let k_trigger = self.options.trigger_smoothing;
        let prev = &self.filtered;

        ControllerSample {
            left_stick: Stick {
                x: smooth(prev.left_stick.x, shaper.apply(sample.left_stick.x), k_stick),
                y: smooth(prev.left_stick.y, shaper.apply(sample.left_stick.y), k_stick),
            },
            right_stick: Stick {
                x: smooth(prev.right_stick.x, shaper.apply(sample.right_stick.x), k_stick),
                y: shaper.apply(sample.right_stick.y),
            },
            left_trigger: smooth(
                prev.left_trigger,
                sample.left_trigger.clamp(0.0, 1.0),
                k_trigger,
            ),
            right_trigger: smooth(
                prev.right_trigger,
                sample.right_trigger.clamp(0.0, 1.0),
                k_trigger,
            ),
            buttons: Default::default(),
        }
    }

    fn analog_due(&self, filtered: &ControllerSample, now: Instant) -> bool {
        let (Some(last), Some(at)) = (&self.last_emitted, self.last_emit_at) else {
            return true;
        };
        filtered.max_axis_delta(last) > self.options.change_threshold
            || now.saturating_duration_since(at) >= self.options.min_command_interval
    }

    fn map_analog(&self, filtered: &ControllerSample, commands: &mut Vec<Command>) {
        let envelope = Envelope::for_mode(self.safe_mode);

        if filtered.right_stick.y != 0.0
            || filtered.left_trigger > TRIGGER_ACTIVE_THRESHOLD
            || filtered.right_trigger > TRIGGER_ACTIVE_THRESHOLD
        {
            let kind = if self.safe_mode {
                CommandKind::SafeHover
            } else {
                CommandKind::Hover
            };
            let pwm = stick_to_throttle(
                filtered.right_stick.y,
                filtered.left_trigger,
                filtered.right_trigger,
                envelope,
            );
            commands.push(encode(kind, pwm, self.safe_mode));
        }

        let Stick { x, y } = filtered.left_stick;
        if x != 0.0 || y != 0.0 {
            let (kind, v) = if y.abs() >= x.abs() {
                let kind = if y > 0.0 {
                    CommandKind::Forward
                } else {
                    CommandKind::Backward
                };
                (kind, y)
            } else {
                let kind = if x > 0.0 {
                    CommandKind::Right
                } else {
                    CommandKind::Left
                };
                (kind, x)
            };
            commands.push(encode(kind, intensity(v, envelope), self.safe_mode));
        }

        let yaw = filtered.right_stick.x;
        if yaw != 0.0 {
            let kind = if yaw > 0.0 {
                CommandKind::YawRight
            } else {
                CommandKind::YawLeft
            };
            commands.push(encode(kind, intensity(yaw, envelope), self.safe_mode));
        }
    }

    fn reset_filters(&mut self) {
        self.filtered = ControllerSample::default();
        self.last_emitted = None;
        self.last_emit_at = None;
    }
}

/// Throttle PWM for a stick position and trigger trim
///
/// Maps the stick's -1..=1 linearly onto the envelope's throttle range, adds
/// `(right - left) * 100` and clamps back into the envelope, so the result is
/// always a PWM value and never an altitude.
///
/// # Examples
///
/// ```
/// use skynet_bridge::command::protocol::Envelope;
/// use skynet_bridge::controller::pipeline::stick_to_throttle;
///
/// assert_eq!(stick_to_throttle(0.0, 0.0, 0.0, &Envelope::SAFE), 1500);
/// assert_eq!(stick_to_throttle(1.0, 0.0, 1.0, &Envelope::SAFE), 1800);
/// assert_eq!(stick_to_throttle(-1.0, 1.0, 0.0, &Envelope::FULL), 1000);
/// ```
#[must_use]
pub fn stick_to_throttle(stick_y: f32, left_trigger: f32, right_trigger: f32, envelope: &Envelope) -> i32 {
    let min = envelope.throttle_min as f32;
    let max = envelope.throttle_max as f32;
    let base = min + (stick_y.clamp(-1.0, 1.0) + 1.0) / 2.0 * (max - min);
    let trim = (right_trigger - left_trigger) * TRIGGER_THROTTLE_SPAN;
    envelope.clamp_throttle((base + trim).round() as i32)
}

/// Movement / yaw intensity for an axis value under `envelope`
#[must_use]
pub fn intensity(value: f32, envelope: &Envelope) -> i32 {
    (value.abs().min(1.0) * envelope.movement_max as f32).round() as i32
}
