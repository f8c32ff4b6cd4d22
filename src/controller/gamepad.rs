//! # Gamepad Input Module
//!
//! Reads one evdev gamepad at a configured path and folds its events into a
//! [`ControllerSample`].
//!
//! ## Layout (Xbox-style evdev codes)
//!
//! | Input | evdev Code | Sample field |
//! |-------|------------|--------------|
//! | Left stick | ABS_X / ABS_Y | `left_stick` (movement) |
//! | Right stick | ABS_RX / ABS_RY | `right_stick` (yaw / throttle) |
//! | Left trigger | ABS_Z | `left_trigger` |
//! | Right trigger | ABS_RZ | `right_trigger` |
//! | A | BTN_SOUTH | [`Button::Arm`] |
//! | B | BTN_EAST | [`Button::EmergencyStop`] |
//! | Y | BTN_NORTH | [`Button::SafeMode`] |
//! | X | BTN_WEST | [`Button::Hover`] |
//! | Start | BTN_START | [`Button::Enable`] |
//!
//! evdev reports stick Y as positive when pulled towards the pilot, so both Y
//! axes are inverted here.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::{BridgeError, Result};

use super::sample::{Button, ControllerSample};

/// Open evdev gamepad
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl Gamepad {
    /// Open the input device at `path`
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device is missing or not readable.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use skynet_bridge::controller::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open("/dev/input/event0")?;
    /// println!("Opened {:?}", pad.name());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| BridgeError::Controller(format!("Failed to open {}: {}", path, e)))?;

        Ok(Self {
            device,
            device_path: path.to_string(),
        })
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the kernel
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Block until events are available and return them
    ///
    /// # Errors
    ///
    /// Returns `Controller` when the read fails, usually because the device
    /// was unplugged.
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| BridgeError::Controller(format!("Failed to fetch events: {}", e)))
    }
}

/// Folds raw evdev events into a normalized [`ControllerSample`].
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use skynet_bridge::controller::gamepad::EventMapper;
///
/// let mut mapper = EventMapper::new(32767, 1023);
/// mapper.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_RY.0, -32767));
///
/// // Pushed away from the pilot: full throttle up
/// assert_eq!(mapper.sample().right_stick.y, 1.0);
/// ```
#[derive(Debug)]
pub struct EventMapper {
    stick_range: f32,
    trigger_range: f32,
    sample: ControllerSample,
}

impl EventMapper {
    /// # Arguments
    ///
    /// * `stick_range` - Raw value of full stick deflection
    /// * `trigger_range` - Raw value of a fully pressed trigger
    #[must_use]
    pub fn new(stick_range: i32, trigger_range: i32) -> Self {
        Self {
            stick_range: stick_range.max(1) as f32,
            trigger_range: trigger_range.max(1) as f32,
            sample: ControllerSample::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.stick_range, config.trigger_range)
    }

    /// Current sample reflecting every event processed so far
    #[must_use]
    pub fn sample(&self) -> &ControllerSample {
        &self.sample
    }

    /// Back to centered sticks and released buttons
    pub fn reset(&mut self) {
        self.sample = ControllerSample::default();
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            _ => {}
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let stick = (value as f32 / self.stick_range).clamp(-1.0, 1.0);
        let trigger = (value as f32 / self.trigger_range).clamp(0.0, 1.0);

        match axis {
            AbsoluteAxisType::ABS_X => self.sample.left_stick.x = stick,
            AbsoluteAxisType::ABS_Y => self.sample.left_stick.y = -stick,
            AbsoluteAxisType::ABS_RX => self.sample.right_stick.x = stick,
            AbsoluteAxisType::ABS_RY => self.sample.right_stick.y = -stick,
            AbsoluteAxisType::ABS_Z => self.sample.left_trigger = trigger,
            AbsoluteAxisType::ABS_RZ => self.sample.right_trigger = trigger,
            _ => {}
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let button = match key {
            Key::BTN_SOUTH => Button::Arm,
            Key::BTN_EAST => Button::EmergencyStop,
            Key::BTN_NORTH => Button::SafeMode,
            Key::BTN_WEST => Button::Hover,
            Key::BTN_START => Button::Enable,
            _ => return,
        };
        self.sample.buttons.set(button, pressed);
    }
}

/// Read the configured gamepad on its own thread
///
/// The receiver holds `Some(sample)` while the device is readable and `None`
/// while it is absent. The device is reopened every `reconnect_interval_ms`
/// after a failure. The thread ends once every receiver is dropped.
///
/// The thread is not owned by the tokio runtime, so shutting the runtime down
/// never waits on a read blocked inside evdev.
///
/// # Errors
///
/// Returns `Controller` if the reader thread cannot be started
pub fn spawn_reader(
    config: ControllerConfig,
) -> Result<(watch::Receiver<Option<ControllerSample>>, JoinHandle<()>)> {
    let (tx, rx) = watch::channel(None);
    let handle = thread::Builder::new()
        .name("gamepad-reader".to_string())
        .spawn(move || read_loop(&config, &tx))
        .map_err(|e| BridgeError::Controller(format!("Failed to start reader thread: {}", e)))?;
    Ok((rx, handle))
}

fn read_loop(config: &ControllerConfig, tx: &watch::Sender<Option<ControllerSample>>) {
    let reconnect = Duration::from_millis(config.reconnect_interval_ms);
    let mut mapper = EventMapper::from_config(config);

    while !tx.is_closed() {
        match Gamepad::open(&config.device_path) {
            Ok(mut pad) => {
                info!(
                    "Controller connected: {} ({})",
                    pad.name().unwrap_or("unknown"),
                    pad.device_path()
                );
                mapper.reset();
                tx.send_replace(Some(mapper.sample().clone()));

                loop {
                    match pad.fetch_events() {
                        Ok(events) => {
                            for event in events {
                                mapper.process_event(&event);
                            }
                        }
                        Err(e) => {
                            warn!("Controller disconnected: {}", e);
                            break;
                        }
                    }
                    if tx.send(Some(mapper.sample().clone())).is_err() {
                        return;
                    }
                }

                tx.send_replace(None);
            }
            Err(e) => debug!("{}", e),
        }

        thread::sleep(reconnect);
    }
}
