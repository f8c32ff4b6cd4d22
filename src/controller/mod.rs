//! # Controller Module
//!
//! Gamepad input handling and the real-time input pipeline.
//!
//! This module handles:
//! - Reading a gamepad via evdev and normalizing its axes
//! - Deadzone, response curve and smoothing
//! - Button edge detection and rate-limited command emission
//! - Throughput counters

pub mod sample;
pub mod shaping;
pub mod pipeline;
pub mod stats;
pub mod gamepad;
