//! # Skynet Bridge Library
//!
//! Fly an MSP flight controller over UDP with a game controller.
//!
//! This library provides the core pieces of the ground side:
//! - [`msp`]: decoding MSP v1 telemetry frames
//! - [`command`]: encoding pilot intents into commands inside a safety envelope
//! - [`controller`]: shaping gamepad input into rate-limited commands
//!
//! plus the plumbing that connects them ([`telemetry`], [`transport`],
//! [`bridge`]) and the ambient [`config`] and [`error`] types.

pub mod config;
pub mod error;
pub mod msp;
pub mod command;
pub mod controller;
pub mod telemetry;
pub mod transport;
pub mod bridge;
