//! # Flight Command Module
//!
//! Safety-constrained encoding of pilot intents into the firmware's JSON
//! command messages.
//!
//! This module handles:
//! - Command kinds and the outbound wire format
//! - Safe / full numeric envelopes
//! - Clamping every value into the active envelope
//! - Advisory checks and named presets for operator intents

pub mod protocol;
pub mod encoder;
