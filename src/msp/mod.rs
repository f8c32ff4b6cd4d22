//! # MSP Telemetry Module
//!
//! Decoding of MultiWii Serial Protocol (v1) telemetry pushed by the flight
//! controller over the datagram link.
//!
//! This module handles:
//! - Frame validation (magic, declared length)
//! - Decoding Attitude, Altitude, GPS, Status, RC and Raw IMU payloads
//! - Flight-mode priority decoding from the status bitmask

pub mod protocol;
pub mod decoder;
