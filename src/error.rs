//! # Error Types
//!
//! Custom error types for Skynet Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Skynet Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// MSP framing errors (only surfaced by `decode_frame`; `decode` swallows them)
    #[error("MSP protocol error: {0}")]
    MspProtocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Controller device errors (open failed, device gone)
    #[error("Controller error: {0}")]
    Controller(String),

    /// Unknown command name or out-of-range intent value
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Datagram transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Command serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Skynet Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
