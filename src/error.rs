//! Error types for the gateway.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read configuration: {0}")]
    ParseError(String),
}

/// Transport channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Tool dispatch errors.
///
/// Every variant is converted into a structured error result at the protocol
/// boundary; none of them terminates the gateway process or a transport
/// session.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool {name} is already registered")]
    DuplicateTool { name: String },

    #[error("Invalid schema for tool {tool}: {errors}")]
    InvalidSchema { tool: String, errors: String },

    #[error("Missing required field '{field}' for tool {tool}")]
    MissingField { tool: String, field: String },

    #[error("Invalid value for field '{field}' of tool {tool}: {reason}")]
    InvalidValue {
        tool: String,
        field: String,
        reason: String,
    },

    #[error("Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("Tool {tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("para command failed for {tool}: {message}")]
    ExternalTool { tool: String, message: String },
}

/// Result type alias for the gateway.
pub type Result<T> = std::result::Result<T, Error>;
