//! Error types for status-board
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the application
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (file operations, network, etc.)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },

    /// Channel send error
    #[snafu(display("Channel send error: {message}"))]
    ChannelSend { message: String },

    /// Transport connection error
    #[snafu(display("Connection error: {message}"))]
    Connection { message: String },

    /// Topic join rejected by the transport
    #[snafu(display("Unable to join {topic}: {reason}"))]
    Join { topic: String, reason: String },

    /// Event payload does not match the wire contract
    #[snafu(display("Malformed event: {message}"))]
    MalformedEvent { message: String },

    /// Status value outside ok/warn/error
    #[snafu(display("Malformed event: unrecognized status {status:?}"))]
    UnknownStatus { status: String },
}

impl Error {
    /// Whether this error describes a bad event payload rather than an
    /// infrastructure failure
    pub fn is_malformed_event(&self) -> bool {
        matches!(self, Error::MalformedEvent { .. } | Error::UnknownStatus { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

impl From<fred::error::Error> for Error {
    fn from(source: fred::error::Error) -> Self {
        Error::Connection {
            message: source.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;
