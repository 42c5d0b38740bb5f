//! Error types for every layer of the crate.
//!
//! Expected conditions (unknown tab ids, unnormalized urls, page load
//! failures) are not errors: core operations return `false` or log instead.

// === ChannelError ===

/// Errors raised by the host/view message channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The receiving side has gone away; the message was dropped.
    #[error("Channel closed: peer is gone")]
    Closed,
    /// A message could not be encoded for the wire.
    #[error("Channel encode error: {0}")]
    Encode(String),
    /// A wire line could not be decoded into a message.
    #[error("Channel decode error: {0}")]
    Decode(String),
}

// === ViewError ===

/// Errors from a native browsing surface.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("View creation failed: {0}")]
    Creation(String),
    #[error("View navigation failed: {0}")]
    Navigation(String),
    #[error("View script evaluation failed: {0}")]
    Script(String),
    #[error("View platform error: {0}")]
    Platform(String),
}

// === SessionError ===

/// Errors related to the tab session host and its persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Host-side state broke one of its own invariants. Not recoverable.
    #[error("Session invariant violated: {0}")]
    InvariantViolation(String),
    /// The host event loop has stopped.
    #[error("Session host is not running")]
    HostUnavailable,
    /// Database operation failed.
    #[error("Session database error: {0}")]
    DatabaseError(String),
    /// Failed to serialize or deserialize session data.
    #[error("Session serialization error: {0}")]
    SerializationError(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Startup and shutdown failures of the assembled application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("Database open failed: {0}")]
    Database(#[from] rusqlite::Error),
}
