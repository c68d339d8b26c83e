//! Error types for the onboarding simulator.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Journey error: {0}")]
    Journey(#[from] JourneyError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Flag backend errors.
///
/// These never escape `FlagStore`; they only surface from a raw backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Login failures. Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Both email and password are required")]
    MissingCredentials,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Invalid credentials. Please try: {hint}")]
    InvalidCredentials { hint: String },

    #[error("Not logged in")]
    NotLoggedIn,
}

/// Journey and stage plan errors.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("Unknown case: {0}")]
    UnknownCase(String),

    #[error("Invalid stage plan: {0}")]
    InvalidPlan(String),

    #[error("No chat is open")]
    NoFocus,
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("{0}")]
    InvalidCommand(String),
}

/// Result type alias for the simulator.
pub type Result<T> = std::result::Result<T, Error>;
