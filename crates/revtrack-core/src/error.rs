//! Error types for the reconciliation core
//!
//! Only two kinds of failure exist at this layer:
//! - Value parse failures, which callers absorb by substituting "no date"
//! - Configuration failures, which surface at startup

use std::path::PathBuf;

/// A single stored value failed to normalize
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Value was empty or whitespace
    #[error("empty value")]
    Empty,

    /// Text did not match any accepted date form
    #[error("unrecognized date: {0:?}")]
    UnrecognizedDate(String),

    /// Timestamp is outside the representable calendar range
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    /// Value has a JSON type that can never hold a date
    #[error("unsupported value type for a date: {0}")]
    UnsupportedType(&'static str),

    /// Storage path token is malformed
    #[error("invalid storage path: {0:?}")]
    InvalidStoragePath(String),
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the engine schema
    #[error("malformed config: {0}")]
    Malformed(#[from] toml::de::Error),

    /// A field holds a value outside its permitted range
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why the value is rejected
        reason: String,
    },
}
