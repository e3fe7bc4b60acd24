//! Error types for plugcache
//!
//! All modules use `PlugcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plugcache operations
pub type PlugcacheResult<T> = Result<T, PlugcacheError>;

/// All errors that can occur while merging plugin caches
#[derive(Error, Debug)]
pub enum PlugcacheError {
    // Codec errors
    #[error("Malformed plugin registry{}: {reason} (at byte {offset})", describe_fragment(.fragment))]
    MalformedRegistry {
        /// Staging index of the fragment, when known
        fragment: Option<usize>,
        offset: usize,
        reason: String,
    },

    #[error("String of {len} bytes exceeds the 65535 byte limit of the registry format")]
    StringTooLong { len: usize },

    #[error("Too many {what} for the registry format: {count}")]
    CountOverflow { what: &'static str, count: usize },

    // Staging errors
    #[error("Failed to stage fragment: {context}")]
    Staging {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Output errors
    #[error("Failed to write merged registry: {context}")]
    DestinationWrite {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn describe_fragment(fragment: &Option<usize>) -> String {
    match fragment {
        Some(index) => format!(" in fragment #{}", index),
        None => String::new(),
    }
}

impl PlugcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a staging error
    pub fn staging(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Staging {
            context: context.into(),
            source,
        }
    }

    /// Create a destination write error
    pub fn destination(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::DestinationWrite {
            context: context.into(),
            source,
        }
    }

    /// Create a malformed registry error at a byte offset
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRegistry {
            fragment: None,
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the staging index of the fragment that failed to decode
    pub fn in_fragment(self, index: usize) -> Self {
        match self {
            Self::MalformedRegistry { offset, reason, .. } => Self::MalformedRegistry {
                fragment: Some(index),
                offset,
                reason,
            },
            other => other,
        }
    }

    /// Check if this error came from an undecodable fragment
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRegistry { .. })
    }

    /// Check if error is retryable
    ///
    /// Corruption and I/O failures are not transient in place, so nothing is.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MalformedRegistry { .. } => {
                Some("Rebuild the input archive; its plugin cache is truncated or corrupt")
            }
            Self::StringTooLong { .. } => {
                Some("Shorten the relocation target; registry strings are limited to 65535 bytes")
            }
            Self::Staging { .. } => {
                Some("Check free space and permissions of the staging directory")
            }
            _ => None,
        }
    }
}
