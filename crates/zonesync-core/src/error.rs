//! Error types for zone reconciliation
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zone reconciliation
#[derive(Error, Debug)]
pub enum Error {
    /// Observed state could not be retrieved from the provider
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A provider-native payload could not be normalized
    #[error("Parse error: {0}")]
    Parse(String),

    /// A record or record set the target provider cannot host
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// An added or modified label produced no native payload
    #[error("Planning invariant violated for {label} ({operation}): desired records produced no native record set")]
    PlanningInvariant {
        /// Label that failed to plan
        label: String,
        /// Operation that was being planned
        operation: String,
    },

    /// A single correction failed against the remote provider
    #[error("Correction failed: {correction}: {message}")]
    Mutation {
        /// The correction's message
        correction: String,
        /// The provider's error, verbatim
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record set not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a planning invariant error
    pub fn planning_invariant(label: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::PlanningInvariant {
            label: label.into(),
            operation: operation.into(),
        }
    }

    /// Create a mutation error
    pub fn mutation(correction: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mutation {
            correction: correction.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the run before any mutation is attempted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_)
                | Self::Parse(_)
                | Self::Unsupported(_)
                | Self::PlanningInvariant { .. }
                | Self::Config(_)
        )
    }
}
