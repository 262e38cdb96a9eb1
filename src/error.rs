//! Error types for the outreach engine.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Durable-store errors.
///
/// A *missing* slot file is not an error (the store returns the slot's
/// default shape); these cover I/O failures and corrupt documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {slot}: {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt document in {slot}: {source}")]
    Corrupt {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed for {slot}: {source}")]
    Serialization {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the external platform collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Channel not found: {handle}")]
    ChannelNotFound { handle: String },

    #[error("Platform API call failed: {operation}: {message}")]
    Api { operation: String, message: String },

    #[error("Platform rejected reply to comment {comment_id}: {message}")]
    PostRejected { comment_id: String, message: String },
}

impl PlatformError {
    /// Short operation label for structured logging.
    pub fn operation(&self) -> &str {
        match self {
            Self::ChannelNotFound { .. } => "resolve_channel_id",
            Self::Api { operation, .. } => operation,
            Self::PostRejected { .. } => "post_reply",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let err = Error::Platform(PlatformError::ChannelNotFound {
            handle: "@example".into(),
        });
        assert!(err.to_string().contains("@example"));
    }

    #[test]
    fn store_error_names_slot() {
        let err = StoreError::Io {
            slot: "processed_items".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("processed_items"));
    }
}
