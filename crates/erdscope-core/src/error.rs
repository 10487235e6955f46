//! Error types for erdscope

use thiserror::Error;

/// Core error type for schema discovery and diagram operations
#[derive(Error, Debug)]
pub enum ErdError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Aborted")]
    Aborted,

    #[error("A schema stream is already in progress")]
    StreamInProgress,

    #[error("Unsupported diagram state version {found} (expected {expected})")]
    UnsupportedStateVersion { found: u32, expected: u32 },

    #[error("Image generation error: {0}")]
    ImageGeneration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ErdError {
    /// Create a provider error from any message
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a connection-lost error from any message
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }

    /// Create an image generation error from any message
    pub fn image(message: impl Into<String>) -> Self {
        Self::ImageGeneration(message.into())
    }

    /// Check if this error is a cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Errors that end a schema stream instead of being absorbed per table
    pub fn is_fatal_for_stream(&self) -> bool {
        matches!(self, Self::Aborted | Self::ConnectionLost(_))
    }
}

/// Result type alias for erdscope operations
pub type Result<T> = std::result::Result<T, ErdError>;
