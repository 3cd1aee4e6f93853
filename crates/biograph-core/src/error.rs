//! Error types for the BioGraph assistant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the BioGraph assistant core.
///
/// This provides typed, structured error variants so callers can
/// distinguish the "expected empty" class of failures (`NotFound`) from
/// genuine faults, and cancellation from both.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BioGraphError {
    /// A collaborator reported that the requested entity or path does not
    /// exist. This is a normal, narratable outcome, not a system fault.
    #[error("Not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// HTTP-level failure from an external collaborator.
    #[error("HTTP error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Http { status: Option<u16>, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The model returned no usable candidate or content at all.
    #[error("Model protocol error: {0}")]
    ModelProtocol(String),

    /// A tool call carried missing or malformed arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (missing secrets, malformed config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the turn.
    #[error("Cancelled by caller")]
    Cancelled,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BioGraphError {
    /// Creates a NotFound error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an Http error.
    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates an InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for the "expected empty" class of failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true when the error represents caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true when the model itself produced no usable response.
    pub fn is_model_protocol(&self) -> bool {
        matches!(self, Self::ModelProtocol(_))
    }

    /// Returns true when retrying the same request could plausibly
    /// succeed: transport-level failures (no status) and the transient
    /// HTTP status classes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status: None, .. } => true,
            Self::Http {
                status: Some(status),
                ..
            } => matches!(status, 408 | 429) || *status >= 500,
            _ => false,
        }
    }
}
