//! Error types for the Hello Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Resource does not exist in the store
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource with the same identity already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Stored resource changed since it was read
    #[error("Conflicting update on {0}")]
    Conflict(String),

    /// Hello is Running but its Pod is gone
    #[error("Work unit missing for running Hello {0}")]
    WorkUnitMissing(String),

    /// Pod already has a different controlling owner
    #[error("Already owned: {0}")]
    AlreadyOwned(String),

    /// Phase string outside the known set
    #[error("Invalid phase '{0}'")]
    InvalidPhase(String),

    /// Object metadata lacks a field needed to address or own it
    #[error("Object is missing metadata field '{0}'")]
    MissingObjectKey(&'static str),

    /// Invocation cancelled before completion
    #[error("Reconciliation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether redelivery with fresh state can fix this error.
    ///
    /// An invalid phase needs a human to repair the status, so retrying it
    /// on the short schedule only produces noise.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidPhase(_)
                | Error::AlreadyOwned(_)
                | Error::Config(_)
                | Error::MissingObjectKey(_)
        )
    }

    /// Short label used for the error metric
    pub fn metric_label(&self) -> &'static str {
        match self {
            Error::Kube(_) => "kube",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::Conflict(_) => "conflict",
            Error::WorkUnitMissing(_) => "work_unit_missing",
            Error::AlreadyOwned(_) => "already_owned",
            Error::InvalidPhase(_) => "invalid_phase",
            Error::MissingObjectKey(_) => "missing_object_key",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
        }
    }
}
