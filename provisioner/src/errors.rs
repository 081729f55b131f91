//! Error types for the provisioner

use thiserror::Error;

/// Main error type for the provisioner
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A local precondition failed; the message is shown to the user as-is
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    ProjectError(String),

    /// The execution role has not propagated yet
    #[error("{0}")]
    RoleNotAssumable(String),

    #[error("Rate limited: {0}")]
    Throttled(String),

    /// The user API module could not be loaded or evaluated
    #[error("{0}")]
    ExtensionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote call failed: {0}")]
    RemoteError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProvisionError {
    /// Remote failure caused by role propagation lag
    pub fn is_role_propagation(&self) -> bool {
        matches!(self, ProvisionError::RoleNotAssumable(_))
    }

    /// Remote failure caused by backend rate limiting
    pub fn is_throttling(&self) -> bool {
        matches!(self, ProvisionError::Throttled(_))
    }
}

impl From<anyhow::Error> for ProvisionError {
    fn from(err: anyhow::Error) -> Self {
        ProvisionError::Internal(err.to_string())
    }
}

impl From<walkdir::Error> for ProvisionError {
    fn from(err: walkdir::Error) -> Self {
        ProvisionError::ProjectError(err.to_string())
    }
}
