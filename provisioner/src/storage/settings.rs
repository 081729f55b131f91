//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::retry::RetryPolicy;

/// Provisioner settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Control-plane configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Retry budgets
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ProvisionError> {
        File::new(path).read_json().await.map_err(|e| {
            ProvisionError::ConfigError(format!(
                "Unable to read settings file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Control-plane API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the control-plane API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token sent with every call
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:4566".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Retry budgets of the two retried call sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Function creation while a new role propagates
    #[serde(default = "RetryPolicy::role_propagation")]
    pub role_propagation: RetryPolicy,

    /// Web API calls rejected by rate limiting
    #[serde(default = "RetryPolicy::throttling")]
    pub throttling: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            role_propagation: RetryPolicy::role_propagation(),
            throttling: RetryPolicy::throttling(),
        }
    }
}
