//! Deployment request

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Alias that always tracks the newest revision
pub const LATEST_ALIAS: &str = "latest";

/// Default config file written into the source directory
pub const DEFAULT_CONFIG_FILE: &str = "claudia.json";

/// Project descriptor that must exist at the project root
pub const PROJECT_DESCRIPTOR: &str = "package.json";

pub const DEFAULT_RUNTIME: &str = "nodejs4.3";
pub const DEFAULT_MEMORY_MB: u32 = 128;
pub const DEFAULT_TIMEOUT_SECS: u32 = 3;

/// Everything needed to provision a function from a project directory.
///
/// Immutable once the pipeline starts. When both `handler` and `api_module`
/// are given, the API module wins and the handler is ignored. A blank
/// `handler` or `api_module` counts as not given; read them through
/// [`DeploymentRequest::handler`] and [`DeploymentRequest::api_module`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentRequest {
    /// Project directory
    pub source: PathBuf,

    pub region: Option<String>,

    /// Function entry point, as `module.function`
    pub handler: Option<String>,

    /// Web API module at the project root
    pub api_module: Option<String>,

    /// Function name override
    pub name: Option<String>,

    pub description: Option<String>,

    /// Named alias assigned to the new revision
    pub version: Option<String>,

    /// Config output path; defaults to `claudia.json` in the source directory
    pub config: Option<PathBuf>,

    /// Directory or file pattern with additional role policies
    pub policies: Option<String>,

    #[serde(default)]
    pub allow_recursion: bool,

    /// Existing role to reuse instead of creating one
    pub role: Option<String>,

    pub runtime: Option<String>,

    /// Memory in MB
    pub memory: Option<u32>,

    /// Timeout in seconds
    pub timeout: Option<u32>,

    #[serde(default)]
    pub use_local_dependencies: bool,
}

impl DeploymentRequest {
    /// Create a request for a project directory with everything else unset
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Where the resulting config is written
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.source.join(DEFAULT_CONFIG_FILE))
    }

    /// Alias the web API stage is bound to
    pub fn alias(&self) -> &str {
        self.version.as_deref().unwrap_or(LATEST_ALIAS)
    }

    /// Function entry point, if one was given
    pub fn handler(&self) -> Option<&str> {
        non_blank(&self.handler)
    }

    /// Web API module, if one was given
    pub fn api_module(&self) -> Option<&str> {
        non_blank(&self.api_module)
    }

    /// Entry point of the function; API modules expose a `router`
    pub fn function_handler(&self) -> String {
        match (self.api_module(), self.handler()) {
            (Some(module), _) => format!("{}.router", module),
            (None, Some(handler)) => handler.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }

    pub fn runtime(&self) -> &str {
        self.runtime.as_deref().unwrap_or(DEFAULT_RUNTIME)
    }

    pub fn memory(&self) -> u32 {
        self.memory.unwrap_or(DEFAULT_MEMORY_MB)
    }

    pub fn timeout(&self) -> u32 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
