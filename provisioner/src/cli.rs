//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::logs::LogLevel;
use crate::models::request::DeploymentRequest;

/// Create the initial function and related security role
#[derive(Debug, Clone, Parser)]
#[command(name = "provision", about, disable_version_flag = true)]
pub struct Args {
    /// Region where to create the function, e.g. us-east-1
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Main function to execute, as module.function (e.g. main.handler)
    #[arg(long)]
    pub handler: Option<String>,

    /// Module describing a web API; when given, --handler is ignored
    #[arg(long = "api-module")]
    pub api_module: Option<String>,

    /// Function name [default: the project name from package.json]
    #[arg(long)]
    pub name: Option<String>,

    /// Alias to assign to the new function version, e.g. development
    #[arg(long)]
    pub version: Option<String>,

    /// Directory with project files [default: current directory]
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Config file where the result will be saved [default: claudia.json]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory or file pattern of additional role policies, e.g. policies/*.json
    #[arg(long)]
    pub policies: Option<String>,

    /// Let the function invoke itself
    #[arg(long = "allow-recursion")]
    pub allow_recursion: bool,

    /// Existing role to assign instead of creating one
    #[arg(long)]
    pub role: Option<String>,

    /// Runtime to use [default: nodejs4.3]
    #[arg(long)]
    pub runtime: Option<String>,

    /// Description of the function [default: from package.json]
    #[arg(long)]
    pub description: Option<String>,

    /// Memory in MB, a multiple of 64 [default: 128]
    #[arg(long)]
    pub memory: Option<u32>,

    /// Execution timeout in seconds [default: 3]
    #[arg(long)]
    pub timeout: Option<u32>,

    /// Use the local node_modules directory instead of installing dependencies
    #[arg(long = "use-local-dependencies")]
    pub use_local_dependencies: bool,

    /// Settings file (JSON)
    #[arg(long, env = "PROVISION_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Control-plane URL, overrides the settings file
    #[arg(long = "backend-url", env = "PROVISION_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Log level, overrides the settings file
    #[arg(long = "log-level")]
    pub log_level: Option<LogLevel>,
}

impl Args {
    /// Build the deployment request, resolving the source directory
    pub fn into_request(self, current_dir: PathBuf) -> DeploymentRequest {
        DeploymentRequest {
            source: self.source.unwrap_or(current_dir),
            region: self.region,
            handler: self.handler,
            api_module: self.api_module,
            name: self.name,
            description: self.description,
            version: self.version,
            config: self.config,
            policies: self.policies,
            allow_recursion: self.allow_recursion,
            role: self.role,
            runtime: self.runtime,
            memory: self.memory,
            timeout: self.timeout,
            use_local_dependencies: self.use_local_dependencies,
        }
    }
}
