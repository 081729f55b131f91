//! User API modules: the pipeline's extension point
//!
//! A module supplies the route tree of the web API and may run a post-deploy
//! step once the API is live. Both calls run inside an unwind boundary; any
//! failure becomes [`ProvisionError::ExtensionError`].

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use cloud_models::RouteConfig;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::cloud::GatewayApi;
use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::models::request::DeploymentRequest;

/// Facts about the deployed API handed to the post-deploy step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeployContext {
    pub name: String,
    pub alias: String,
    pub api_id: String,
    pub api_url: String,
    pub region: String,
}

/// Clients the post-deploy step may use
#[derive(Clone)]
pub struct PostDeployCapabilities {
    /// Rate-limit aware web API client
    pub gateway: Arc<dyn GatewayApi>,
}

/// A loaded API module
#[async_trait]
pub trait ApiModule: Send + Sync {
    /// Route tree of the API, or `None` if the module defines none
    fn api_config(&self) -> Option<RouteConfig>;

    /// Runs after the API stage is deployed; the result is attached to the
    /// summary untouched
    async fn post_deploy(
        &self,
        _request: &DeploymentRequest,
        _context: &PostDeployContext,
        _capabilities: &PostDeployCapabilities,
    ) -> Result<Option<Value>, ProvisionError> {
        Ok(None)
    }
}

/// Resolves a module name to an [`ApiModule`] inside the staged package
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(
        &self,
        staging_dir: &Path,
        module: &str,
    ) -> Result<Arc<dyn ApiModule>, ProvisionError>;
}

/// Manifest describing a module: `<module>.api.json` at the package root
pub fn manifest_path(staging_dir: &Path, module: &str) -> PathBuf {
    staging_dir.join(format!("{}.api.json", module))
}

/// Command run after deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeployCommand {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleManifest {
    #[serde(default)]
    version: Option<u32>,

    #[serde(default)]
    routes: Option<std::collections::BTreeMap<String, std::collections::BTreeMap<String, Value>>>,

    #[serde(default)]
    post_deploy: Option<PostDeployCommand>,
}

/// Module backed by a JSON manifest and an optional post-deploy command
#[derive(Debug, Clone)]
pub struct ManifestModule {
    routes: Option<RouteConfig>,
    post_deploy: Option<PostDeployCommand>,
    working_dir: PathBuf,
}

#[async_trait]
impl ApiModule for ManifestModule {
    fn api_config(&self) -> Option<RouteConfig> {
        self.routes.clone()
    }

    async fn post_deploy(
        &self,
        request: &DeploymentRequest,
        context: &PostDeployContext,
        _capabilities: &PostDeployCapabilities,
    ) -> Result<Option<Value>, ProvisionError> {
        let Some(post_deploy) = &self.post_deploy else {
            return Ok(None);
        };

        debug!("Running post-deploy command: {}", post_deploy.command);
        let mut child = Command::new(&post_deploy.command)
            .args(&post_deploy.args)
            .current_dir(&self.working_dir)
            .env("DEPLOY_NAME", &context.name)
            .env("DEPLOY_ALIAS", &context.alias)
            .env("DEPLOY_API_ID", &context.api_id)
            .env("DEPLOY_API_URL", &context.api_url)
            .env("DEPLOY_REGION", &context.region)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ProvisionError::ExtensionError(format!(
                    "Failed to run post-deploy command {}: {}",
                    post_deploy.command, e
                ))
            })?;

        // Feed stdin while stdout is drained, so neither pipe can fill up
        let payload = serde_json::to_vec(request)?;
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    warn!("Post-deploy command did not read the request: {}", e);
                }
            })
        });

        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                warn!("Writing the request to the post-deploy command failed: {}", e);
            }
        }
        if !output.status.success() {
            return Err(ProvisionError::ExtensionError(format!(
                "Post-deploy command {} failed with {}",
                post_deploy.command, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_str(stdout).unwrap_or_else(|_| Value::String(stdout.to_string())),
        ))
    }
}

/// Loads [`ManifestModule`]s from the staged package
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestModuleLoader;

#[async_trait]
impl ModuleLoader for ManifestModuleLoader {
    async fn load(
        &self,
        staging_dir: &Path,
        module: &str,
    ) -> Result<Arc<dyn ApiModule>, ProvisionError> {
        let manifest: ModuleManifest = File::new(manifest_path(staging_dir, module))
            .read_json()
            .await?;

        let routes = manifest.routes.map(|routes| RouteConfig {
            version: manifest.version,
            routes,
        });

        Ok(Arc::new(ManifestModule {
            routes,
            post_deploy: manifest.post_deploy,
            working_dir: staging_dir.to_path_buf(),
        }))
    }
}

/// Load a module and read its route tree, converting every failure
/// (including a panic) into an extension error naming the module
pub async fn load_api_config(
    loader: &dyn ModuleLoader,
    staging_dir: &Path,
    module: &str,
) -> Result<(Arc<dyn ApiModule>, RouteConfig), ProvisionError> {
    let module_path = staging_dir.join(module);
    let loaded = AssertUnwindSafe(async {
        let api_module = loader.load(staging_dir, module).await?;
        let config = api_module.api_config();
        Ok::<_, ProvisionError>((api_module, config))
    })
    .catch_unwind()
    .await;

    let (api_module, config) = match loaded {
        Ok(Ok(loaded)) => loaded,
        Ok(Err(e)) => {
            warn!("Loading API module {} failed: {}", module, e);
            return Err(cannot_load(&module_path));
        }
        Err(_) => {
            warn!("Loading API module {} panicked", module);
            return Err(cannot_load(&module_path));
        }
    };

    match config {
        Some(config) => Ok((api_module, config)),
        None => Err(ProvisionError::ExtensionError(format!(
            "No apiConfig defined on module '{}'. Are you missing a module.exports?",
            module
        ))),
    }
}

/// Run the post-deploy step inside an unwind boundary
pub async fn run_post_deploy(
    api_module: &dyn ApiModule,
    module: &str,
    request: &DeploymentRequest,
    context: &PostDeployContext,
    capabilities: &PostDeployCapabilities,
) -> Result<Option<Value>, ProvisionError> {
    let result = AssertUnwindSafe(api_module.post_deploy(request, context, capabilities))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(ProvisionError::ExtensionError(message))) => {
            Err(ProvisionError::ExtensionError(message))
        }
        Ok(Err(e)) => Err(ProvisionError::ExtensionError(format!(
            "post-deploy of module '{}' failed: {}",
            module, e
        ))),
        Err(_) => Err(ProvisionError::ExtensionError(format!(
            "post-deploy of module '{}' panicked",
            module
        ))),
    }
}

fn cannot_load(module_path: &Path) -> ProvisionError {
    ProvisionError::ExtensionError(format!(
        "cannot load api config from {}",
        module_path.display()
    ))
}
