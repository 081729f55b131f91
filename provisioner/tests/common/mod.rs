//! In-memory collaborators for pipeline tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cloud_models::{CreateFunctionRequest, RebuildApiRequest, RouteConfig};
use serde_json::Value;

use provisioner::cloud::{ComputeApi, GatewayApi, IdentityApi, ROLE_NOT_ASSUMABLE_MESSAGE};
use provisioner::deploy::module::{
    ApiModule, ModuleLoader, PostDeployCapabilities, PostDeployContext,
};
use provisioner::deploy::pipeline::{Collaborators, Pipeline};
use provisioner::deploy::project::{PackagedProject, ProjectMetadata, ProjectPreparer};
use provisioner::deploy::stage::{Stage, StageLogger};
use provisioner::errors::ProvisionError;
use provisioner::models::request::DeploymentRequest;
use provisioner::models::resources::{Alias, ComputeResource, IdentityMetadata};
use provisioner::retry::SleepFn;

pub const REGION: &str = "us-east-1";

/// Project directory with a package.json
pub fn project_dir(name: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        format!(r#"{{"name": "{}", "description": "test project"}}"#, name),
    )
    .unwrap();
    dir
}

pub fn handler_request(dir: &Path) -> DeploymentRequest {
    DeploymentRequest {
        region: Some(REGION.to_string()),
        handler: Some("main.handler".to_string()),
        ..DeploymentRequest::new(dir)
    }
}

pub fn api_request(dir: &Path) -> DeploymentRequest {
    DeploymentRequest {
        region: Some(REGION.to_string()),
        api_module: Some("web".to_string()),
        ..DeploymentRequest::new(dir)
    }
}

pub fn routes() -> RouteConfig {
    serde_json::from_value(serde_json::json!({
        "version": 2,
        "routes": {"hello": {"GET": {}}, "echo": {"POST": {}}}
    }))
    .unwrap()
}

#[derive(Default)]
pub struct FakePreparer {
    pub calls: AtomicU32,
    /// Staging directories handed out so far
    pub staged: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ProjectPreparer for FakePreparer {
    async fn resolve_metadata(
        &self,
        _source: &Path,
        name_override: Option<&str>,
        _description_override: Option<&str>,
    ) -> Result<ProjectMetadata, ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProjectMetadata {
            name: name_override.unwrap_or("hello").to_string(),
            description: Some("test project".to_string()),
        })
    }

    async fn package(
        &self,
        _source: &Path,
        _use_local_dependencies: bool,
    ) -> Result<PackagedProject, ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(staging.path().join("main.js"), "").unwrap();
        std::fs::write(staging.path().join("web.api.json"), "{}").unwrap();
        self.staged.lock().unwrap().push(staging.path().to_path_buf());
        Ok(PackagedProject {
            archive: b"archive".to_vec(),
            staging,
        })
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub calls: AtomicU32,
    pub created_roles: Mutex<Vec<String>>,
    /// (role, policy name, document)
    pub policies: Mutex<Vec<(String, String, String)>>,
    pub fail_policy: Option<String>,
}

#[async_trait]
impl IdentityApi for FakeIdentity {
    async fn create_role(
        &self,
        role_name: &str,
        _trust_policy: &str,
    ) -> Result<IdentityMetadata, ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.created_roles.lock().unwrap().push(role_name.to_string());
        Ok(IdentityMetadata {
            name: role_name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", role_name),
            policies: Vec::new(),
        })
    }

    async fn get_role(&self, role_name: &str) -> Result<IdentityMetadata, ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(IdentityMetadata {
            name: role_name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", role_name),
            policies: Vec::new(),
        })
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_policy.as_deref() == Some(policy_name) {
            return Err(ProvisionError::RemoteError(format!("cannot attach {}", policy_name)));
        }
        self.policies.lock().unwrap().push((
            role_name.to_string(),
            policy_name.to_string(),
            policy_document.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCompute {
    pub create_attempts: AtomicU32,
    pub alias_calls: AtomicU32,
    /// Number of leading creation attempts failing with role propagation lag
    pub role_failures: u32,
    /// Fail creation with a non-retriable error instead
    pub fatal_failure: bool,
    pub created: Mutex<Vec<CreateFunctionRequest>>,
    /// (function, alias) -> version
    pub aliases: Mutex<BTreeMap<(String, String), String>>,
}

impl FakeCompute {
    pub fn failing_role_propagation(times: u32) -> Self {
        Self {
            role_failures: times,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ComputeApi for FakeCompute {
    async fn create_function(
        &self,
        request: &CreateFunctionRequest,
    ) -> Result<ComputeResource, ProvisionError> {
        let attempt = self.create_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fatal_failure {
            return Err(ProvisionError::RemoteError("InvalidParameterValueException".to_string()));
        }
        if attempt <= self.role_failures {
            return Err(ProvisionError::RoleNotAssumable(ROLE_NOT_ASSUMABLE_MESSAGE.to_string()));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(ComputeResource {
            name: request.function_name.clone(),
            description: request.description.clone(),
            version: "1".to_string(),
            aliases: BTreeMap::new(),
        })
    }

    async fn upsert_alias(
        &self,
        function_name: &str,
        alias: &str,
        version: &str,
    ) -> Result<Alias, ProvisionError> {
        self.alias_calls.fetch_add(1, Ordering::SeqCst);
        self.aliases.lock().unwrap().insert(
            (function_name.to_string(), alias.to_string()),
            version.to_string(),
        );
        Ok(Alias {
            name: alias.to_string(),
            version: version.to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicU32,
    /// Number of leading calls answered with a rate-limit error
    pub throttle_failures: u32,
    pub created: Mutex<Vec<String>>,
    /// (api id, request)
    pub rebuilds: Mutex<Vec<(String, RebuildApiRequest)>>,
}

impl FakeGateway {
    fn throttle(&self) -> Result<(), ProvisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.throttle_failures {
            return Err(ProvisionError::Throttled("Too Many Requests".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn create_rest_api(&self, name: &str) -> Result<String, ProvisionError> {
        self.throttle()?;
        self.created.lock().unwrap().push(name.to_string());
        Ok("api123".to_string())
    }

    async fn rebuild_and_deploy(
        &self,
        api_id: &str,
        request: &RebuildApiRequest,
    ) -> Result<(), ProvisionError> {
        self.throttle()?;
        self.rebuilds
            .lock()
            .unwrap()
            .push((api_id.to_string(), request.clone()));
        Ok(())
    }
}

/// Module whose entry points return fixed values
pub struct StaticModule {
    pub config: Option<RouteConfig>,
    pub deploy_result: Option<Value>,
    pub contexts: Mutex<Vec<PostDeployContext>>,
}

#[async_trait]
impl ApiModule for StaticModule {
    fn api_config(&self) -> Option<RouteConfig> {
        self.config.clone()
    }

    async fn post_deploy(
        &self,
        _request: &DeploymentRequest,
        context: &PostDeployContext,
        _capabilities: &PostDeployCapabilities,
    ) -> Result<Option<Value>, ProvisionError> {
        self.contexts.lock().unwrap().push(context.clone());
        Ok(self.deploy_result.clone())
    }
}

pub struct StaticModuleLoader {
    pub module: Arc<StaticModule>,
    pub loaded: Mutex<Vec<String>>,
}

impl StaticModuleLoader {
    pub fn new(config: Option<RouteConfig>, deploy_result: Option<Value>) -> Self {
        Self {
            module: Arc::new(StaticModule {
                config,
                deploy_result,
                contexts: Mutex::new(Vec::new()),
            }),
            loaded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(
        &self,
        _staging_dir: &Path,
        module: &str,
    ) -> Result<Arc<dyn ApiModule>, ProvisionError> {
        self.loaded.lock().unwrap().push(module.to_string());
        Ok(self.module.clone())
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub stages: Mutex<Vec<Stage>>,
}

impl StageLogger for RecordingLogger {
    fn log_stage(&self, stage: &Stage) {
        self.stages.lock().unwrap().push(*stage);
    }
}

impl RecordingLogger {
    pub fn count(&self, stage: Stage) -> usize {
        self.stages.lock().unwrap().iter().filter(|s| **s == stage).count()
    }
}

pub fn recording_sleep() -> (SleepFn, Arc<Mutex<Vec<Duration>>>) {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = delays.clone();
    let sleep_fn: SleepFn = Arc::new(move |delay| {
        recorded.lock().unwrap().push(delay);
        Box::pin(async {})
    });
    (sleep_fn, delays)
}

/// A pipeline over fakes, with handles to inspect them afterwards
pub struct Harness {
    pub preparer: Arc<FakePreparer>,
    pub identity: Arc<FakeIdentity>,
    pub compute: Arc<FakeCompute>,
    pub gateway: Arc<FakeGateway>,
    pub modules: Arc<StaticModuleLoader>,
    pub logger: Arc<RecordingLogger>,
    pub delays: Arc<Mutex<Vec<Duration>>>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new(
        identity: FakeIdentity,
        compute: FakeCompute,
        gateway: FakeGateway,
        modules: StaticModuleLoader,
    ) -> Self {
        let preparer = Arc::new(FakePreparer::default());
        let identity = Arc::new(identity);
        let compute = Arc::new(compute);
        let gateway = Arc::new(gateway);
        let modules = Arc::new(modules);
        let logger = Arc::new(RecordingLogger::default());
        let (sleep_fn, delays) = recording_sleep();

        let collaborators = Collaborators {
            preparer: preparer.clone(),
            identity: identity.clone(),
            compute: compute.clone(),
            gateway: gateway.clone(),
            modules: modules.clone(),
        };
        let pipeline = Pipeline::new(collaborators)
            .with_logger(logger.clone())
            .with_sleep(sleep_fn);

        Self {
            preparer,
            identity,
            compute,
            gateway,
            modules,
            logger,
            delays,
            pipeline,
        }
    }

    pub fn with_routes() -> Self {
        Self::new(
            FakeIdentity::default(),
            FakeCompute::default(),
            FakeGateway::default(),
            StaticModuleLoader::new(Some(routes()), None),
        )
    }

    /// Total number of calls made to any collaborator
    pub fn collaborator_calls(&self) -> u32 {
        self.preparer.calls.load(Ordering::SeqCst)
            + self.identity.calls.load(Ordering::SeqCst)
            + self.compute.create_attempts.load(Ordering::SeqCst)
            + self.compute.alias_calls.load(Ordering::SeqCst)
            + self.gateway.calls.load(Ordering::SeqCst)
            + self.modules.loaded.lock().unwrap().len() as u32
    }
}
