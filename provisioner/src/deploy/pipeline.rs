//! Provisioning pipeline
//!
//! Stages run strictly in order, each consuming the state produced by the
//! previous one. The first failure stops the run. Resources created before
//! the failure are left in place.

use std::sync::Arc;

use tempfile::TempDir;

use tracing::info;

use crate::cloud::throttled::ThrottledGateway;
use crate::cloud::{ComputeApi, GatewayApi, IdentityApi};
use crate::deploy::alias::mark_aliases;
use crate::deploy::compute::{create_function, function_request};
use crate::deploy::gateway::provision_gateway;
use crate::deploy::identity::{provision_identity, IdentityPlan};
use crate::deploy::module::ModuleLoader;
use crate::deploy::persist::save_config;
use crate::deploy::policies::policy_files;
use crate::deploy::project::{validate_package, PackagedProject, ProjectMetadata, ProjectPreparer};
use crate::deploy::stage::{NullLogger, Stage, StageLogger};
use crate::deploy::validate::validate;
use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::models::request::DeploymentRequest;
use crate::models::resources::{ComputeResource, DeploymentSummary, GatewayResource, IdentityMetadata};
use crate::retry::{tokio_sleep, SleepFn};
use crate::storage::settings::RetrySettings;

/// Everything the pipeline talks to
#[derive(Clone)]
pub struct Collaborators {
    pub preparer: Arc<dyn ProjectPreparer>,
    pub identity: Arc<dyn IdentityApi>,
    pub compute: Arc<dyn ComputeApi>,
    pub gateway: Arc<dyn GatewayApi>,
    pub modules: Arc<dyn ModuleLoader>,
}

/// Project resolved and packaged
struct Prepared {
    metadata: ProjectMetadata,
    package: PackagedProject,
}

/// Execution role ready
struct Authorized {
    prepared: Prepared,
    identity: IdentityMetadata,
}

/// Function created and aliased
struct Deployed {
    identity: IdentityMetadata,
    function: ComputeResource,
    /// Removed when the run ends, whatever the outcome
    staging: TempDir,
}

/// Web API created, if one was requested
struct Exposed {
    deployed: Deployed,
    gateway: Option<GatewayResource>,
}

/// Provisions a function, its role and an optional web API
pub struct Pipeline {
    collaborators: Collaborators,
    logger: Arc<dyn StageLogger>,
    retry: RetrySettings,
    sleep_fn: SleepFn,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            logger: Arc::new(NullLogger),
            retry: RetrySettings::default(),
            sleep_fn: tokio_sleep(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn StageLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Replace how the pipeline waits between retries
    pub fn with_sleep(mut self, sleep_fn: SleepFn) -> Self {
        self.sleep_fn = sleep_fn;
        self
    }

    /// Run every stage for `request`
    pub async fn run(&self, request: &DeploymentRequest) -> Result<DeploymentSummary, ProvisionError> {
        validate(request)?;

        let prepared = self.prepare(request).await?;
        let authorized = self.authorize(request, prepared).await?;
        let deployed = self.deploy_function(request, authorized).await?;
        let exposed = self.expose(request, deployed).await?;
        self.persist(request, exposed).await
    }

    async fn prepare(&self, request: &DeploymentRequest) -> Result<Prepared, ProvisionError> {
        let preparer = &self.collaborators.preparer;

        self.logger.log_stage(&Stage::LoadingPackageConfig);
        let metadata = preparer
            .resolve_metadata(
                &request.source,
                request.name.as_deref(),
                request.description.as_deref(),
            )
            .await?;

        self.logger.log_stage(&Stage::PackagingProject);
        let package = preparer
            .package(&request.source, request.use_local_dependencies)
            .await?;

        self.logger.log_stage(&Stage::ValidatingPackage);
        validate_package(
            package.staging_dir(),
            request.handler(),
            request.api_module(),
        )?;

        Ok(Prepared { metadata, package })
    }

    async fn authorize(
        &self,
        request: &DeploymentRequest,
        prepared: Prepared,
    ) -> Result<Authorized, ProvisionError> {
        let policy_files = match &request.policies {
            Some(pattern) => policy_files(pattern)?,
            None => Vec::new(),
        };
        let plan = IdentityPlan {
            existing_role: request.role.clone(),
            policy_files,
            allow_recursion: request.allow_recursion,
        };

        self.logger.log_stage(&Stage::InitialisingRole);
        let identity = provision_identity(
            self.collaborators.identity.as_ref(),
            self.logger.as_ref(),
            &prepared.metadata.name,
            request.region(),
            &plan,
        )
        .await?;

        Ok(Authorized { prepared, identity })
    }

    async fn deploy_function(
        &self,
        request: &DeploymentRequest,
        authorized: Authorized,
    ) -> Result<Deployed, ProvisionError> {
        let Authorized { prepared, identity } = authorized;
        let Prepared { metadata, package } = prepared;

        let create = function_request(
            request,
            &metadata.name,
            metadata.description.as_deref(),
            package.archive,
            &identity.arn,
        );
        let function = create_function(
            self.collaborators.compute.as_ref(),
            self.logger.as_ref(),
            &self.retry.role_propagation,
            &self.sleep_fn,
            &create,
        )
        .await?;

        let function = mark_aliases(
            self.collaborators.compute.as_ref(),
            self.logger.as_ref(),
            function,
            request.version.as_deref(),
        )
        .await?;

        Ok(Deployed {
            identity,
            function,
            staging: package.staging,
        })
    }

    async fn expose(
        &self,
        request: &DeploymentRequest,
        deployed: Deployed,
    ) -> Result<Exposed, ProvisionError> {
        let Some(module) = request.api_module() else {
            return Ok(Exposed {
                deployed,
                gateway: None,
            });
        };

        let gateway: Arc<dyn GatewayApi> = Arc::new(ThrottledGateway::new(
            self.collaborators.gateway.clone(),
            self.retry.throttling,
            self.sleep_fn.clone(),
            self.logger.clone(),
        ));
        let created = provision_gateway(
            gateway,
            self.collaborators.modules.as_ref(),
            self.logger.as_ref(),
            request,
            &deployed.function,
            module,
            deployed.staging.path(),
        )
        .await?;

        Ok(Exposed {
            deployed,
            gateway: Some(created),
        })
    }

    async fn persist(
        &self,
        request: &DeploymentRequest,
        exposed: Exposed,
    ) -> Result<DeploymentSummary, ProvisionError> {
        let Exposed { deployed, gateway } = exposed;
        let config_file = File::new(request.config_path());

        let summary = save_config(
            self.logger.as_ref(),
            &config_file,
            &deployed.identity,
            &deployed.function,
            request.region(),
            gateway,
        )
        .await?;

        info!(
            "Provisioned {} with role {}",
            summary.lambda.name, summary.lambda.role
        );
        Ok(summary)
    }
}
