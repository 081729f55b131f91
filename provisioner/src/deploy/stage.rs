//! Pipeline stages and the diagnostic sink that reports them

use std::fmt;

use tracing::{debug, info};

/// Step of the provisioning pipeline, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadingPackageConfig,
    PackagingProject,
    ValidatingPackage,
    InitialisingRole,
    AttachingPolicies,
    CreatingFunction,
    WaitingForRolePropagation,
    CreatingAliases,
    CreatingRestApi,
    RebuildingRestApi,
    RunningPostDeploy,
    RateLimited,
    SavingConfig,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::LoadingPackageConfig => "loading package config",
            Stage::PackagingProject => "packaging project",
            Stage::ValidatingPackage => "validating package",
            Stage::InitialisingRole => "initialising IAM role",
            Stage::AttachingPolicies => "attaching role policies",
            Stage::CreatingFunction => "creating Lambda",
            Stage::WaitingForRolePropagation => "waiting for IAM role propagation",
            Stage::CreatingAliases => "creating version alias",
            Stage::CreatingRestApi => "creating REST API",
            Stage::RebuildingRestApi => "rebuilding REST API routes",
            Stage::RunningPostDeploy => "running post-deploy step",
            Stage::RateLimited => "rate-limited by AWS, waiting before retry",
            Stage::SavingConfig => "saving configuration",
        };
        f.write_str(text)
    }
}

/// Receives progress from the pipeline
pub trait StageLogger: Send + Sync {
    fn log_stage(&self, stage: &Stage);

    /// A remote call is about to be made
    fn log_api_call(&self, _service: &str, _operation: &str) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl StageLogger for NullLogger {
    fn log_stage(&self, _stage: &Stage) {}
}

/// Forwards progress to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StageLogger for TracingLogger {
    fn log_stage(&self, stage: &Stage) {
        info!("{}", stage);
    }

    fn log_api_call(&self, service: &str, operation: &str) {
        debug!("{}.{}", service, operation);
    }
}
