//! Execution role provisioning

use std::path::PathBuf;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::cloud::IdentityApi;
use crate::deploy::policies::policy_name;
use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::models::resources::IdentityMetadata;

/// Trust policy letting the function service assume the role
pub const EXECUTOR_TRUST_POLICY: &str = include_str!("../../templates/lambda-executor-policy.json");

/// Baseline policy allowing the function to write its logs
pub const LOG_WRITER_POLICY: &str = include_str!("../../templates/log-writer.json");

pub const LOG_WRITER_POLICY_NAME: &str = "log-writer";
pub const RECURSION_POLICY_NAME: &str = "recursive-execution";

/// What the role must allow
#[derive(Debug, Clone, Default)]
pub struct IdentityPlan {
    /// Reuse this role as-is instead of creating one
    pub existing_role: Option<String>,

    /// Additional policy documents to attach
    pub policy_files: Vec<PathBuf>,

    /// Let the function invoke itself
    pub allow_recursion: bool,
}

/// Role name for a function
pub fn executor_role_name(function_name: &str) -> String {
    format!("{}-executor", function_name)
}

/// Policy allowing a function to invoke itself, and nothing else
pub fn recursion_policy(function_name: &str, region: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "InvokePermission",
            "Effect": "Allow",
            "Action": ["lambda:InvokeFunction"],
            "Resource": format!("arn:aws:lambda:{}:*:function:{}", region, function_name),
        }]
    })
    .to_string()
}

/// Create or reuse the execution role of `function_name`
pub async fn provision_identity(
    api: &dyn IdentityApi,
    logger: &dyn StageLogger,
    function_name: &str,
    region: &str,
    plan: &IdentityPlan,
) -> Result<IdentityMetadata, ProvisionError> {
    if let Some(role_name) = &plan.existing_role {
        info!("Reusing existing role {}", role_name);
        logger.log_api_call("iam", "getRole");
        return api.get_role(role_name).await;
    }

    let role_name = executor_role_name(function_name);
    logger.log_api_call("iam", "createRole");
    let mut identity = api.create_role(&role_name, EXECUTOR_TRUST_POLICY).await?;
    info!("Created role {} ({})", identity.name, identity.arn);

    logger.log_api_call("iam", "putRolePolicy");
    api.put_role_policy(&identity.name, LOG_WRITER_POLICY_NAME, LOG_WRITER_POLICY)
        .await?;
    identity.policies.push(LOG_WRITER_POLICY_NAME.to_string());

    if !plan.policy_files.is_empty() {
        logger.log_stage(&Stage::AttachingPolicies);
    }
    let extra = attach_policy_files(api, logger, &identity.name, &plan.policy_files).await?;
    identity.policies.extend(extra);

    if plan.allow_recursion {
        logger.log_api_call("iam", "putRolePolicy");
        api.put_role_policy(
            &identity.name,
            RECURSION_POLICY_NAME,
            &recursion_policy(function_name, region),
        )
        .await?;
        identity.policies.push(RECURSION_POLICY_NAME.to_string());
    }

    Ok(identity)
}

/// Attach every policy file concurrently; the first failure wins
async fn attach_policy_files(
    api: &dyn IdentityApi,
    logger: &dyn StageLogger,
    role_name: &str,
    files: &[PathBuf],
) -> Result<Vec<String>, ProvisionError> {
    let attachments = files.iter().map(|path| async move {
        let name = policy_name(path);
        let document = File::new(path).read_string().await?;
        debug!("Attaching policy {} from {}", name, path.display());
        logger.log_api_call("iam", "putRolePolicy");
        api.put_role_policy(role_name, &name, &document).await?;
        Ok::<_, ProvisionError>(name)
    });

    try_join_all(attachments).await
}
