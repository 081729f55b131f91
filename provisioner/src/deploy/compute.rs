//! Function creation

use cloud_models::{CreateFunctionRequest, FunctionCode};
use tracing::{debug, info};

use crate::cloud::ComputeApi;
use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::models::request::DeploymentRequest;
use crate::models::resources::ComputeResource;
use crate::retry::{retry_with_predicate, RetryPolicy, SleepFn};
use crate::utils::sha256_hash;

/// Build the creation payload; a new revision is always published
pub fn function_request(
    request: &DeploymentRequest,
    function_name: &str,
    description: Option<&str>,
    archive: Vec<u8>,
    role_arn: &str,
) -> CreateFunctionRequest {
    CreateFunctionRequest {
        code: FunctionCode { zip_file: archive },
        function_name: function_name.to_string(),
        description: description.map(str::to_string),
        memory_size: request.memory(),
        timeout: request.timeout(),
        handler: request.function_handler(),
        role: role_arn.to_string(),
        runtime: request.runtime().to_string(),
        publish: true,
    }
}

/// Create the function, waiting out role propagation.
///
/// A freshly created role may not be assumable yet; only that failure is
/// retried, within `policy`.
pub async fn create_function(
    api: &dyn ComputeApi,
    logger: &dyn StageLogger,
    policy: &RetryPolicy,
    sleep_fn: &SleepFn,
    request: &CreateFunctionRequest,
) -> Result<ComputeResource, ProvisionError> {
    debug!(
        "Function code: {} bytes, sha256 {}",
        request.code.zip_file.len(),
        sha256_hash(&request.code.zip_file)
    );

    let resource = retry_with_predicate(
        policy,
        || {
            logger.log_stage(&Stage::CreatingFunction);
            logger.log_api_call("lambda", "createFunction");
            api.create_function(request)
        },
        ProvisionError::is_role_propagation,
        || logger.log_stage(&Stage::WaitingForRolePropagation),
        sleep_fn,
    )
    .await?;

    info!("Created function {} version {}", resource.name, resource.version);
    Ok(resource)
}
