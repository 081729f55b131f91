//! Web API provisioning

use std::path::Path;
use std::sync::Arc;

use cloud_models::RebuildApiRequest;
use tracing::info;

use crate::cloud::GatewayApi;
use crate::deploy::module::{
    load_api_config, run_post_deploy, ModuleLoader, PostDeployCapabilities, PostDeployContext,
};
use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::models::request::DeploymentRequest;
use crate::models::resources::{gateway_url, ComputeResource, GatewayResource};

/// Create the web API for `function`, deploy its routes on the alias stage,
/// then run the module's post-deploy step.
///
/// `gateway` is expected to already retry on rate limiting.
pub async fn provision_gateway(
    gateway: Arc<dyn GatewayApi>,
    loader: &dyn ModuleLoader,
    logger: &dyn StageLogger,
    request: &DeploymentRequest,
    function: &ComputeResource,
    module: &str,
    staging_dir: &Path,
) -> Result<GatewayResource, ProvisionError> {
    let alias = request.alias();
    let region = request.region();

    logger.log_stage(&Stage::CreatingRestApi);
    let (api_module, api_config) = load_api_config(loader, staging_dir, module).await?;

    let api_id = gateway.create_rest_api(&function.name).await?;
    let url = gateway_url(&api_id, region, alias);
    info!("Created REST API {} for {}", api_id, function.name);

    logger.log_stage(&Stage::RebuildingRestApi);
    let rebuild = RebuildApiRequest {
        function_name: function.name.clone(),
        stage_name: alias.to_string(),
        region: region.to_string(),
        api_config,
    };
    gateway.rebuild_and_deploy(&api_id, &rebuild).await?;
    info!("Deployed {} routes to stage {}", rebuild.api_config.method_count(), alias);

    logger.log_stage(&Stage::RunningPostDeploy);
    let context = PostDeployContext {
        name: function.name.clone(),
        alias: alias.to_string(),
        api_id: api_id.clone(),
        api_url: url.clone(),
        region: region.to_string(),
    };
    let capabilities = PostDeployCapabilities { gateway };
    let deploy = run_post_deploy(api_module.as_ref(), module, request, &context, &capabilities).await?;

    Ok(GatewayResource {
        id: api_id,
        module: module.to_string(),
        url,
        deploy,
    })
}
