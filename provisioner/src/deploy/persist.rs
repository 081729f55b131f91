//! Writing the deployment record

use tracing::debug;

use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::models::resources::{
    ApiRecord, ComputeResource, DeploymentSummary, GatewayResource, IdentityMetadata, LambdaRecord,
    PersistedConfig,
};

/// Write the config file and build the summary returned to the caller
pub async fn save_config(
    logger: &dyn StageLogger,
    config_file: &File,
    identity: &IdentityMetadata,
    function: &ComputeResource,
    region: &str,
    gateway: Option<GatewayResource>,
) -> Result<DeploymentSummary, ProvisionError> {
    let lambda = LambdaRecord {
        role: identity.name.clone(),
        name: function.name.clone(),
        region: region.to_string(),
    };
    let config = PersistedConfig {
        lambda: lambda.clone(),
        api: gateway.as_ref().map(|api| ApiRecord {
            id: api.id.clone(),
            module: api.module.clone(),
        }),
    };

    logger.log_stage(&Stage::SavingConfig);
    config_file.write_json(&config).await?;
    debug!("Wrote {}", config_file.path().display());

    Ok(DeploymentSummary { lambda, api: gateway })
}
