//! Alias management

use tracing::info;

use crate::cloud::ComputeApi;
use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::models::request::LATEST_ALIAS;
use crate::models::resources::ComputeResource;

/// Point `latest`, and the requested named alias if any, at the new revision
pub async fn mark_aliases(
    api: &dyn ComputeApi,
    logger: &dyn StageLogger,
    mut resource: ComputeResource,
    named_alias: Option<&str>,
) -> Result<ComputeResource, ProvisionError> {
    logger.log_stage(&Stage::CreatingAliases);

    let mut names = vec![LATEST_ALIAS];
    if let Some(name) = named_alias.filter(|name| *name != LATEST_ALIAS) {
        names.push(name);
    }

    for name in names {
        logger.log_api_call("lambda", "updateAlias");
        let alias = api.upsert_alias(&resource.name, name, &resource.version).await?;
        info!("Alias {} -> version {}", alias.name, alias.version);
        resource.aliases.insert(alias.name, alias.version);
    }

    Ok(resource)
}
