//! Function API client

use async_trait::async_trait;
use cloud_models::{
    AliasConfiguration, CreateAliasRequest, CreateFunctionRequest, FunctionConfiguration,
    UpdateAliasRequest,
};
use tracing::debug;

use crate::cloud::ComputeApi;
use crate::errors::ProvisionError;
use crate::http::client::HttpClient;
use crate::models::resources::{Alias, ComputeResource};

#[async_trait]
impl ComputeApi for HttpClient {
    async fn create_function(
        &self,
        request: &CreateFunctionRequest,
    ) -> Result<ComputeResource, ProvisionError> {
        let config: FunctionConfiguration = self.post(&["functions"], request).await?;
        Ok(ComputeResource {
            name: config.function_name,
            description: config.description,
            version: config.version,
            aliases: Default::default(),
        })
    }

    async fn upsert_alias(
        &self,
        function_name: &str,
        alias: &str,
        version: &str,
    ) -> Result<Alias, ProvisionError> {
        let update = UpdateAliasRequest {
            function_version: version.to_string(),
        };
        let result: Result<AliasConfiguration, _> = self
            .put(&["functions", function_name, "aliases", alias], &update)
            .await;

        let config = match result {
            Ok(config) => config,
            Err(ProvisionError::NotFound(_)) => {
                debug!("Alias {} does not exist yet, creating it", alias);
                let create = CreateAliasRequest {
                    name: alias.to_string(),
                    function_version: version.to_string(),
                };
                self.post(&["functions", function_name, "aliases"], &create)
                    .await?
            }
            Err(e) => return Err(e),
        };

        Ok(Alias {
            name: config.name,
            version: config.function_version,
        })
    }
}
