//! Web API client

use async_trait::async_trait;
use cloud_models::{CreateRestApiRequest, RebuildApiRequest, RestApi};

use crate::cloud::GatewayApi;
use crate::errors::ProvisionError;
use crate::http::client::HttpClient;

#[async_trait]
impl GatewayApi for HttpClient {
    async fn create_rest_api(&self, name: &str) -> Result<String, ProvisionError> {
        let body = CreateRestApiRequest {
            name: name.to_string(),
        };
        let api: RestApi = self.post(&["restapis"], &body).await?;
        Ok(api.id)
    }

    async fn rebuild_and_deploy(
        &self,
        api_id: &str,
        request: &RebuildApiRequest,
    ) -> Result<(), ProvisionError> {
        let _: serde_json::Value = self.post(&["restapis", api_id, "rebuild"], request).await?;
        Ok(())
    }
}
