//! Role API client

use async_trait::async_trait;
use cloud_models::{CreateRoleRequest, PutRolePolicyRequest, Role, RoleResponse};

use crate::cloud::IdentityApi;
use crate::errors::ProvisionError;
use crate::http::client::HttpClient;
use crate::models::resources::IdentityMetadata;

fn to_identity(role: Role) -> IdentityMetadata {
    IdentityMetadata {
        name: role.role_name,
        arn: role.arn,
        policies: Vec::new(),
    }
}

#[async_trait]
impl IdentityApi for HttpClient {
    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> Result<IdentityMetadata, ProvisionError> {
        let body = CreateRoleRequest {
            role_name: role_name.to_string(),
            assume_role_policy_document: trust_policy.to_string(),
        };
        let response: RoleResponse = self.post(&["roles"], &body).await?;
        Ok(to_identity(response.role))
    }

    async fn get_role(&self, role_name: &str) -> Result<IdentityMetadata, ProvisionError> {
        let response: RoleResponse = self.get(&["roles", role_name]).await?;
        Ok(to_identity(response.role))
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProvisionError> {
        let body = PutRolePolicyRequest {
            policy_name: policy_name.to_string(),
            policy_document: policy_document.to_string(),
        };
        let _: serde_json::Value = self
            .put(&["roles", role_name, "policies", policy_name], &body)
            .await?;
        Ok(())
    }
}
