//! Remote capabilities consumed by the pipeline
//!
//! Each trait is a black box over one control-plane service. The HTTP
//! backend implements all three; tests substitute in-memory fakes.

pub mod throttled;

use async_trait::async_trait;
use cloud_models::{CreateFunctionRequest, RebuildApiRequest};

use crate::errors::ProvisionError;
use crate::models::resources::{Alias, ComputeResource, IdentityMetadata};

/// Message the control plane returns while a fresh role is still propagating
pub const ROLE_NOT_ASSUMABLE_MESSAGE: &str =
    "The role defined for the function cannot be assumed by Lambda.";

/// Error code of a rate-limited call
pub const THROTTLING_ERROR_CODE: &str = "TooManyRequestsException";

/// Execution roles and their inline policies
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Create a role with the given trust policy
    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> Result<IdentityMetadata, ProvisionError>;

    /// Look up an existing role
    async fn get_role(&self, role_name: &str) -> Result<IdentityMetadata, ProvisionError>;

    /// Create or replace an inline policy on a role
    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProvisionError>;
}

/// Functions and their aliases
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Create a function and publish its first revision
    async fn create_function(
        &self,
        request: &CreateFunctionRequest,
    ) -> Result<ComputeResource, ProvisionError>;

    /// Point `alias` at `version`, creating the alias if needed
    async fn upsert_alias(
        &self,
        function_name: &str,
        alias: &str,
        version: &str,
    ) -> Result<Alias, ProvisionError>;
}

/// Web APIs fronting functions
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Create an empty web API, returning its id
    async fn create_rest_api(&self, name: &str) -> Result<String, ProvisionError>;

    /// Replace every route of the API and deploy the named stage
    async fn rebuild_and_deploy(
        &self,
        api_id: &str,
        request: &RebuildApiRequest,
    ) -> Result<(), ProvisionError>;
}
