//! Control-plane API models
//!
//! Request and response bodies exchanged with the function control plane.
//! Field names follow the control plane's PascalCase JSON convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRoleRequest {
    pub role_name: String,
    pub assume_role_policy_document: String,
}

/// Execution role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub role_name: String,
    pub arn: String,
}

/// Role lookup / creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleResponse {
    pub role: Role,
}

/// Inline role policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRolePolicyRequest {
    pub policy_name: String,
    pub policy_document: String,
}

/// Function code payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionCode {
    /// Artifact bytes, base64 encoded on the wire
    #[serde(with = "base64_bytes")]
    pub zip_file: Vec<u8>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("Invalid base64: {e}")))
    }
}

/// Function creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFunctionRequest {
    pub code: FunctionCode,
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub memory_size: u32,
    pub timeout: u32,
    pub handler: String,
    pub role: String,
    pub runtime: String,
    pub publish: bool,
}

/// Function configuration returned by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfiguration {
    pub function_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
}

/// Alias update request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateAliasRequest {
    pub function_version: String,
}

/// Alias creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAliasRequest {
    pub name: String,
    pub function_version: String,
}

/// Alias configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasConfiguration {
    pub name: String,
    pub function_version: String,
}

/// REST API creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRestApiRequest {
    pub name: String,
}

/// REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApi {
    pub id: String,
    pub name: String,
}

/// Route tree of a web API: path -> HTTP method -> method options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    #[serde(default)]
    pub routes: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl RouteConfig {
    /// Number of (path, method) pairs
    pub fn method_count(&self) -> usize {
        self.routes.values().map(|methods| methods.len()).sum()
    }
}

/// Full route rebuild + stage deployment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildApiRequest {
    pub function_name: String,
    pub stage_name: String,
    pub region: String,
    pub api_config: RouteConfig,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, alias = "code", alias = "__type")]
    pub error: String,
    #[serde(default, alias = "Message")]
    pub message: String,
}
