//! Provisioned resources and the records written after a deployment

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Execution role of the function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMetadata {
    pub name: String,
    pub arn: String,

    /// Inline policies attached during this run, in attachment order
    #[serde(default)]
    pub policies: Vec<String>,
}

/// The provisioned function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResource {
    pub name: String,
    pub description: Option<String>,

    /// Revision published by this run
    pub version: String,

    /// Alias name -> revision
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Named pointer to a function revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub version: String,
}

/// Web API fronting the function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResource {
    pub id: String,
    pub module: String,

    /// Public URL of the deployed stage
    pub url: String,

    /// Whatever the module's post-deploy hook returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<serde_json::Value>,
}

/// Build the public URL of a deployed web API stage
pub fn gateway_url(api_id: &str, region: &str, stage: &str) -> String {
    format!("https://{}.execute-api.{}.amazonaws.com/{}", api_id, region, stage)
}

/// Function section of the config file and the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaRecord {
    pub role: String,
    pub name: String,
    pub region: String,
}

/// Web API section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRecord {
    pub id: String,
    pub module: String,
}

/// Durable record written once at the end of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub lambda: LambdaRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiRecord>,
}

/// What the caller gets back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub lambda: LambdaRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<GatewayResource>,
}
