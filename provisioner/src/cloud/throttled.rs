//! Rate-limit aware web API client

use std::sync::Arc;

use async_trait::async_trait;
use cloud_models::RebuildApiRequest;

use crate::cloud::GatewayApi;
use crate::deploy::stage::{Stage, StageLogger};
use crate::errors::ProvisionError;
use crate::retry::{retry_with_predicate, RetryPolicy, SleepFn};

/// Wraps a [`GatewayApi`] so that every call is retried while the backend
/// answers with a rate-limit error. Other failures pass straight through.
pub struct ThrottledGateway {
    inner: Arc<dyn GatewayApi>,
    policy: RetryPolicy,
    sleep_fn: SleepFn,
    logger: Arc<dyn StageLogger>,
}

impl ThrottledGateway {
    pub fn new(
        inner: Arc<dyn GatewayApi>,
        policy: RetryPolicy,
        sleep_fn: SleepFn,
        logger: Arc<dyn StageLogger>,
    ) -> Self {
        Self {
            inner,
            policy,
            sleep_fn,
            logger,
        }
    }
}

#[async_trait]
impl GatewayApi for ThrottledGateway {
    async fn create_rest_api(&self, name: &str) -> Result<String, ProvisionError> {
        self.logger.log_api_call("apigateway", "createRestApi");
        retry_with_predicate(
            &self.policy,
            || self.inner.create_rest_api(name),
            ProvisionError::is_throttling,
            || self.logger.log_stage(&Stage::RateLimited),
            &self.sleep_fn,
        )
        .await
    }

    async fn rebuild_and_deploy(
        &self,
        api_id: &str,
        request: &RebuildApiRequest,
    ) -> Result<(), ProvisionError> {
        self.logger.log_api_call("apigateway", "rebuildWebApi");
        retry_with_predicate(
            &self.policy,
            || self.inner.rebuild_and_deploy(api_id, request),
            ProvisionError::is_throttling,
            || self.logger.log_stage(&Stage::RateLimited),
            &self.sleep_fn,
        )
        .await
    }
}
