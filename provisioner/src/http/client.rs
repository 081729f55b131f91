//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use cloud_models::ErrorResponse;

use crate::cloud::{ROLE_NOT_ASSUMABLE_MESSAGE, THROTTLING_ERROR_CODE};
use crate::errors::ProvisionError;
use crate::storage::settings::BackendSettings;

/// HTTP client for the function control plane
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProvisionError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ProvisionError::ConfigError(format!("Invalid backend URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProvisionError::ConfigError(format!(
                "Invalid backend URL {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Create a client from the backend settings
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, ProvisionError> {
        let mut client = Self::new(
            &settings.base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        client.token = settings.token.clone();
        Ok(client)
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `segments` below the base URL, each segment percent-encoded
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ProvisionError> {
        self.send::<T, ()>(Method::GET, segments, None).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ProvisionError> {
        self.send(Method::POST, segments, Some(body)).await
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ProvisionError> {
        self.send(Method::PUT, segments, Some(body)).await
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ProvisionError> {
        let url = self.url(segments);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("HTTP {} {} failed: {} - {}", method, url, status, text);
            return Err(classify_error(status, &text));
        }

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// Map a failed response onto the provisioner's error taxonomy
pub fn classify_error(status: StatusCode, body: &str) -> ProvisionError {
    let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(err) => (err.error, err.message),
        None => (String::new(), body.to_string()),
    };

    if status == StatusCode::TOO_MANY_REQUESTS || code == THROTTLING_ERROR_CODE {
        return ProvisionError::Throttled(message);
    }
    if message == ROLE_NOT_ASSUMABLE_MESSAGE {
        return ProvisionError::RoleNotAssumable(message);
    }
    if status == StatusCode::NOT_FOUND {
        return ProvisionError::NotFound(message);
    }

    let detail = if code.is_empty() {
        format!("{}: {}", status, message)
    } else {
        format!("{} ({}): {}", status, code, message)
    };
    ProvisionError::RemoteError(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error() {
        assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, "").is_throttling());
        assert!(classify_error(
            StatusCode::BAD_REQUEST,
            r#"{"code": "TooManyRequestsException", "message": "slow down"}"#
        )
        .is_throttling());
        assert!(classify_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "InvalidParameterValueException", "message": "The role defined for the function cannot be assumed by Lambda."}"#
        )
        .is_role_propagation());
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, r#"{"message": "no such alias"}"#),
            ProvisionError::NotFound(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            ProvisionError::RemoteError(_)
        ));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let client = HttpClient::new("http://localhost:4566/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url(&["roles", "my role"]).as_str(),
            "http://localhost:4566/api/roles/my%20role"
        );
    }
}
