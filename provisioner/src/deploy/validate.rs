//! Local preconditions checked before any remote call

use std::path::Path;

use crate::deploy::policies::policy_files;
use crate::errors::ProvisionError;
use crate::models::request::{DeploymentRequest, PROJECT_DESCRIPTOR};

pub const MIN_MEMORY_MB: u32 = 128;
pub const MAX_MEMORY_MB: u32 = 1536;
pub const MEMORY_STEP_MB: u32 = 64;
pub const MIN_TIMEOUT_SECS: u32 = 1;
pub const MAX_TIMEOUT_SECS: u32 = 300;

/// Return the first violated precondition, if any.
///
/// Rules are checked in a fixed order so that the user always sees the same
/// message for the same input.
pub fn validation_error(request: &DeploymentRequest) -> Option<String> {
    if is_temp_dir(&request.source) {
        return Some(
            "Source directory is the system temp directory. Cowardly refusing to fill up disk with recursive copy."
                .to_string(),
        );
    }
    if is_blank(&request.region) {
        return Some("AWS region is missing. please specify with --region".to_string());
    }
    if request.handler().is_none() && request.api_module().is_none() {
        return Some("Lambda handler is missing. please specify with --handler".to_string());
    }
    if request.handler().is_some_and(has_separator) {
        return Some("Lambda handler module has to be in the main project directory".to_string());
    }
    if request.api_module().is_some_and(has_separator) {
        return Some("API module has to be in the main project directory".to_string());
    }

    if request.config_path().exists() {
        return Some(match &request.config {
            Some(config) => format!("{} already exists", config.display()),
            None => "claudia.json already exists in the source folder".to_string(),
        });
    }
    if !request.source.join(PROJECT_DESCRIPTOR).exists() {
        return Some("package.json does not exist in the source folder".to_string());
    }
    if let Some(policies) = &request.policies {
        let found = policy_files(policies).map(|files| !files.is_empty()).unwrap_or(false);
        if !found {
            return Some(format!("no files match additional policies ({})", policies));
        }
    }

    if let Some(memory) = request.memory {
        if memory < MIN_MEMORY_MB {
            return Some(format!(
                "the memory value provided must be greater than or equal to {}",
                MIN_MEMORY_MB
            ));
        }
        if memory > MAX_MEMORY_MB {
            return Some(format!(
                "the memory value provided must be less than or equal to {}",
                MAX_MEMORY_MB
            ));
        }
        if memory % MEMORY_STEP_MB != 0 {
            return Some(format!(
                "the memory value provided must be a multiple of {}",
                MEMORY_STEP_MB
            ));
        }
    }
    if let Some(timeout) = request.timeout {
        if timeout < MIN_TIMEOUT_SECS {
            return Some(format!(
                "the timeout value provided must be greater than or equal to {}",
                MIN_TIMEOUT_SECS
            ));
        }
        if timeout > MAX_TIMEOUT_SECS {
            return Some(format!(
                "the timeout value provided must be less than or equal to {}",
                MAX_TIMEOUT_SECS
            ));
        }
    }

    None
}

/// Fail with a [`ProvisionError::ValidationError`] on the first violated rule
pub fn validate(request: &DeploymentRequest) -> Result<(), ProvisionError> {
    match validation_error(request) {
        Some(message) => Err(ProvisionError::ValidationError(message)),
        None => Ok(()),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn has_separator(module: &str) -> bool {
    module.contains('/') || module.contains(std::path::MAIN_SEPARATOR)
}

fn is_temp_dir(source: &Path) -> bool {
    let temp = std::env::temp_dir();
    if source == temp {
        return true;
    }
    match (source.canonicalize(), temp.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"name": "hello"}"#).unwrap();
        dir
    }

    fn request(dir: &Path) -> DeploymentRequest {
        DeploymentRequest {
            region: Some("us-east-1".to_string()),
            handler: Some("main.handler".to_string()),
            ..DeploymentRequest::new(dir)
        }
    }

    #[test]
    fn test_valid_request() {
        let dir = project();
        assert_eq!(validation_error(&request(dir.path())), None);
    }

    #[test]
    fn test_rejects_temp_dir() {
        let mut req = request(Path::new("/unused"));
        req.source = std::env::temp_dir();
        assert!(validation_error(&req).unwrap().starts_with("Source directory is the system temp directory"));
    }

    #[test]
    fn test_memory_bounds() {
        let dir = project();
        let check = |memory: u32| {
            let req = DeploymentRequest {
                memory: Some(memory),
                ..request(dir.path())
            };
            validation_error(&req)
        };

        assert_eq!(
            check(0).unwrap(),
            "the memory value provided must be greater than or equal to 128"
        );
        assert_eq!(
            check(1600).unwrap(),
            "the memory value provided must be less than or equal to 1536"
        );
        assert_eq!(check(200).unwrap(), "the memory value provided must be a multiple of 64");
        for valid in (128..=1536).step_by(64) {
            assert_eq!(check(valid), None);
        }
    }

    #[test]
    fn test_timeout_bounds() {
        let dir = project();
        let check = |timeout: u32| {
            let req = DeploymentRequest {
                timeout: Some(timeout),
                ..request(dir.path())
            };
            validation_error(&req)
        };

        assert_eq!(
            check(0).unwrap(),
            "the timeout value provided must be greater than or equal to 1"
        );
        assert_eq!(
            check(301).unwrap(),
            "the timeout value provided must be less than or equal to 300"
        );
        assert_eq!(check(1), None);
        assert_eq!(check(300), None);
    }
}
