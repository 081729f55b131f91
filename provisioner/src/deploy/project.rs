//! Local project preparation: metadata resolution and packaging

use std::path::Path;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::ProvisionError;
use crate::filesys::file::File;
use crate::models::request::PROJECT_DESCRIPTOR;

/// Name and description of the function, resolved from the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    pub description: Option<String>,
}

/// Deployable artifact plus the directory it was built from
///
/// The staged copy lives as long as this value and is removed on drop.
#[derive(Debug)]
pub struct PackagedProject {
    /// Opaque archive bytes uploaded as function code
    pub archive: Vec<u8>,

    /// Staged copy of the project; API modules are loaded from here
    pub staging: TempDir,
}

impl PackagedProject {
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

/// Turns a project directory into something deployable
#[async_trait]
pub trait ProjectPreparer: Send + Sync {
    async fn resolve_metadata(
        &self,
        source: &Path,
        name_override: Option<&str>,
        description_override: Option<&str>,
    ) -> Result<ProjectMetadata, ProvisionError>;

    async fn package(
        &self,
        source: &Path,
        use_local_dependencies: bool,
    ) -> Result<PackagedProject, ProvisionError>;
}

#[derive(Debug, Deserialize)]
struct PackageDescriptor {
    name: Option<String>,
    description: Option<String>,
}

/// Stages the project under the system temp dir and archives it as tar.gz
#[derive(Debug, Clone, Default)]
pub struct LocalProjectPreparer;

impl LocalProjectPreparer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProjectPreparer for LocalProjectPreparer {
    async fn resolve_metadata(
        &self,
        source: &Path,
        name_override: Option<&str>,
        description_override: Option<&str>,
    ) -> Result<ProjectMetadata, ProvisionError> {
        let descriptor: PackageDescriptor =
            File::new(source.join(PROJECT_DESCRIPTOR)).read_json().await?;

        let name = non_empty(name_override).or_else(|| non_empty(descriptor.name.as_deref()));
        let description = non_empty(description_override)
            .or_else(|| non_empty(descriptor.description.as_deref()));

        match name {
            Some(name) => Ok(ProjectMetadata { name, description }),
            None => Err(ProvisionError::ProjectError(
                "project name is missing. please specify with --name or in package.json"
                    .to_string(),
            )),
        }
    }

    async fn package(
        &self,
        source: &Path,
        use_local_dependencies: bool,
    ) -> Result<PackagedProject, ProvisionError> {
        let source = source.to_path_buf();

        let (archive, staging) = tokio::task::spawn_blocking(move || {
            let staging = tempfile::Builder::new()
                .prefix("provision-package-")
                .tempdir()?;
            stage_project(&source, staging.path(), use_local_dependencies)?;
            let archive = archive_dir(staging.path())?;
            Ok::<_, ProvisionError>((archive, staging))
        })
        .await
        .map_err(|e| ProvisionError::Internal(format!("Packaging task failed: {}", e)))??;

        debug!(
            "Packaged {} bytes from {}",
            archive.len(),
            staging.path().display()
        );

        Ok(PackagedProject { archive, staging })
    }
}

/// Check that the entry module named by the request exists in the staged package
pub fn validate_package(
    staging_dir: &Path,
    handler: Option<&str>,
    api_module: Option<&str>,
) -> Result<(), ProvisionError> {
    if let Some(module) = api_module {
        let manifest = crate::deploy::module::manifest_path(staging_dir, module);
        if !manifest.is_file() {
            return Err(ProvisionError::ProjectError(format!(
                "API module {} does not exist in the package ({} not found)",
                module,
                manifest.display()
            )));
        }
        return Ok(());
    }

    if let Some(handler) = handler {
        let module = handler.rsplit_once('.').map(|(module, _)| module).unwrap_or(handler);
        if !staging_dir.join(format!("{}.js", module)).is_file() {
            return Err(ProvisionError::ProjectError(format!(
                "{}.js does not exist in the source directory",
                module
            )));
        }
    }

    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_excluded(relative: &Path, use_local_dependencies: bool) -> bool {
    match relative.components().next() {
        Some(first) => {
            let first = first.as_os_str();
            first == ".git" || (!use_local_dependencies && first == "node_modules")
        }
        None => false,
    }
}

fn stage_project(
    source: &Path,
    staging_dir: &Path,
    use_local_dependencies: bool,
) -> Result<(), ProvisionError> {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(source)
                .map(|relative| !is_excluded(relative, use_local_dependencies))
                .unwrap_or(false)
        });

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ProvisionError::Internal(e.to_string()))?;
        let target = staging_dir.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn archive_dir(dir: &Path) -> Result<Vec<u8>, ProvisionError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", dir)?;
    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}
