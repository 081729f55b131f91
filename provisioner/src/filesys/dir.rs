//! Directory operations

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::errors::ProvisionError;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// List regular files below the directory, recursively, in a stable order
    pub fn list_files_recursive(&self) -> Result<Vec<PathBuf>, ProvisionError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
