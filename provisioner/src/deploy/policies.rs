//! Discovery of additional role policy documents

use std::path::{Path, PathBuf};

use crate::errors::ProvisionError;
use crate::filesys::dir::Dir;
use crate::utils::to_identifier;

/// List the policy files named by a directory or a file pattern.
///
/// A directory yields every regular file below it. Otherwise `*` and `?` are
/// expanded in the last path component.
pub fn policy_files(pattern: &str) -> Result<Vec<PathBuf>, ProvisionError> {
    let path = Path::new(pattern);
    if path.is_dir() {
        return Dir::new(path).list_files_recursive();
    }

    let file_pattern = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return Ok(Vec::new()),
    };

    if !file_pattern.contains(['*', '?']) {
        return Ok(if path.is_file() { vec![path.to_path_buf()] } else { Vec::new() });
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        let entry_path = entry.path();
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| wildcard_match(file_pattern, name))
            .unwrap_or(false);
        if matches && entry_path.is_file() {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

/// Policy name for a policy file: its file name made identifier-safe
pub fn policy_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    to_identifier(&file_name)
}

fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
