//! Fetches a rules config from disk or from inside a repository.
//!
//! The engine itself never opens repositories; when a rules path is a
//! `file://` URL pointing into one, resolution goes through the
//! [`ReposLocator`] / [`ReposFs`] seam the embedding server implements.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::AuthzError;

/// Kind of node a repository path resolves to at the youngest revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    None,
    File,
    Directory,
}

/// Read-only view of one repository at its youngest revision.
pub trait ReposFs {
    fn check_path(&self, fs_path: &str) -> Result<NodeKind, AuthzError>;

    fn file_contents(&self, fs_path: &str) -> Result<String, AuthzError>;
}

/// Locates the repository containing an on-disk path and opens it
/// read-only.  Returns `None` when no repository contains the path.
pub trait ReposLocator {
    fn open(&self, dirent: &Path) -> Option<(PathBuf, Box<dyn ReposFs>)>;
}

/// Retrieve and parse the rules config named by `path`.  `file://` URLs
/// resolve inside a repository via `locator`; plain paths load from disk.
/// A missing target yields an empty config unless `must_exist` is set.
pub fn retrieve(
    locator: Option<&dyn ReposLocator>,
    path: &str,
    must_exist: bool,
) -> Result<Config, AuthzError> {
    match path.strip_prefix("file://") {
        Some(dirent) => {
            let Some(locator) = locator else {
                return Err(AuthzError::ReposNotFound(dirent.to_string()));
            };
            retrieve_repo(locator, Path::new(dirent), must_exist)
        }
        None => retrieve_file(Path::new(path), must_exist),
    }
}

/// Load a rules config from a plain file.
pub fn retrieve_file(path: &Path, must_exist: bool) -> Result<Config, AuthzError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound && !must_exist => {
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(AuthzError::RulesLoad {
                path: path.display().to_string(),
                source,
            });
        }
    };

    Config::parse(&text).map_err(|source| AuthzError::InvalidRulesFile {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

/// Resolve `dirent` inside the repository that contains it and parse the
/// file found there.
pub fn retrieve_repo(
    locator: &dyn ReposLocator,
    dirent: &Path,
    must_exist: bool,
) -> Result<Config, AuthzError> {
    let Some((root, fs)) = locator.open(dirent) else {
        return Err(AuthzError::ReposNotFound(dirent.display().to_string()));
    };

    let Ok(rel) = dirent.strip_prefix(&root) else {
        return Err(AuthzError::ReposNotFound(dirent.display().to_string()));
    };
    if rel.as_os_str().is_empty() {
        return Err(AuthzError::IllegalTarget(format!(
            "'/' is not a file in repo '{}'",
            root.display()
        )));
    }
    let fs_path = format!("/{}", rel.to_string_lossy());

    match fs.check_path(&fs_path)? {
        NodeKind::None if !must_exist => Ok(Config::default()),
        NodeKind::None => Err(AuthzError::IllegalTarget(format!(
            "'{fs_path}' path not found in repo '{}'",
            root.display()
        ))),
        NodeKind::Directory => Err(AuthzError::IllegalTarget(format!(
            "'{fs_path}' is not a file in repo '{}'",
            root.display()
        ))),
        NodeKind::File => {
            let text = fs.file_contents(&fs_path)?;
            Config::parse(&text).map_err(|source| AuthzError::InvalidRulesFile {
                path: format!("{fs_path} in repo '{}'", root.display()),
                source: Box::new(source),
            })
        }
    }
}
