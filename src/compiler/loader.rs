// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::YiniError;

/// Where `[#include]` entries are read from.
pub trait FileLoader {
    fn exists(&self, path: &str) -> bool;
    fn load(&self, path: &str) -> Result<String, YiniError>;
}

/// Reads from the local filesystem. Relative paths are taken against
/// `base_dir`; a leading `~/` is expanded to the home directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    base_dir: PathBuf,
}

impl FsLoader {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Expand "~/" and resolve relative paths against base_dir.
    pub fn resolve_path(&self, raw_path: &str) -> Result<PathBuf, YiniError> {
        let mut p = if let Some(rest) = raw_path.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| YiniError::FileError {
                message: "Could not determine home directory for ~ expansion".into(),
                path: raw_path.to_string(),
                hint: Some("Set HOME or use an absolute include path".into()),
                code: Some(300),
            })?;
            home.join(rest)
        } else {
            PathBuf::from(raw_path)
        };

        if p.is_relative() {
            p = self.base_dir.join(p);
        }
        Ok(p)
    }
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileLoader for FsLoader {
    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn load(&self, path: &str) -> Result<String, YiniError> {
        let full = self.resolve_path(path)?;
        fs::read_to_string(&full).map_err(|e| YiniError::FileError {
            message: format!("Failed to read file: {}", e),
            path: full.to_string_lossy().to_string(),
            hint: Some("Check that the file exists and is readable".into()),
            code: Some(301),
        })
    }
}

/// In-memory files keyed by path, for tests and embedded configs.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileLoader for MemoryLoader {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn load(&self, path: &str) -> Result<String, YiniError> {
        self.files.get(path).cloned().ok_or_else(|| YiniError::FileError {
            message: "No such file".into(),
            path: path.to_string(),
            hint: None,
            code: Some(301),
        })
    }
}
