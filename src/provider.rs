//! File access used to load configuration files and their siblings.
//!
//! The resolver never touches the filesystem itself; every existence check
//! and read goes through a [`FileProvider`]. [`FsProvider`] reads from disk,
//! [`MemoryProvider`] serves files from a map and counts reads.

use crate::error::{CfgError, CfgResult};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Source of configuration file content.
pub trait FileProvider {
    /// Absolute, normalized form of `path`, used as the cache key.
    fn resolve(&self, path: &Path) -> PathBuf;

    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> CfgResult<String>;
}

/// Reads files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvider;

impl FileProvider for FsProvider {
    fn resolve(&self, path: &Path) -> PathBuf {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };
        normalize_path_components(&absolute)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> CfgResult<String> {
        std::fs::read_to_string(path).map_err(|e| CfgError::io(path, e))
    }
}

/// Serves files from memory. Relative paths are taken from `/`.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    files: HashMap<PathBuf, String>,
    reads: Cell<usize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder pattern).
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let key = self.resolve(path.as_ref());
        self.files.insert(key, content.into());
    }

    /// Number of successful reads so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl FileProvider for MemoryProvider {
    fn resolve(&self, path: &Path) -> PathBuf {
        normalize_path_components(&Path::new("/").join(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&self.resolve(path))
    }

    fn read(&self, path: &Path) -> CfgResult<String> {
        let content = self
            .files
            .get(&self.resolve(path))
            .cloned()
            .ok_or_else(|| CfgError::file_not_found(path))?;
        self.reads.set(self.reads.get() + 1);
        Ok(content)
    }
}

/// Resolve `.` and `..` without touching the filesystem.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(Component::ParentDir);
                }
            }
        }
    }

    components.iter().collect()
}
