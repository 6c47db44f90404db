//! Scratch directories for staging packages.
//!
//! Every import gets its own directory under the scratch root. The directory
//! is owned by a [`ScratchDir`] guard and removed when the guard drops, so
//! early returns clean up too.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::TempDir;

/// Parent directory for per-import scratch directories
#[derive(Debug, Clone)]
pub struct ScratchRoot {
    root: PathBuf,
}

impl ScratchRoot {
    /// Use `root` as the scratch parent (created on demand)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a uniquely named directory: `<namespace>-<utc timestamp>-<random>`
    pub fn create_unique_dir(&self, namespace: &str) -> std::io::Result<ScratchDir> {
        fs::create_dir_all(&self.root)?;

        let prefix = format!("{}-{}-", namespace, Utc::now().format("%Y%m%dT%H%M%S"));
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(&self.root)?;

        tracing::debug!("Created scratch directory {}", dir.path().display());
        Ok(ScratchDir { dir: Some(dir) })
    }
}

/// Exclusively owned scratch directory, deleted recursively on drop
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Directory path
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Where the package copy lives
    pub fn archive_path(&self) -> PathBuf {
        self.path().join("content.zip")
    }

    /// Package manifest path
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("h5p.json")
    }

    /// The package's `content/` directory (media paths are relative to it)
    pub fn content_dir(&self) -> PathBuf {
        self.path().join("content")
    }

    /// Delete the directory now, reporting failures
    pub fn close(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove scratch directory {}: {}", path.display(), e);
            }
        }
    }
}
