//! Archive staging: copy the package into a scratch directory and unzip it.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::{ExtractError, ImportError};
use super::limits::ImportLimits;
use super::scratch::{ScratchDir, ScratchRoot};

/// Result of a successful extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written out
    pub files: usize,

    /// Entries skipped for matching the denylist
    pub denied: usize,

    /// Entries skipped for unsafe paths
    pub unsafe_paths: usize,

    /// Uncompressed bytes written
    pub bytes: u64,
}

/// A package copied into its scratch directory and extracted there
#[derive(Debug)]
pub struct StagedPackage {
    pub scratch: ScratchDir,
    /// Id of the staged copy, taken before extraction touches the directory
    pub package_id: String,
    pub summary: ExtractSummary,
}

/// File-archive collaborator
pub trait ArchiveExtractor: Send + Sync {
    /// Human-readable extractor name
    fn name(&self) -> &str;

    /// Extract `archive` into `dest`
    fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError>;
}

/// Zip extraction with path sanitizing and limits
#[derive(Debug, Clone, Default)]
pub struct ZipExtractor {
    limits: ImportLimits,
}

impl ZipExtractor {
    pub fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ImportLimits {
        &self.limits
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn name(&self) -> &str {
        "zip"
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError> {
        let file = File::open(archive)?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

        self.limits.check_entries(zip.len())?;

        let mut summary = ExtractSummary::default();
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| ExtractError::Archive(format!("entry {}: {}", i, e)))?;

            let entry_path = match entry.enclosed_name() {
                Some(p) => p.to_path_buf(),
                None => {
                    tracing::warn!("Skipping archive entry with unsafe path: {}", entry.name());
                    summary.unsafe_paths += 1;
                    continue;
                }
            };

            let entry_name = entry_path.to_string_lossy().replace('\\', "/");
            if self.limits.is_denylisted(&entry_name) {
                tracing::warn!("Skipping denylisted archive entry: {}", entry_name);
                summary.denied += 1;
                continue;
            }

            let output_path = dest.join(&entry_path);
            if output_path.as_path() == archive {
                tracing::warn!("Skipping archive entry that would overwrite the archive: {}", entry_name);
                summary.unsafe_paths += 1;
                continue;
            }
            if entry.is_dir() {
                fs::create_dir_all(&output_path)?;
                continue;
            }

            // Declared sizes can lie, so the copy is bounded as well
            self.limits
                .check_uncompressed(summary.bytes.saturating_add(entry.size()))?;

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&output_path)?;
            let remaining = self.limits.max_uncompressed_bytes - summary.bytes;
            let mut bounded = io::Read::take(&mut entry, remaining.saturating_add(1));
            let written = io::copy(&mut bounded, &mut outfile)?;

            summary.bytes += written;
            self.limits.check_uncompressed(summary.bytes)?;
            summary.files += 1;
        }

        Ok(summary)
    }
}

/// Copy `source` into a fresh scratch directory and extract it in place.
///
/// On failure the scratch directory is gone by the time the error returns.
pub fn stage(
    source: &Path,
    root: &ScratchRoot,
    extractor: &dyn ArchiveExtractor,
    limits: &ImportLimits,
) -> Result<StagedPackage, ImportError> {
    let metadata = fs::metadata(source).map_err(|e| ImportError::UnreadableInput {
        path: source.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(ImportError::UnreadableInput {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    File::open(source).map_err(|e| ImportError::UnreadableInput {
        path: source.to_path_buf(),
        source: e,
    })?;

    limits
        .check_archive_size(metadata.len())
        .map_err(|e| ImportError::extract(source, e))?;

    let scratch = root
        .create_unique_dir("h5p")
        .map_err(|e| ImportError::CopyFailed {
            path: root.path().to_path_buf(),
            source: e,
        })?;

    let archive_path = scratch.archive_path();
    fs::copy(source, &archive_path).map_err(|e| ImportError::CopyFailed {
        path: archive_path.clone(),
        source: e,
    })?;

    let package_id = package_id(&archive_path).map_err(|e| ImportError::CopyFailed {
        path: archive_path.clone(),
        source: e,
    })?;

    let summary = extractor
        .extract(&archive_path, scratch.path())
        .map_err(|e| ImportError::extract(source, e))?;

    tracing::debug!(
        "Extracted {} files ({} bytes) with {} into {}",
        summary.files,
        summary.bytes,
        extractor.name(),
        scratch.path().display()
    );

    Ok(StagedPackage {
        scratch,
        package_id,
        summary,
    })
}

/// SHA256(file)[0:16]
pub fn package_id(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    let digest = hasher.finalize();
    Ok(hex::encode(&digest[..8]))
}
