//! Safety limits for archive extraction.
//!
//! Keeps a hostile or broken package from filling the scratch area:
//! - Archive size
//! - Number of entries
//! - Total uncompressed size
//! - Denylist patterns (entries that are never written out)

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits applied while staging a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLimits {
    /// Maximum size of the package file (default: 256MB)
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,

    /// Maximum number of archive entries (default: 10000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum total uncompressed size (default: 1GB)
    #[serde(default = "default_max_uncompressed_bytes")]
    pub max_uncompressed_bytes: u64,

    /// Glob patterns for entries to skip during extraction
    #[serde(default = "default_denylist")]
    pub denylist_patterns: Vec<String>,
}

fn default_max_archive_bytes() -> u64 {
    256 * 1024 * 1024
}
fn default_max_entries() -> usize {
    10_000
}
fn default_max_uncompressed_bytes() -> u64 {
    1024 * 1024 * 1024
}

fn default_denylist() -> Vec<String> {
    vec![
        "**/*.php".to_string(),
        "**/*.exe".to_string(),
        "**/*.sh".to_string(),
        "**/.htaccess".to_string(),
    ]
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: default_max_archive_bytes(),
            max_entries: default_max_entries(),
            max_uncompressed_bytes: default_max_uncompressed_bytes(),
            denylist_patterns: default_denylist(),
        }
    }
}

impl ImportLimits {
    /// Check if an entry path matches any denylist pattern
    pub fn is_denylisted(&self, path: &str) -> bool {
        for pattern_str in &self.denylist_patterns {
            if let Ok(pattern) = Pattern::new(pattern_str) {
                if pattern.matches(path) {
                    return true;
                }
            }
        }
        false
    }

    /// Validate the package file size
    pub fn check_archive_size(&self, size: u64) -> Result<(), LimitViolation> {
        if size > self.max_archive_bytes {
            return Err(LimitViolation::MaxArchiveBytes {
                actual: size,
                limit: self.max_archive_bytes,
            });
        }
        Ok(())
    }

    /// Validate the number of entries in the archive
    pub fn check_entries(&self, count: usize) -> Result<(), LimitViolation> {
        if count > self.max_entries {
            return Err(LimitViolation::MaxEntries {
                actual: count,
                limit: self.max_entries,
            });
        }
        Ok(())
    }

    /// Validate the uncompressed bytes written so far
    pub fn check_uncompressed(&self, total: u64) -> Result<(), LimitViolation> {
        if total > self.max_uncompressed_bytes {
            return Err(LimitViolation::MaxUncompressedBytes {
                actual: total,
                limit: self.max_uncompressed_bytes,
            });
        }
        Ok(())
    }
}

/// Limit violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitViolation {
    #[error("Package too large: {actual} > {limit} bytes")]
    MaxArchiveBytes { actual: u64, limit: u64 },

    #[error("Too many archive entries: {actual} > {limit}")]
    MaxEntries { actual: usize, limit: usize },

    #[error("Uncompressed size exceeded: {actual} > {limit} bytes")]
    MaxUncompressedBytes { actual: u64, limit: u64 },
}
