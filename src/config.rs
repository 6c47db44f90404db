//! Configuration for h5pimport.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (H5PIMPORT_HOME, H5PIMPORT_SCRATCH, H5PIMPORT_BANK)
//! 2. Config file (.h5pimport/config.yaml)
//! 3. Defaults (~/.h5pimport, system temp dir for scratch)
//!
//! Config file discovery:
//! - Searches current directory and parents for .h5pimport/config.yaml
//! - Paths in config file are relative to the project root (parent of .h5pimport/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{ImportLimits, ImportOptions};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub limits: Option<ImportLimits>,
    #[serde(default)]
    pub compat: Option<CompatConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory
    pub home: Option<String>,
    /// Parent of per-import scratch directories
    pub scratch: Option<String>,
    /// Question bank file
    pub bank: Option<String>,
    /// Where exported media files go
    pub media: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompatConfig {
    /// Match converter library names exactly (default: true)
    pub strict_library_names: Option<bool>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Scratch root
    pub scratch: PathBuf,
    /// Question bank file
    pub bank: PathBuf,
    /// Media export directory (if configured)
    pub media: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Archive limits
    pub limits: ImportLimits,
    pub strict_library_names: bool,
}

impl ResolvedConfig {
    /// Importer options for this configuration
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            scratch_root: self.scratch.clone(),
            limits: self.limits.clone(),
            strict_library_names: self.strict_library_names,
            media_dir: self.media.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".h5pimport").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let config = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };
    resolve(config_file, config)
}

/// Merge a parsed config file with environment variables and defaults
fn resolve(config_file: Option<PathBuf>, config: Option<ConfigFile>) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".h5pimport");

    // Project root is the parent of .h5pimport/
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let paths = config
        .as_ref()
        .map(|c| c.paths.clone())
        .unwrap_or_default();
    let from_file = |value: &Option<String>| value.as_deref().map(|p| resolve_path(&base_dir, p));

    let home = env_path("H5PIMPORT_HOME")
        .or_else(|| from_file(&paths.home))
        .unwrap_or(default_home);

    let scratch = env_path("H5PIMPORT_SCRATCH")
        .or_else(|| from_file(&paths.scratch))
        .unwrap_or_else(|| std::env::temp_dir().join("h5pimport"));

    let bank = env_path("H5PIMPORT_BANK")
        .or_else(|| from_file(&paths.bank))
        .unwrap_or_else(|| home.join("bank.jsonl"));

    let media = from_file(&paths.media);

    let limits = config
        .as_ref()
        .and_then(|c| c.limits.clone())
        .unwrap_or_default();

    let strict_library_names = config
        .as_ref()
        .and_then(|c| c.compat.as_ref())
        .and_then(|c| c.strict_library_names)
        .unwrap_or(true);

    Ok(ResolvedConfig {
        home,
        scratch,
        bank,
        media,
        config_file,
        limits,
        strict_library_names,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".h5pimport");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  scratch: ./scratch
  bank: data/bank.jsonl
limits:
  max_entries: 500
compat:
  strict_library_names: false
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.scratch, Some("./scratch".to_string()));
        assert_eq!(config.limits.as_ref().unwrap().max_entries, 500);
        assert_eq!(
            config.compat.as_ref().unwrap().strict_library_names,
            Some(false)
        );
    }

    #[test]
    fn test_resolve_relative_to_project_root() {
        let config: ConfigFile = serde_yaml::from_str(
            r#"
version: "1.0"
paths:
  media: media
  home: /abs/home
compat:
  strict_library_names: false
"#,
        )
        .unwrap();

        let resolved = resolve(
            Some(PathBuf::from("/project/.h5pimport/config.yaml")),
            Some(config),
        )
        .unwrap();

        assert_eq!(resolved.media, Some(PathBuf::from("/project/media")));
        assert!(!resolved.strict_library_names);
        assert_eq!(resolved.limits, ImportLimits::default());

        let options = resolved.import_options();
        assert_eq!(options.media_dir, Some(PathBuf::from("/project/media")));
        assert!(!options.strict_library_names);
    }

    #[test]
    fn test_defaults_without_file() {
        let resolved = resolve(None, None).unwrap();
        assert!(resolved.config_file.is_none());
        assert!(resolved.strict_library_names);
        assert!(resolved.media.is_none());
    }

    #[test]
    fn test_resolve_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
