//! Manifest reader for staged packages.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::error::ImportError;
use super::scratch::ScratchDir;
use crate::domain::Manifest;

/// Manifest path inside the package
pub const MANIFEST_FILE: &str = "h5p.json";

/// Content document path inside the package
pub const CONTENT_FILE: &str = "content/content.json";

/// Decoded manifest and content document of one package
#[derive(Debug, Clone)]
pub struct PackageDocuments {
    pub manifest: Manifest,
    pub content: Map<String, Value>,
}

/// Read `h5p.json` and `content/content.json` from a staged package
pub fn read_package(scratch: &ScratchDir) -> Result<PackageDocuments, ImportError> {
    read_documents(scratch.path())
}

/// Read both documents from an extracted package directory
pub fn read_documents(package_dir: &Path) -> Result<PackageDocuments, ImportError> {
    let manifest_raw = read_json(package_dir, MANIFEST_FILE)?;
    let manifest: Manifest = serde_json::from_value(manifest_raw)
        .map_err(|e| ImportError::malformed(MANIFEST_FILE, e))?;

    if manifest.main_library.is_empty() {
        return Err(ImportError::malformed(MANIFEST_FILE, "empty mainLibrary"));
    }

    let content = match read_json(package_dir, CONTENT_FILE)? {
        Value::Object(map) => map,
        other => {
            return Err(ImportError::malformed(
                CONTENT_FILE,
                format!("expected a JSON object, found {}", json_kind(&other)),
            ))
        }
    };

    tracing::debug!(
        "Read package manifest: mainLibrary={} title={:?}",
        manifest.main_library,
        manifest.title
    );

    Ok(PackageDocuments { manifest, content })
}

fn read_json(package_dir: &Path, relative: &str) -> Result<Value, ImportError> {
    let path = package_dir.join(relative);
    let text = fs::read_to_string(&path).map_err(|e| ImportError::malformed(relative, e))?;
    // Some editors export with a UTF-8 BOM
    serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| ImportError::malformed(relative, e))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use tempfile::TempDir;

    fn write_package(dir: &Path, manifest: &str, content: Option<&str>) {
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        if let Some(content) = content {
            fs::create_dir_all(dir.join("content")).unwrap();
            fs::write(dir.join(CONTENT_FILE), content).unwrap();
        }
    }

    #[test]
    fn test_read_documents() {
        let temp = TempDir::new().unwrap();
        write_package(
            temp.path(),
            r#"{"title": "Quiz", "mainLibrary": "H5P.TrueFalse"}"#,
            Some(r#"{"question": "<p>Water is wet.</p>", "correct": "true"}"#),
        );

        let docs = read_documents(temp.path()).unwrap();
        assert_eq!(docs.manifest.main_library, "H5P.TrueFalse");
        assert_eq!(docs.content["correct"], "true");
    }

    #[test]
    fn test_missing_content_is_malformed() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), r#"{"mainLibrary": "H5P.TrueFalse"}"#, None);

        let err = read_documents(temp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedContent);
        assert!(err.to_string().contains(CONTENT_FILE));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "{not json", Some("{}"));

        let err = read_documents(temp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedContent);
        assert!(err.to_string().contains(MANIFEST_FILE));
    }

    #[test]
    fn test_content_must_be_object() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), r#"{"mainLibrary": "H5P.Blanks"}"#, Some("[1, 2]"));

        let err = read_documents(temp.path()).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }
}
