//! Package manifest and content fragments.
//!
//! `h5p.json` declares the package's main library; `content/content.json`
//! holds the authored content tree that gets cut into fragments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded `h5p.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Top-level content type (e.g. "H5P.QuestionSet")
    pub main_library: String,

    /// Package title
    #[serde(default)]
    pub title: String,

    /// Content language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Embed modes the package supports ("div", "iframe")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embed_types: Vec<String>,

    /// License code (e.g. "CC BY")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Package authors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    /// Libraries the package bundles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preloaded_dependencies: Vec<LibraryDependency>,
}

impl Manifest {
    /// Create a manifest with just a main library and title
    pub fn new(main_library: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            main_library: main_library.into(),
            title: title.into(),
            language: None,
            embed_types: Vec::new(),
            license: None,
            authors: Vec::new(),
            preloaded_dependencies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDependency {
    pub machine_name: String,
    #[serde(default)]
    pub major_version: u32,
    #[serde(default)]
    pub minor_version: u32,
}

impl std::fmt::Display for LibraryDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{}",
            self.machine_name, self.major_version, self.minor_version
        )
    }
}

/// Fragment metadata (only the title is used)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    #[serde(default)]
    pub title: String,
}

/// One self-contained unit of authored content, convertible into one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFragment {
    /// Library identifier, possibly with a version suffix ("H5P.TrueFalse 1.6")
    #[serde(default)]
    pub library: String,

    /// Content-type specific parameters
    #[serde(default)]
    pub params: Value,

    #[serde(default)]
    pub metadata: FragmentMetadata,
}

impl ContentFragment {
    /// Create a fragment from its parts
    pub fn new(library: impl Into<String>, params: Value, title: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            params,
            metadata: FragmentMetadata {
                title: title.into(),
            },
        }
    }

    /// Decode a fragment from a child node of a container document.
    ///
    /// Each field is read on its own, so a malformed `metadata` never costs
    /// the fragment its library. Non-object nodes become an empty fragment
    /// so the caller's count is preserved; they are dropped later for
    /// lacking a library.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut node) = value else {
            return Self::default();
        };

        let library = string_at(node.get("library"));
        let title = string_at(node.get("metadata").and_then(|m| m.get("title")));
        let params = node.remove("params").unwrap_or_default();

        Self::new(library, params, title)
    }

    /// Library name without the version suffix
    pub fn machine_name(&self) -> &str {
        library_prefix(&self.library)
    }

    /// Fragment title
    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}

fn string_at(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Text before the first space of a library identifier
pub fn library_prefix(library: &str) -> &str {
    library.split(' ').next().unwrap_or_default()
}
