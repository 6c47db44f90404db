//! Domain types for the H5P importer.
//!
//! This module contains the core data structures:
//! - Manifest: decoded `h5p.json`
//! - ContentFragment: one convertible unit of authored content
//! - QuestionRecord: the generic question handed to the question bank

pub mod manifest;
pub mod question;

// Re-export commonly used types
pub use manifest::{library_prefix, ContentFragment, FragmentMetadata, LibraryDependency, Manifest};
pub use question::{Answer, DropZone, MediaRef, QuestionRecord, QuestionType};
