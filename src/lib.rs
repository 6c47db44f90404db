//! h5pimport - H5P package importer for quiz question banks
//!
//! Reads H5P ("HTML5 Package") archives and maps the supported content
//! types onto a generic question record.
//!
//! # Pipeline
//!
//! ```text
//! package.h5p → Stager → Manifest reader → Container unwrapper → Converters → QuestionRecord*
//!                  ↓
//!           scratch dir (removed on every exit path)
//! ```
//!
//! # Modules
//!
//! - `core`: Pipeline stages, errors, limits, scratch directories
//! - `converters`: One converter per H5P library
//! - `domain`: Data structures (Manifest, ContentFragment, QuestionRecord)
//! - `sinks`: Error sink and question bank collaborators
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Import packages into the default question bank
//! h5pimport import quiz.h5p 'exports/*.h5p'
//!
//! # Look at a package's fragments without converting
//! h5pimport inspect quiz.h5p
//! ```

pub mod cli;
pub mod config;
pub mod converters;
pub mod core;
pub mod domain;
pub mod sinks;

// Re-export main types at crate root for convenience
pub use crate::core::{ErrorKind, ImportError, ImportOptions, ImportOutcome, ImportReport, Importer};
pub use converters::{Converter, ConverterRegistry};
pub use domain::{Answer, ContentFragment, DropZone, Manifest, MediaRef, QuestionRecord, QuestionType};
pub use sinks::{ErrorSink, JsonlQuestionBank, MemoryQuestionBank, QuestionBank};
