//! Core import logic.
//!
//! This module contains:
//! - Stager: copy + unzip into a scratch directory
//! - Manifest: read `h5p.json` and `content/content.json`
//! - Unwrap: expand container content types into fragments
//! - Importer: the pipeline tying the stages to the converters

pub mod error;
pub mod importer;
pub mod limits;
pub mod manifest;
pub mod scratch;
pub mod stager;
pub mod unwrap;

// Re-export commonly used types
pub use error::{ErrorKind, ExtractError, ImportError};
pub use importer::{
    ImportOptions, ImportOutcome, ImportReport, Importer, Inspection, SkipReason,
    SkippedFragment,
};
pub use limits::{ImportLimits, LimitViolation};
pub use manifest::{read_documents, read_package, PackageDocuments};
pub use scratch::{ScratchDir, ScratchRoot};
pub use stager::{package_id, stage, ArchiveExtractor, ExtractSummary, StagedPackage, ZipExtractor};
pub use unwrap::{unwrap_content, Expansion};
