//! The import pipeline.
//!
//! Stages run strictly forward on one thread:
//! archive → manifest + content → fragments → question records.
//! The scratch directory lives exactly as long as one `import` call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, ImportError};
use super::limits::ImportLimits;
use super::manifest::read_package;
use super::scratch::{ScratchDir, ScratchRoot};
use super::stager::{stage, ArchiveExtractor, StagedPackage, ZipExtractor};
use super::unwrap::unwrap_content;
use crate::converters::media::export_media;
use crate::converters::{Conversion, ConverterRegistry};
use crate::domain::{ContentFragment, Manifest, QuestionRecord};
use crate::sinks::{ErrorSink, TracingErrorSink};

/// Settings for one importer
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Parent of the per-import scratch directories
    pub scratch_root: PathBuf,

    /// Archive safety limits
    pub limits: ImportLimits,

    /// Match converter library names exactly (default) or ignoring case
    pub strict_library_names: bool,

    /// Copy media files here before the scratch directory goes away
    pub media_dir: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir().join("h5pimport"),
            limits: ImportLimits::default(),
            strict_library_names: true,
            media_dir: None,
        }
    }
}

/// Why a fragment produced no question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fragment had no library identifier
    MissingLibrary,
    /// No converter for the library
    Unrecognized,
    /// Converter found the params unusable
    ConversionRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFragment {
    /// Position in the fragment list
    pub index: usize,
    pub library: String,
    pub reason: SkipReason,
}

/// Counters for one import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Fragments handed to the converter stage
    pub fragments: usize,
    pub converted: usize,
    pub skipped: Vec<SkippedFragment>,
    pub extracted_entries: usize,
    /// Archive entries skipped as denylisted or unsafe
    pub denied_entries: usize,
}

impl ImportReport {
    /// Number of skipped fragments with the given reason
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Result of a successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// SHA256 of the package file, first 16 hex chars
    pub package_id: String,
    pub manifest: Manifest,
    pub questions: Vec<QuestionRecord>,
    pub report: ImportReport,
}

/// One fragment as seen by `inspect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentSummary {
    pub library: String,
    pub title: String,
    /// Converter that would handle it, if any
    pub converter: Option<&'static str>,
}

/// Manifest and fragment list of a package, without conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub manifest: Manifest,
    pub fragments: Vec<FragmentSummary>,
}

/// Runs the import pipeline
pub struct Importer {
    options: ImportOptions,
    registry: ConverterRegistry,
    extractor: Box<dyn ArchiveExtractor>,
    error_sink: Arc<dyn ErrorSink>,
}

impl Importer {
    /// Importer with the built-in converters, zip extraction and tracing error sink
    pub fn new(options: ImportOptions) -> Self {
        let registry =
            ConverterRegistry::new().with_case_insensitive(!options.strict_library_names);
        let extractor = Box::new(ZipExtractor::new(options.limits.clone()));

        Self {
            options,
            registry,
            extractor,
            error_sink: Arc::new(TracingErrorSink),
        }
    }

    /// Replace the archive extractor
    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the error sink
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    /// Replace the converter registry
    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Import one package.
    ///
    /// Fatal errors are reported to the error sink once and returned; no
    /// partial question list survives them.
    pub fn import(&self, source: &Path) -> Result<ImportOutcome, ImportError> {
        tracing::info!("Importing H5P package {}", source.display());

        let outcome = self.run(source).map_err(|e| self.report(e))?;

        tracing::info!(
            "Imported {} question(s) from {} ({} fragment(s), {} skipped)",
            outcome.questions.len(),
            source.display(),
            outcome.report.fragments,
            outcome.report.skipped.len()
        );
        Ok(outcome)
    }

    /// Stage and unwrap a package without converting it
    pub fn inspect(&self, source: &Path) -> Result<Inspection, ImportError> {
        let inspect = || -> Result<Inspection, ImportError> {
            let staged = self.stage(source)?;
            let docs = read_package(&staged.scratch)?;
            let fragments = unwrap_content(&docs.manifest, &docs.content)?;

            Ok(Inspection {
                manifest: docs.manifest,
                fragments: fragments
                    .iter()
                    .map(|f| FragmentSummary {
                        library: f.library.clone(),
                        title: f.title().to_string(),
                        converter: self.registry.lookup(&f.library).map(|c| c.library()),
                    })
                    .collect(),
            })
        };
        inspect().map_err(|e| self.report(e))
    }

    /// Run the converter stage over a fragment list
    pub fn convert_fragments(
        &self,
        fragments: &[ContentFragment],
        scratch: &ScratchDir,
    ) -> (Vec<QuestionRecord>, ImportReport) {
        let mut report = ImportReport {
            fragments: fragments.len(),
            ..Default::default()
        };
        let mut questions = Vec::new();

        for (index, fragment) in fragments.iter().enumerate() {
            let reason = if fragment.library.is_empty() {
                SkipReason::MissingLibrary
            } else {
                match self.registry.convert(fragment, scratch) {
                    Conversion::Converted(record) => {
                        questions.push(record);
                        continue;
                    }
                    Conversion::Unrecognized => SkipReason::Unrecognized,
                    Conversion::Rejected => SkipReason::ConversionRejected,
                }
            };

            tracing::debug!(
                "Skipping fragment {} ({:?}): {:?} [{}]",
                index,
                fragment.library,
                reason,
                ErrorKind::SkippedUnrecognizedFragment
            );
            report.skipped.push(SkippedFragment {
                index,
                library: fragment.library.clone(),
                reason,
            });
        }

        report.converted = questions.len();
        (questions, report)
    }

    fn stage(&self, source: &Path) -> Result<StagedPackage, ImportError> {
        let root = ScratchRoot::new(&self.options.scratch_root);
        stage(source, &root, self.extractor.as_ref(), &self.options.limits)
    }

    fn run(&self, source: &Path) -> Result<ImportOutcome, ImportError> {
        let StagedPackage {
            scratch,
            package_id,
            summary,
        } = self.stage(source)?;

        let docs = read_package(&scratch)?;
        let fragments = unwrap_content(&docs.manifest, &docs.content)?;

        let (mut questions, mut report) = self.convert_fragments(&fragments, &scratch);
        report.extracted_entries = summary.files;
        report.denied_entries = summary.denied + summary.unsafe_paths;

        if let Some(media_dir) = &self.options.media_dir {
            for media in questions.iter_mut().flat_map(|q| q.media.iter_mut()) {
                if let Err(e) = export_media(&scratch, media, media_dir) {
                    tracing::warn!("Failed to export media {}: {}", media.path, e);
                }
            }
        }

        if let Err(e) = scratch.close() {
            tracing::warn!("Failed to remove scratch directory: {}", e);
        }

        Ok(ImportOutcome {
            package_id,
            manifest: docs.manifest,
            questions,
            report,
        })
    }

    fn report(&self, error: ImportError) -> ImportError {
        self.error_sink.report(error.kind().key(), &error.to_string());
        error
    }
}
