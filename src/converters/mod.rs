//! Per-library converters from H5P fragments to question records.
//!
//! The registry maps a canonical library name (the part of the library
//! string before the first space) to a converter. Fragments whose library
//! has no converter are skipped, not rejected.

pub mod blanks;
pub mod drag_question;
pub mod drag_text;
pub mod media;
pub mod multichoice;
pub mod text;
pub mod truefalse;

use std::collections::HashMap;

use crate::core::scratch::ScratchDir;
use crate::domain::{library_prefix, ContentFragment, QuestionRecord, QuestionType};

pub use blanks::BlanksConverter;
pub use drag_question::DragQuestionConverter;
pub use drag_text::DragTextConverter;
pub use multichoice::MultiChoiceConverter;
pub use truefalse::TrueFalseConverter;

/// Maps one H5P library onto the generic question schema
pub trait Converter: Send + Sync {
    /// Canonical library name this converter handles (e.g. "H5P.TrueFalse")
    fn library(&self) -> &'static str;

    /// Kind of question produced
    fn question_type(&self) -> QuestionType;

    /// Convert a fragment; `None` when the params lack what the type needs
    fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Option<QuestionRecord>;
}

/// Outcome of converting one fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Converted(QuestionRecord),
    /// No converter for the library
    Unrecognized,
    /// A converter exists but the params were unusable
    Rejected,
}

/// Dispatch table from library name to converter
pub struct ConverterRegistry {
    converters: HashMap<&'static str, Box<dyn Converter>>,
    case_insensitive: bool,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Registry with all built-in converters and exact-case matching
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(BlanksConverter));
        registry.register(Box::new(MultiChoiceConverter));
        registry.register(Box::new(TrueFalseConverter));
        registry.register(Box::new(DragQuestionConverter));
        registry.register(Box::new(DragTextConverter));
        registry
    }

    /// Registry with no converters
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
            case_insensitive: false,
        }
    }

    /// Match library names ignoring ASCII case ("H5P.Multichoice" finds
    /// the "H5P.MultiChoice" converter)
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Add or replace a converter
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.insert(converter.library(), converter);
    }

    /// Canonical names of registered libraries, sorted
    pub fn libraries(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.converters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Converter for a library string (version suffix ignored)
    pub fn lookup(&self, library: &str) -> Option<&dyn Converter> {
        let name = library_prefix(library);
        if let Some(converter) = self.converters.get(name) {
            return Some(converter.as_ref());
        }
        if self.case_insensitive {
            return self
                .converters
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, converter)| converter.as_ref());
        }
        None
    }

    /// Convert one fragment
    pub fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Conversion {
        let Some(converter) = self.lookup(&fragment.library) else {
            return Conversion::Unrecognized;
        };

        match converter.convert(fragment, scratch) {
            Some(record) => Conversion::Converted(record.from_library(fragment.library.clone())),
            None => Conversion::Rejected,
        }
    }
}
