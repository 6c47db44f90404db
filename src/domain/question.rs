//! Generic question records handed to the question bank.

use serde::{Deserialize, Serialize};

/// Kind of question produced by a converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// One or more correct options out of a list
    MultiChoice,

    /// A statement that is either true or false
    TrueFalse,

    /// Typed answers for blanks in a text
    FillInTheBlank,

    /// Draggable items placed onto drop zones
    DragAndDrop,

    /// Words dragged into blanks in a text
    DragText,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::MultiChoice => write!(f, "multichoice"),
            QuestionType::TrueFalse => write!(f, "truefalse"),
            QuestionType::FillInTheBlank => write!(f, "fillintheblank"),
            QuestionType::DragAndDrop => write!(f, "draganddrop"),
            QuestionType::DragText => write!(f, "dragtext"),
        }
    }
}

/// One answer option (or blank slot, or draggable)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub text: String,

    pub correct: bool,

    #[serde(default)]
    pub feedback: String,

    /// Other accepted spellings of a blank
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,

    /// Blank number (`[[n]]`) or drop-zone index this answer belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
}

impl Answer {
    /// Create an answer with text, correctness and feedback
    pub fn new(text: impl Into<String>, correct: bool, feedback: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            correct,
            feedback: feedback.into(),
            alternatives: Vec::new(),
            group: None,
        }
    }

    /// Attach a blank number or drop-zone index
    pub fn in_group(mut self, group: usize) -> Self {
        self.group = Some(group);
        self
    }
}

/// A drop zone of a drag-and-drop question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropZone {
    pub label: String,

    /// Position and size as percentages of the task area
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Indices into the question's answers that belong here
    pub correct_answers: Vec<usize>,
}

/// A media file referenced by a question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    /// Path relative to the package's `content/` directory
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Size of the file, if it exists in the package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// SHA256 of the file contents (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Where the file was copied to outside the scratch directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_path: Option<String>,
}

impl MediaRef {
    /// Whether the referenced file was found in the package
    pub fn is_present(&self) -> bool {
        self.size_bytes.is_some()
    }
}

/// A question in the generic question-bank schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub title: String,

    /// Question HTML; drag text and blanks carry `[[n]]` placeholders
    pub question_text: String,

    pub answers: Vec<Answer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop_zones: Vec<DropZone>,

    /// Multiple choice only: whether a single option may be picked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_answer: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,

    /// Library string of the fragment this came from
    #[serde(default)]
    pub source_library: String,
}

impl QuestionRecord {
    /// Create a record with no answers yet
    pub fn new(
        question_type: QuestionType,
        title: impl Into<String>,
        question_text: impl Into<String>,
    ) -> Self {
        Self {
            question_type,
            title: title.into(),
            question_text: question_text.into(),
            answers: Vec::new(),
            drop_zones: Vec::new(),
            single_answer: None,
            media: Vec::new(),
            source_library: String::new(),
        }
    }

    /// Record the originating library
    pub fn from_library(mut self, library: impl Into<String>) -> Self {
        self.source_library = library.into();
        self
    }

    /// Answers marked correct
    pub fn correct_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|a| a.correct)
    }
}
