//! Container unwrapping: cut one content document into per-question fragments.
//!
//! Dispatch is on the exact `mainLibrary` string. Containers are expanded one
//! level deep; their children are expected to be questions already.

use serde_json::{json, Map, Value};

use super::error::ImportError;
use crate::converters::text::{plain_text, str_field};
use crate::domain::{ContentFragment, Manifest};

/// Libraries whose whole content document is one question.
///
/// Note the lowercase "c" in `H5P.Multichoice`: it does not match the
/// `H5P.MultiChoice` converter, so such packages yield a skipped fragment
/// unless library names are matched case-insensitively.
pub const SINGLE_FRAGMENT_LIBRARIES: [&str; 5] = [
    "H5P.Blanks",
    "H5P.DragQuestion",
    "H5P.Multichoice",
    "H5P.TrueFalse",
    "H5P.DragText",
];

/// Library assigned to fragments built from a single choice set
pub const SINGLE_CHOICE_LIBRARY: &str = "H5P.MultiChoice";

/// How a main library is expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Column,
    QuestionSet,
    SingleChoiceSet,
    Single,
}

impl Expansion {
    /// Expansion rule for a main library, if it is supported
    pub fn for_library(main_library: &str) -> Option<Self> {
        match main_library {
            "H5P.Column" => Some(Expansion::Column),
            "H5P.QuestionSet" => Some(Expansion::QuestionSet),
            "H5P.SingleChoiceSet" => Some(Expansion::SingleChoiceSet),
            lib if SINGLE_FRAGMENT_LIBRARIES.contains(&lib) => Some(Expansion::Single),
            _ => None,
        }
    }
}

/// Expand a package's content document into fragments
pub fn unwrap_content(
    manifest: &Manifest,
    content: &Map<String, Value>,
) -> Result<Vec<ContentFragment>, ImportError> {
    let expansion = Expansion::for_library(&manifest.main_library).ok_or_else(|| {
        ImportError::UnsupportedContentType {
            library: manifest.main_library.clone(),
        }
    })?;

    let fragments = match expansion {
        Expansion::Column => unwrap_column(content),
        Expansion::QuestionSet => unwrap_question_set(content),
        Expansion::SingleChoiceSet => unwrap_single_choice_set(content),
        Expansion::Single => vec![ContentFragment::new(
            manifest.main_library.clone(),
            Value::Object(content.clone()),
            manifest.title.clone(),
        )],
    };

    tracing::debug!(
        "Unwrapped {} into {} fragment(s)",
        manifest.main_library,
        fragments.len()
    );
    Ok(fragments)
}

fn array<'a>(content: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    content
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn unwrap_column(content: &Map<String, Value>) -> Vec<ContentFragment> {
    array(content, "content")
        .iter()
        .map(|item| ContentFragment::from_value(item.get("content").cloned().unwrap_or_default()))
        .collect()
}

fn unwrap_question_set(content: &Map<String, Value>) -> Vec<ContentFragment> {
    array(content, "questions")
        .iter()
        .cloned()
        .map(ContentFragment::from_value)
        .collect()
}

/// Each choice becomes one MultiChoice fragment whose first answer is correct.
///
/// The fragment title is the choice's question text with HTML tags stripped;
/// the `question` param keeps the original markup.
fn unwrap_single_choice_set(content: &Map<String, Value>) -> Vec<ContentFragment> {
    let l10n = content.get("l10n").unwrap_or(&Value::Null);
    let correct_text = str_field(l10n, "correctText");
    let incorrect_text = str_field(l10n, "incorrectText");

    array(content, "choices")
        .iter()
        .map(|choice| {
            let question = str_field(choice, "question");

            // The first listed answer is always the right one
            let answers: Vec<Value> = choice
                .get("answers")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(|(i, answer)| {
                    let text = answer
                        .as_str()
                        .unwrap_or_else(|| str_field(answer, "text"));
                    let feedback = if i == 0 { correct_text } else { incorrect_text };
                    json!({
                        "text": text,
                        "correct": i == 0,
                        "tipsAndFeedback": { "chosenFeedback": feedback },
                    })
                })
                .collect();

            let params = json!({
                "question": question,
                "answers": answers,
                "behaviour": { "singleAnswer": true },
            });
            ContentFragment::new(SINGLE_CHOICE_LIBRARY, params, plain_text(question))
        })
        .collect()
}
