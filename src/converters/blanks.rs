//! H5P.Blanks → fill-in-the-blank question.
//!
//! Each `*answer/alternative:tip*` marker in the question lines becomes a
//! `[[n]]` placeholder and one answer slot.

use serde_json::Value;

use super::media::resolve_media_field;
use super::text::{array_at, extract_markers, str_field};
use super::Converter;
use crate::core::scratch::ScratchDir;
use crate::domain::{Answer, ContentFragment, QuestionRecord, QuestionType};

pub struct BlanksConverter;

impl Converter for BlanksConverter {
    fn library(&self) -> &'static str {
        "H5P.Blanks"
    }

    fn question_type(&self) -> QuestionType {
        QuestionType::FillInTheBlank
    }

    fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Option<QuestionRecord> {
        let params = &fragment.params;

        let mut parts = Vec::new();
        let intro = str_field(params, "text").trim();
        if !intro.is_empty() {
            parts.push(intro.to_string());
        }

        let mut answers = Vec::new();
        for line in array_at(params, "/questions").iter().filter_map(Value::as_str) {
            let (rewritten, markers) = extract_markers(line, answers.len() + 1, true);
            parts.push(rewritten.trim().to_string());

            answers.extend(markers.into_iter().map(|m| Answer {
                text: m.answer,
                correct: true,
                feedback: m.tip,
                alternatives: m.alternatives,
                group: Some(m.slot),
            }));
        }

        if answers.is_empty() {
            return None;
        }

        let mut record =
            QuestionRecord::new(QuestionType::FillInTheBlank, fragment.title(), parts.join("\n"));
        record.answers = answers;
        record.media.extend(resolve_media_field(scratch, params));

        Some(record)
    }
}
