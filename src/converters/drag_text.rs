//! H5P.DragText → drag-text question.

use super::text::{extract_markers, str_field};
use super::Converter;
use crate::core::scratch::ScratchDir;
use crate::domain::{Answer, ContentFragment, QuestionRecord, QuestionType};

pub struct DragTextConverter;

impl Converter for DragTextConverter {
    fn library(&self) -> &'static str {
        "H5P.DragText"
    }

    fn question_type(&self) -> QuestionType {
        QuestionType::DragText
    }

    fn convert(&self, fragment: &ContentFragment, _scratch: &ScratchDir) -> Option<QuestionRecord> {
        let params = &fragment.params;

        let (text, markers) = extract_markers(str_field(params, "textField"), 1, false);
        if markers.is_empty() {
            return None;
        }

        let description = str_field(params, "taskDescription").trim();
        let question_text = if description.is_empty() {
            text.trim().to_string()
        } else {
            format!("{}\n{}", description, text.trim())
        };

        let mut record = QuestionRecord::new(QuestionType::DragText, fragment.title(), question_text);
        record.answers = markers
            .into_iter()
            .map(|m| Answer::new(m.answer, true, m.tip).in_group(m.slot))
            .collect();

        // Distractors use the same markup but have no slot
        let (_, distractors) = extract_markers(str_field(params, "distractors"), 1, false);
        record
            .answers
            .extend(distractors.into_iter().map(|m| Answer::new(m.answer, false, m.tip)));

        Some(record)
    }
}
