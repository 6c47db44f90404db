//! H5P.MultiChoice → multiple-choice question.

use serde_json::Value;

use super::media::resolve_media_field;
use super::text::{array_at, str_at, str_field};
use super::Converter;
use crate::core::scratch::ScratchDir;
use crate::domain::{Answer, ContentFragment, QuestionRecord, QuestionType};

pub struct MultiChoiceConverter;

impl Converter for MultiChoiceConverter {
    fn library(&self) -> &'static str {
        "H5P.MultiChoice"
    }

    fn question_type(&self) -> QuestionType {
        QuestionType::MultiChoice
    }

    fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Option<QuestionRecord> {
        let params = &fragment.params;
        let options = array_at(params, "/answers");
        if options.is_empty() {
            return None;
        }

        let mut record = QuestionRecord::new(
            QuestionType::MultiChoice,
            fragment.title(),
            str_field(params, "question").trim(),
        );

        record.answers = options.iter().map(answer).collect();

        let correct_count = record.correct_answers().count();
        record.single_answer = Some(
            params
                .pointer("/behaviour/singleAnswer")
                .and_then(Value::as_bool)
                .unwrap_or(correct_count == 1),
        );

        record.media.extend(resolve_media_field(scratch, params));
        Some(record)
    }
}

fn answer(option: &Value) -> Answer {
    let chosen = str_at(option, "/tipsAndFeedback/chosenFeedback");
    let feedback = if chosen.is_empty() {
        str_at(option, "/tipsAndFeedback/tip")
    } else {
        chosen
    };

    Answer::new(
        str_field(option, "text").trim(),
        option.get("correct").and_then(Value::as_bool).unwrap_or(false),
        feedback.trim(),
    )
}
