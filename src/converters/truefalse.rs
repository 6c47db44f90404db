//! H5P.TrueFalse → true/false question.

use serde_json::Value;

use super::media::resolve_media_field;
use super::text::{str_at, str_field};
use super::Converter;
use crate::core::scratch::ScratchDir;
use crate::domain::{Answer, ContentFragment, QuestionRecord, QuestionType};

pub struct TrueFalseConverter;

impl Converter for TrueFalseConverter {
    fn library(&self) -> &'static str {
        "H5P.TrueFalse"
    }

    fn question_type(&self) -> QuestionType {
        QuestionType::TrueFalse
    }

    fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Option<QuestionRecord> {
        let params = &fragment.params;
        let is_true = correct_flag(params.get("correct")?)?;

        let true_text = or_default(str_at(params, "/l10n/trueText"), "True");
        let false_text = or_default(str_at(params, "/l10n/falseText"), "False");
        let on_correct = str_at(params, "/behaviour/feedbackOnCorrect");
        let on_wrong = str_at(params, "/behaviour/feedbackOnWrong");

        let mut record = QuestionRecord::new(
            QuestionType::TrueFalse,
            fragment.title(),
            str_field(params, "question").trim(),
        );
        record.answers = vec![
            Answer::new(true_text, is_true, if is_true { on_correct } else { on_wrong }),
            Answer::new(false_text, !is_true, if is_true { on_wrong } else { on_correct }),
        ];
        record.media.extend(resolve_media_field(scratch, params));

        Some(record)
    }
}

/// `correct` is normally the string "true"/"false"; accept a bool too
fn correct_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}
