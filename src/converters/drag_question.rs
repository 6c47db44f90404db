//! H5P.DragQuestion → drag-and-drop question.
//!
//! Draggable elements become answers in their original order; drop zones
//! keep their geometry and point back at the answers they accept.

use serde_json::Value;

use super::media::resolve_file;
use super::text::{array_at, f64_at, plain_text, str_at};
use super::Converter;
use crate::core::scratch::ScratchDir;
use crate::domain::{Answer, ContentFragment, DropZone, QuestionRecord, QuestionType};

pub struct DragQuestionConverter;

impl Converter for DragQuestionConverter {
    fn library(&self) -> &'static str {
        "H5P.DragQuestion"
    }

    fn question_type(&self) -> QuestionType {
        QuestionType::DragAndDrop
    }

    fn convert(&self, fragment: &ContentFragment, scratch: &ScratchDir) -> Option<QuestionRecord> {
        let params = &fragment.params;
        let elements = array_at(params, "/question/task/elements");
        let zones = array_at(params, "/question/task/dropZones");
        if elements.is_empty() || zones.is_empty() {
            return None;
        }

        let drop_zones: Vec<DropZone> = zones
            .iter()
            .map(|zone| DropZone {
                label: plain_text(str_at(zone, "/label")),
                x: f64_at(zone, "/x"),
                y: f64_at(zone, "/y"),
                width: f64_at(zone, "/width"),
                height: f64_at(zone, "/height"),
                correct_answers: indices(zone.get("correctElements"))
                    .into_iter()
                    .filter(|&i| i < elements.len())
                    .collect(),
            })
            .collect();

        let title = str_at(params, "/question/settings/questionTitle").trim();
        let question_text = if title.is_empty() {
            fragment.title()
        } else {
            title
        };
        let mut record = QuestionRecord::new(QuestionType::DragAndDrop, fragment.title(), question_text);

        for (i, element) in elements.iter().enumerate() {
            let zone = drop_zones.iter().position(|z| z.correct_answers.contains(&i));
            let feedback = zone
                .map(|z| str_at(&zones[z], "/tipsAndFeedback/feedbackOnCorrect"))
                .unwrap_or_default();

            let mut answer = Answer::new(element_text(element), zone.is_some(), feedback.trim());
            answer.group = zone;
            record.answers.push(answer);

            if let Some(file) = element.pointer("/type/params/file") {
                record
                    .media
                    .extend(resolve_file(scratch, file, str_at(element, "/type/params/alt")));
            }
        }

        if let Some(background) = params.pointer("/question/settings/background") {
            record.media.extend(resolve_file(scratch, background, ""));
        }
        record.drop_zones = drop_zones;

        Some(record)
    }
}

/// Display text of a draggable: its text, or an image's alt text
fn element_text(element: &Value) -> String {
    let text = plain_text(str_at(element, "/type/params/text"));
    if !text.is_empty() {
        return text;
    }
    let alt = str_at(element, "/type/params/alt").trim();
    if !alt.is_empty() {
        return alt.to_string();
    }
    str_at(element, "/type/params/file/path").to_string()
}

/// Element indices, stored either as strings ("0") or numbers
fn indices(value: Option<&Value>) -> Vec<usize> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| match v {
                    Value::String(s) => s.trim().parse().ok(),
                    Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
