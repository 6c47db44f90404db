//! Text helpers shared by the converters: JSON field access, HTML to plain
//! text, and the `*answer*` blank markup used by Blanks and DragText.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space regex"));
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid marker regex"));

/// Stand-in for an escaped asterisk while markers are parsed
const ESCAPED_STAR: char = '\u{E000}';

/// String field of a JSON object, or "" when missing or not a string
pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// String at a JSON pointer, or ""
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or_default()
}

/// Array at a JSON pointer, or an empty slice
pub fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Number at a JSON pointer; H5P stores some numbers as strings
pub fn f64_at(value: &Value, pointer: &str) -> f64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Strip tags, decode common entities and collapse whitespace
pub fn plain_text(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    SPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// A blank parsed from `*answer/alternative:tip*` markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Placeholder number in the rewritten text
    pub slot: usize,

    /// First accepted answer
    pub answer: String,

    /// Further accepted answers
    pub alternatives: Vec<String>,

    /// Hint shown to the learner
    pub tip: String,
}

/// Replace every marker in `text` with `[[n]]`, numbering from `first_slot`.
///
/// With `split_alternatives`, `/` separates accepted answers (Blanks);
/// otherwise the whole answer part is one word (DragText). `\*` is an
/// escaped literal asterisk.
pub fn extract_markers(text: &str, first_slot: usize, split_alternatives: bool) -> (String, Vec<Marker>) {
    let escaped = text.replace("\\*", &ESCAPED_STAR.to_string());
    let mut markers = Vec::new();

    let rewritten = MARKER_RE.replace_all(&escaped, |caps: &regex::Captures<'_>| {
        let slot = first_slot + markers.len();
        let inner = unescape(&caps[1]);
        let (answer_part, tip) = match inner.split_once(':') {
            Some((answer, tip)) => (answer.to_string(), tip.trim().to_string()),
            None => (inner.clone(), String::new()),
        };

        let mut answers: Vec<String> = if split_alternatives {
            answer_part
                .split('/')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect()
        } else {
            vec![answer_part.trim().to_string()]
        };
        let answer = if answers.is_empty() {
            String::new()
        } else {
            answers.remove(0)
        };

        markers.push(Marker {
            slot,
            answer,
            alternatives: answers,
            tip,
        });
        format!("[[{}]]", slot)
    });

    (unescape(&rewritten), markers)
}

fn unescape(text: &str) -> String {
    text.replace(ESCAPED_STAR, "*")
}
