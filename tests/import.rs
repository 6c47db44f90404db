//! Import Pipeline Integration Tests
//!
//! Builds real .h5p archives on disk and runs them through the importer.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use h5pimport::cli::import_all;
use h5pimport::core::{package_id, ErrorKind, ImportOptions, Importer, SkipReason};
use h5pimport::sinks::RecordingErrorSink;
use h5pimport::QuestionType;

/// Write an .h5p archive with the given manifest, content and extra files
fn write_package(path: &Path, manifest: &Value, content: &Value, extra: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);

    writer.start_file("h5p.json", SimpleFileOptions::default()).unwrap();
    writer.write_all(manifest.to_string().as_bytes()).unwrap();
    writer
        .start_file("content/content.json", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(content.to_string().as_bytes()).unwrap();

    for (name, body) in extra {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap();
}

fn manifest(main_library: &str) -> Value {
    json!({
        "title": "Test package",
        "mainLibrary": main_library,
        "language": "en",
        "embedTypes": ["iframe"],
        "preloadedDependencies": [
            {"machineName": main_library, "majorVersion": 1, "minorVersion": 0}
        ]
    })
}

fn true_false(question: &str, correct: &str) -> Value {
    json!({"question": question, "correct": correct})
}

fn multichoice() -> Value {
    json!({
        "question": "<p>Pick two</p>",
        "answers": [
            {"text": "A", "correct": true},
            {"text": "B", "correct": true},
            {"text": "C", "correct": false}
        ]
    })
}

struct Fixture {
    temp: TempDir,
    sink: Arc<RecordingErrorSink>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            sink: Arc::new(RecordingErrorSink::new()),
        }
    }

    fn scratch_root(&self) -> PathBuf {
        self.temp.path().join("scratch")
    }

    fn options(&self) -> ImportOptions {
        ImportOptions {
            scratch_root: self.scratch_root(),
            ..Default::default()
        }
    }

    fn importer(&self) -> Importer {
        self.importer_with(self.options())
    }

    fn importer_with(&self, options: ImportOptions) -> Importer {
        Importer::new(options).with_error_sink(self.sink.clone())
    }

    fn package(&self, name: &str, manifest: &Value, content: &Value) -> PathBuf {
        let path = self.temp.path().join(name);
        write_package(&path, manifest, content, &[]);
        path
    }

    /// No per-import scratch directories are left behind
    fn assert_scratch_clean(&self) {
        let root = self.scratch_root();
        if root.exists() {
            let leftovers: Vec<_> = std::fs::read_dir(&root).unwrap().collect();
            assert!(leftovers.is_empty(), "scratch dirs left behind: {:?}", leftovers);
        }
    }
}

#[test]
fn test_single_true_false_package() {
    let fx = Fixture::new();
    let path = fx.package(
        "tf.h5p",
        &manifest("H5P.TrueFalse"),
        &true_false("<p>The sky is blue</p>", "true"),
    );

    let outcome = fx.importer().import(&path).unwrap();

    assert_eq!(outcome.questions.len(), 1);
    let question = &outcome.questions[0];
    assert_eq!(question.question_type, QuestionType::TrueFalse);
    assert_eq!(question.title, "Test package");
    assert_eq!(question.answers.len(), 2);
    assert!(question.answers[0].correct);
    assert!(!question.answers[1].correct);

    assert_eq!(outcome.package_id.len(), 16);
    assert_eq!(outcome.manifest.main_library, "H5P.TrueFalse");
    assert!(fx.sink.reports().is_empty());
    fx.assert_scratch_clean();
}

#[test]
fn test_single_fragment_types_use_manifest_title() {
    let fx = Fixture::new();
    let cases = [
        (
            "H5P.Blanks",
            json!({"questions": ["<p>Rust is *fast*</p>"]}),
            QuestionType::FillInTheBlank,
        ),
        (
            "H5P.DragQuestion",
            json!({"question": {"task": {
                "elements": [{"type": {"params": {"text": "Cat"}}}],
                "dropZones": [{"label": "Mammals", "correctElements": ["0"]}]
            }}}),
            QuestionType::DragAndDrop,
        ),
        ("H5P.TrueFalse", true_false("Q", "true"), QuestionType::TrueFalse),
        (
            "H5P.DragText",
            json!({"textField": "Drop *here*"}),
            QuestionType::DragText,
        ),
    ];

    for (library, content, expected) in cases {
        let path = fx.package(&format!("{}.h5p", library), &manifest(library), &content);
        let outcome = fx.importer().import(&path).unwrap();

        assert_eq!(outcome.report.fragments, 1, "{}", library);
        assert_eq!(outcome.questions.len(), 1, "{}", library);
        assert_eq!(outcome.questions[0].question_type, expected);
        assert_eq!(outcome.questions[0].title, "Test package");
    }
    fx.assert_scratch_clean();
}

#[test]
fn test_missing_content_json_is_malformed() {
    let fx = Fixture::new();
    let path = fx.temp.path().join("nocontent.h5p");
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer.start_file("h5p.json", SimpleFileOptions::default()).unwrap();
    writer
        .write_all(manifest("H5P.TrueFalse").to_string().as_bytes())
        .unwrap();
    writer.finish().unwrap();

    let err = fx.importer().import(&path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedContent);
    assert_eq!(fx.sink.reports()[0].0, "h5p.error.malformed_content");
    fx.assert_scratch_clean();
}

#[test]
fn test_single_choice_set_capitals() {
    let fx = Fixture::new();
    let content = json!({
        "choices": [{"question": "Capital of France?", "answers": ["Paris", "London", "Berlin"]}],
        "l10n": {"correctText": "Well done", "incorrectText": "Try again"}
    });
    let path = fx.package("capitals.h5p", &manifest("H5P.SingleChoiceSet"), &content);

    let outcome = fx.importer().import(&path).unwrap();

    let answers = &outcome.questions[0].answers;
    assert_eq!(answers.len(), 3);
    assert!(answers[0].correct);
    assert!(!answers[1].correct);
    assert!(!answers[2].correct);
    assert_eq!(answers[0].feedback, "Well done");
    assert_eq!(answers[1].feedback, "Try again");
    assert_eq!(answers[2].feedback, "Try again");
}

#[test]
fn test_question_set_preserves_order_and_skips() {
    let fx = Fixture::new();
    let content = json!({
        "questions": [
            {"library": "H5P.TrueFalse 1.6", "params": true_false("First", "false"), "metadata": {"title": "one"}},
            {"library": "H5P.Essay 1.5", "params": {}, "metadata": {"title": "essay"}},
            {"library": "H5P.MultiChoice 1.16", "params": multichoice(), "metadata": {"title": "three"}},
            {"params": {}}
        ]
    });
    let path = fx.package("set.h5p", &manifest("H5P.QuestionSet"), &content);

    let outcome = fx.importer().import(&path).unwrap();

    let titles: Vec<_> = outcome.questions.iter().map(|q| q.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "three"]);
    assert_eq!(outcome.questions[1].question_type, QuestionType::MultiChoice);
    assert_eq!(outcome.questions[1].single_answer, Some(false));

    let report = &outcome.report;
    assert_eq!(report.fragments, 4);
    assert_eq!(report.converted, 2);
    assert_eq!(report.skipped_for(SkipReason::Unrecognized), 1);
    assert_eq!(report.skipped_for(SkipReason::MissingLibrary), 1);

    // Skips are not fatal and never reach the error sink
    assert!(fx.sink.reports().is_empty());
    fx.assert_scratch_clean();
}

#[test]
fn test_column_unwraps_nested_content() {
    let fx = Fixture::new();
    let content = json!({
        "content": [
            {"content": {"library": "H5P.AdvancedText 1.1", "params": {"text": "<p>Intro</p>"}}},
            {"content": {"library": "H5P.TrueFalse 1.6", "params": true_false("Q", "true"), "metadata": {"title": "tf"}}},
            {"content": {"library": "H5P.DragText 1.8", "params": {"textField": "Rust is *fast*."}, "metadata": {"title": "dt"}}}
        ]
    });
    let path = fx.package("column.h5p", &manifest("H5P.Column"), &content);

    let outcome = fx.importer().import(&path).unwrap();

    let types: Vec<_> = outcome.questions.iter().map(|q| q.question_type).collect();
    assert_eq!(types, vec![QuestionType::TrueFalse, QuestionType::DragText]);
    assert_eq!(outcome.report.skipped.len(), 1);
    assert_eq!(outcome.report.skipped[0].index, 0);
    fx.assert_scratch_clean();
}

#[test]
fn test_single_choice_set_first_answer_correct() {
    let fx = Fixture::new();
    let content = json!({
        "choices": [
            {"question": "<p>2 + 2?</p>", "answers": ["4", "5", "22"]},
            {"question": "Capital of France?", "answers": ["Paris", "Lyon"]}
        ],
        "l10n": {"correctText": "Correct!", "incorrectText": "Nope"}
    });
    let path = fx.package("scs.h5p", &manifest("H5P.SingleChoiceSet"), &content);

    let outcome = fx.importer().import(&path).unwrap();

    assert_eq!(outcome.questions.len(), 2);
    for question in &outcome.questions {
        assert_eq!(question.question_type, QuestionType::MultiChoice);
        assert_eq!(question.single_answer, Some(true));
        assert_eq!(question.correct_answers().count(), 1);
        assert!(question.answers[0].correct);
        assert_eq!(question.answers[0].feedback, "Correct!");
    }
    assert_eq!(outcome.questions[0].title, "2 + 2?");
    assert_eq!(outcome.questions[0].answers[2].feedback, "Nope");
}

#[test]
fn test_unsupported_main_library_is_fatal() {
    let fx = Fixture::new();
    let path = fx.package("essay.h5p", &manifest("H5P.Essay"), &json!({}));

    let err = fx.importer().import(&path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedContentType);
    let reports = fx.sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "h5p.error.unsupported_content_type");
    fx.assert_scratch_clean();
}

#[test]
fn test_missing_input_is_unreadable() {
    let fx = Fixture::new();
    let result = fx.importer().import(&fx.temp.path().join("nope.h5p"));

    // No partial question list survives a fatal error
    let err = match result {
        Ok(outcome) => panic!("Expected failure, got {} question(s)", outcome.questions.len()),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::UnreadableInput);

    let reports = fx.sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "h5p.error.unreadable_input");
    fx.assert_scratch_clean();
}

#[test]
fn test_question_set_children_with_null_metadata() {
    let fx = Fixture::new();
    let content = json!({
        "questions": [
            {"library": "H5P.TrueFalse 1.6", "params": true_false("First", "true"), "metadata": null},
            {"library": "H5P.TrueFalse 1.6", "params": true_false("Second", "false"), "metadata": {"title": null}}
        ]
    });
    let path = fx.package("nullmeta.h5p", &manifest("H5P.QuestionSet"), &content);

    let outcome = fx.importer().import(&path).unwrap();

    assert_eq!(outcome.questions.len(), 2);
    assert_eq!(outcome.report.skipped_for(SkipReason::MissingLibrary), 0);
    assert_eq!(outcome.questions[1].question_text, "Second");
}

#[test]
fn test_package_with_content_zip_entry() {
    let fx = Fixture::new();
    let path = fx.temp.path().join("shadow.h5p");
    write_package(
        &path,
        &manifest("H5P.TrueFalse"),
        &true_false("Q", "true"),
        &[("content.zip", &b"not the package"[..])],
    );

    let outcome = fx.importer().import(&path).unwrap();

    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.package_id, package_id(&path).unwrap());
    assert_eq!(outcome.report.denied_entries, 1);
    fx.assert_scratch_clean();
}

#[test]
fn test_corrupt_archive_fails_extraction() {
    let fx = Fixture::new();
    let path = fx.temp.path().join("broken.h5p");
    std::fs::write(&path, b"this is not a zip file").unwrap();

    let err = fx.importer().import(&path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExtractFailed);
    assert_eq!(fx.sink.reports().len(), 1);
    fx.assert_scratch_clean();
}

#[test]
fn test_malformed_content_documents() {
    let fx = Fixture::new();

    // Manifest without mainLibrary
    let path = fx.package("nomain.h5p", &json!({"title": "x"}), &json!({}));
    let err = fx.importer().import(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedContent);

    // content.json that isn't JSON
    let path = fx.temp.path().join("badjson.h5p");
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer.start_file("h5p.json", SimpleFileOptions::default()).unwrap();
    writer
        .write_all(manifest("H5P.TrueFalse").to_string().as_bytes())
        .unwrap();
    writer
        .start_file("content/content.json", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"{not json").unwrap();
    writer.finish().unwrap();

    let err = fx.importer().import(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedContent);

    assert_eq!(fx.sink.reports().len(), 2);
    fx.assert_scratch_clean();
}

#[test]
fn test_lowercase_multichoice_main_library() {
    let fx = Fixture::new();
    let path = fx.package("mc.h5p", &manifest("H5P.Multichoice"), &multichoice());

    // Exact matching: the package unwraps but no converter claims it
    let outcome = fx.importer().import(&path).unwrap();
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.report.skipped_for(SkipReason::Unrecognized), 1);

    // Case-insensitive matching: exactly one record
    let options = ImportOptions {
        strict_library_names: false,
        ..fx.options()
    };
    let outcome = fx.importer_with(options).import(&path).unwrap();
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].question_type, QuestionType::MultiChoice);
    fx.assert_scratch_clean();
}

#[test]
fn test_media_digest_and_export() {
    let fx = Fixture::new();
    let content = json!({
        "question": "Is this a cat?",
        "correct": "true",
        "media": {
            "type": {
                "library": "H5P.Image 1.1",
                "params": {"file": {"path": "images/cat.png", "mime": "image/png"}, "alt": "A cat"}
            }
        }
    });
    let path = fx.temp.path().join("media.h5p");
    write_package(
        &path,
        &manifest("H5P.TrueFalse"),
        &content,
        &[("content/images/cat.png", &b"png-bytes"[..])],
    );

    let media_dir = fx.temp.path().join("media");
    let options = ImportOptions {
        media_dir: Some(media_dir.clone()),
        ..fx.options()
    };
    let outcome = fx.importer_with(options).import(&path).unwrap();

    let media = &outcome.questions[0].media[0];
    assert_eq!(media.path, "images/cat.png");
    assert_eq!(media.alt.as_deref(), Some("A cat"));
    assert_eq!(media.size_bytes, Some(9));
    assert!(media.is_present());

    // The export survives the scratch directory
    let exported = PathBuf::from(media.exported_path.as_ref().unwrap());
    assert!(exported.starts_with(&media_dir));
    assert_eq!(std::fs::read(&exported).unwrap(), b"png-bytes");
    fx.assert_scratch_clean();
}

#[test]
fn test_denylisted_entries_are_not_extracted() {
    let fx = Fixture::new();
    let path = fx.temp.path().join("php.h5p");
    write_package(
        &path,
        &manifest("H5P.TrueFalse"),
        &true_false("Q", "false"),
        &[("content/evil.php", &b"<?php ?>"[..])],
    );

    let outcome = fx.importer().import(&path).unwrap();

    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.report.denied_entries, 1);
    assert_eq!(outcome.report.extracted_entries, 2);
}

#[test]
fn test_inspect_lists_fragments() {
    let fx = Fixture::new();
    let content = json!({
        "questions": [
            {"library": "H5P.TrueFalse 1.6", "params": true_false("Q", "true"), "metadata": {"title": "tf"}},
            {"library": "H5P.Essay 1.5", "params": {}, "metadata": {"title": "essay"}}
        ]
    });
    let path = fx.package("set.h5p", &manifest("H5P.QuestionSet"), &content);

    let inspection = fx.importer().inspect(&path).unwrap();

    assert_eq!(inspection.manifest.main_library, "H5P.QuestionSet");
    assert_eq!(inspection.fragments.len(), 2);
    assert_eq!(inspection.fragments[0].converter, Some("H5P.TrueFalse"));
    assert_eq!(inspection.fragments[1].converter, None);
    fx.assert_scratch_clean();
}

#[test]
fn test_package_id_matches_file_contents() {
    let fx = Fixture::new();
    let path = fx.package("tf.h5p", &manifest("H5P.TrueFalse"), &true_false("Q", "true"));
    let copy = fx.temp.path().join("copy.h5p");
    std::fs::copy(&path, &copy).unwrap();

    let importer = fx.importer();
    let first = importer.import(&path).unwrap();
    let second = importer.import(&copy).unwrap();

    assert_eq!(first.package_id, second.package_id);
    assert_eq!(first.questions, second.questions);
}

#[tokio::test]
async fn test_import_all_runs_concurrently_in_order() {
    let fx = Fixture::new();
    let mut paths = Vec::new();
    for i in 0..4 {
        paths.push(fx.package(
            &format!("tf{}.h5p", i),
            &manifest("H5P.TrueFalse"),
            &true_false(&format!("Question {}", i), "true"),
        ));
    }
    paths.push(fx.temp.path().join("missing.h5p"));

    let importer = Arc::new(fx.importer());
    let results = import_all(importer, paths.clone()).await.unwrap();

    assert_eq!(results.len(), 5);
    for (i, (path, result)) in results.iter().enumerate() {
        assert_eq!(path, &paths[i]);
        if i < 4 {
            let outcome = result.as_ref().unwrap();
            assert_eq!(outcome.questions[0].question_text, format!("Question {}", i));
        } else {
            assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::UnreadableInput);
        }
    }

    assert_eq!(fx.sink.reports().len(), 1);
    fx.assert_scratch_clean();
}
