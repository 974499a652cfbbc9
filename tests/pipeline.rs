mod common;

use std::fs;
use std::path::Path;

use pdf_keyword_tally::{
    Error, ExtractError, KeywordSpec, PdfExtractor, Pipeline, RunConfig, RunOutcome, RunReport,
    SpecError, StateError, StaticPages,
};
use tempfile::tempdir;

use common::make_pdf;

fn policy(keywords: &[&str]) -> KeywordSpec {
    KeywordSpec::new([("Policy", keywords.to_vec())]).unwrap()
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::ExtractionFailed(e) => panic!("extraction failed: {e}"),
    }
}

#[test_log::test]
fn runs_accumulate_in_the_state_file() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax"]), &state));
    let doc = Path::new("unused.pdf");

    let first = completed(
        pipeline
            .run(doc, &StaticPages::new(["tax tax", "no match"]))
            .unwrap(),
    );
    assert_eq!(first.tally.get("Policy", "tax"), Some(2));
    assert_eq!(first.state.get("Policy", "tax"), Some(2));

    let second = completed(
        pipeline
            .run(doc, &StaticPages::new(["tax", "tax tax tax tax"]))
            .unwrap(),
    );
    assert_eq!(second.tally.get("Policy", "tax"), Some(5));
    assert_eq!(second.state.get("Policy", "tax"), Some(7));
    assert_eq!(second.summary, "Policy:\n  tax: 7\nTotal: 7\n");

    let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(on_disk, serde_json::json!({ "Policy": { "tax": 7 } }));
}

#[test]
fn new_keyword_joins_existing_history() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    fs::write(&state, r#"{"Policy": {"tax": 7}}"#).unwrap();

    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax", "carbon"]), &state));
    let report = completed(
        pipeline
            .run(Path::new("unused.pdf"), &StaticPages::new(["carbon"]))
            .unwrap(),
    );

    let triples: Vec<_> = report.state.iter().collect();
    assert_eq!(triples, vec![("Policy", "tax", 7), ("Policy", "carbon", 1)]);
}

#[test]
fn missing_document_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    let before = b"{\n  \"Policy\": {\n    \"tax\": 5\n  }\n}\n".to_vec();
    fs::write(&state, &before).unwrap();

    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax"]), &state));
    let outcome = pipeline
        .run(&dir.path().join("absent.pdf"), &PdfExtractor::default())
        .unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::ExtractionFailed(ExtractError::DocumentNotFound { .. })
    ));
    assert_eq!(fs::read(&state).unwrap(), before);
    assert!(!dir.path().join("counts.json.lock").exists());
}

#[test]
fn unreadable_document_never_creates_state() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    let doc = dir.path().join("broken.pdf");
    fs::write(&doc, b"%PDF-1.4 truncated").unwrap();

    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax"]), &state));
    let outcome = pipeline.run(&doc, &PdfExtractor::default()).unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::ExtractionFailed(ExtractError::DocumentUnreadable { .. })
    ));
    assert!(!state.exists());
}

#[test]
fn corrupted_state_is_fatal_and_preserved() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    fs::write(&state, b"not json").unwrap();

    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax"]), &state));
    let err = pipeline
        .run(Path::new("unused.pdf"), &StaticPages::new(["tax"]))
        .unwrap_err();

    assert!(matches!(err, Error::State(StateError::Corrupted { .. })));
    assert_eq!(fs::read(&state).unwrap(), b"not json");
}

#[test]
fn end_to_end_with_a_pdf() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("paper.pdf");
    fs::write(&doc, make_pdf(&["Brexit tax", "Brexit uncertainty"])).unwrap();
    let state = dir.path().join("state").join("counts.json");

    let spec = KeywordSpec::new([
        ("Policy related", vec!["Brexit", "tax"]),
        ("Uncertainty related", vec!["uncertainty"]),
    ])
    .unwrap();
    let pipeline = Pipeline::new(RunConfig::new(spec, &state));
    let report = completed(pipeline.run(&doc, &PdfExtractor::default()).unwrap());

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.pages[1].counts.get("Policy related", "Brexit"), Some(1));
    assert_eq!(report.state.get("Policy related", "Brexit"), Some(2));
    assert_eq!(report.state.get("Policy related", "tax"), Some(1));
    assert_eq!(report.state.get("Uncertainty related", "uncertainty"), Some(1));
    assert!(state.exists());
}

#[test]
fn concurrent_runs_lose_no_updates() {
    const RUNS: u64 = 8;
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");
    let pipeline = Pipeline::new(RunConfig::new(policy(&["tax"]), &state));

    std::thread::scope(|scope| {
        for _ in 0..RUNS {
            scope.spawn(|| {
                completed(
                    pipeline
                        .run(Path::new("unused.pdf"), &StaticPages::new(["tax tax"]))
                        .unwrap(),
                );
            });
        }
    });

    let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(on_disk, serde_json::json!({ "Policy": { "tax": 2 * RUNS } }));
}

#[test]
fn keyword_file_configures_the_run() {
    let dir = tempdir().unwrap();
    let keywords = dir.path().join("keywords.toml");
    fs::write(
        &keywords,
        "[[category]]\nname = \"Risk\"\nkeywords = [\"risk\"]\n",
    )
    .unwrap();
    let state = dir.path().join("counts.json");

    let config = RunConfig::from_keyword_file(Some(&keywords), &state).unwrap();
    let report = completed(
        Pipeline::new(config)
            .run(Path::new("unused.pdf"), &StaticPages::new(["risk risk"]))
            .unwrap(),
    );
    assert_eq!(report.state.get("Risk", "risk"), Some(2));
}

#[test]
fn bad_keyword_file_is_a_spec_error() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");

    let missing = RunConfig::from_keyword_file(Some(&dir.path().join("absent.toml")), &state);
    assert!(matches!(missing, Err(Error::Spec(SpecError::Io { .. }))));

    let keywords = dir.path().join("keywords.toml");
    fs::write(
        &keywords,
        "[[category]]\nname = \"Risk\"\nkeywords = [\"\"]\n",
    )
    .unwrap();
    let empty = RunConfig::from_keyword_file(Some(&keywords), &state);
    assert!(matches!(
        empty,
        Err(Error::Spec(SpecError::EmptyKeyword { .. }))
    ));
    assert!(!state.exists());
}

#[test]
fn built_in_keywords_are_used_without_a_file() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("counts.json");

    let config = RunConfig::from_keyword_file(None, &state).unwrap();
    let report = completed(
        Pipeline::new(config)
            .run(Path::new("unused.pdf"), &StaticPages::new(["Brexit"]))
            .unwrap(),
    );
    assert_eq!(report.state.get("Policy related", "Brexit"), Some(1));
}
