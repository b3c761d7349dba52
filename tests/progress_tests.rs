//! Tests for the progress module functionality.
//!
//! This file contains tests for the JSON-lines status channel, the in-memory
//! recorder and the terminal progress display.

use butler::progress::{JsonLines, ProgressBarOpts, ProgressDisplay, Recorder, StatusMessage, StatusSink};

#[test]
fn test_json_lines_record_shapes() {
    let channel = JsonLines::new(Vec::new());
    channel.message("Asking for range bytes=400-".to_string());
    channel.percent(100);
    channel.error("server error: http 416 Range Not Satisfiable".to_string());

    let out = String::from_utf8(channel.into_inner()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"message":"Asking for range bytes=400-"}"#,
            r#"{"percent":100}"#,
            r#"{"error":"server error: http 416 Range Not Satisfiable"}"#,
        ]
    );
}

#[test]
fn test_records_parse_back() {
    let record: StatusMessage = serde_json::from_str(r#"{"percent":42}"#).unwrap();
    assert_eq!(record, StatusMessage::Progress { percent: 42 });

    let record: StatusMessage = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
    assert_eq!(
        record,
        StatusMessage::Error {
            error: "boom".to_string()
        }
    );
}

#[test]
fn test_recorder_clones_share_records() {
    let recorder = Recorder::new();
    let clone = recorder.clone();
    clone.message("all downloaded!".to_string());
    clone.percent(10);

    assert_eq!(recorder.messages(), vec!["all downloaded!".to_string()]);
    assert_eq!(recorder.percents(), vec![10]);
    assert_eq!(recorder.records().len(), 2);
}

#[test]
fn test_progress_bar_opts_hidden() {
    let opts = ProgressBarOpts::hidden();
    assert!(!opts.is_enabled());
    assert!(opts.to_progress_bar(100).is_hidden());
}

#[test]
fn test_progress_bar_opts_default_is_percent() {
    let opts = ProgressBarOpts::default();
    assert!(opts.is_enabled());
    assert_eq!(opts.to_progress_bar(100).length(), Some(100));
}

#[test]
fn test_progress_display_tracks_percent() {
    let display = ProgressDisplay::new(ProgressBarOpts::hidden());
    display.percent(30);
    display.percent(80);
    assert_eq!(display.position(), 80);

    display.message("checking file size. should be 10, is 10".to_string());
    display.finish();
    display.finish();
}
