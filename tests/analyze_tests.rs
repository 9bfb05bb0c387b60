//! End-to-end tests: recording fixtures on disk through scan, aggregation,
//! and report rendering.

use pretty_assertions::assert_eq;
use replay_lens::aggregator::Analysis;
use replay_lens::output::{read_report, render_text, write_report, Report};
use replay_lens::parser::{recording_paths, scan_recording};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn analyze_path(path: &Path) -> Analysis {
    let mut analysis = Analysis::new();
    for file in recording_paths(path).unwrap() {
        let mut file_analysis = Analysis::new();
        let outcome = scan_recording(&file, &mut |event| file_analysis.record_event(&event))
            .unwrap();
        file_analysis.note_scan(outcome);
        analysis.merge(file_analysis);
    }
    analysis
}

fn export_fixture() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    // Pretty-printed export wrapper, the ph-recording.json shape
    let contents = serde_json::to_string_pretty(&serde_json::json!({
        "data": {
            "snapshots": [
                {"windowId": "w1", "type": 4, "data": {"href": "https://example.com", "width": 384, "height": 726}, "timestamp": 1709810585828i64},
                {"windowId": "w1", "type": 2, "data": {"isAttachIframe": true}, "timestamp": 1709810586000i64},
                {"windowId": "w1", "type": 3, "data": {
                    "source": 0,
                    "adds": [
                        {"parentId": 1, "node": {"type": 1, "tagName": "div", "attributes": {"class": "wrapper"}}},
                        {"parentId": 1, "node": {"type": 3, "textContent": "hello"}}
                    ],
                    "removes": [{"parentId": 1, "id": 9}],
                    "texts": [],
                    "attributes": [{"id": 5, "attributes": {"style": "display: none"}}]
                }, "timestamp": 1709810588000i64},
                {"windowId": "w1", "type": 3, "data": {"source": 1, "positions": [{"x": 1, "y": 2, "id": 3, "timeOffset": 0}]}, "timestamp": 1709810590000i64},
                {"windowId": "w1", "type": 6, "data": {"plugin": "rrweb/console@1", "payload": {"level": "log", "payload": ["\"hi\""]}}, "timestamp": 1709810645828i64}
            ]
        }
    }))
    .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_analyze_export_file() {
    let fixture = export_fixture();
    let analysis = analyze_path(fixture.path());

    assert_eq!(analysis.total_events, 5);
    assert_eq!(analysis.files_analyzed, 1);
    assert_eq!(analysis.event_type_counts["Meta"], 1);
    assert_eq!(analysis.event_type_counts["FullSnapshot"], 1);
    assert_eq!(analysis.event_type_counts["IncrementalSnapshot"], 2);
    assert_eq!(analysis.event_type_counts["Plugin"], 1);

    assert_eq!(analysis.attach_iframe_count, 1);
    assert_eq!(analysis.full_snapshot_timestamps, vec![1709810586000]);

    assert_eq!(analysis.addition_counts["Element"].count, 1);
    assert_eq!(analysis.addition_counts["Text"].count, 1);
    assert_eq!(analysis.removals.count, 1);
    assert_eq!(analysis.attributes_individual["style"].count, 1);
    assert_eq!(analysis.attributes_grouped["style"].count, 1);

    assert_eq!(analysis.plugin_counts["rrweb/console@1"].count, 1);
    assert_eq!(analysis.console_log_counts["log"].count, 1);

    // 1709810585828 .. 1709810645828 is exactly one minute
    assert_eq!(analysis.duration_ms(), Some(60_000));
}

#[test]
fn test_analyze_directory_merges_files() {
    let dir = tempfile::tempdir().unwrap();

    std::fs::write(
        dir.path().join("part-0.json"),
        r#"[{"type": 4, "timestamp": 1000}, {"type": 3, "data": {"source": 3}, "timestamp": 2000}]"#,
    )
    .unwrap();
    // Second chunk is line-delimited with a truncated final line
    std::fs::write(
        dir.path().join("part-1.jsonl"),
        "{\"type\": 3, \"data\": {\"source\": 3}, \"timestamp\": 9000}\n{\"type\": 2, \"timest",
    )
    .unwrap();

    let analysis = analyze_path(dir.path());

    assert_eq!(analysis.files_analyzed, 2);
    assert_eq!(analysis.total_events, 3);
    assert_eq!(analysis.incremental_source_counts["Scroll"].count, 2);
    assert_eq!(analysis.first_timestamp, Some(1000));
    assert_eq!(analysis.last_timestamp, Some(9000));
    assert_eq!(analysis.unterminated_lines.len(), 1);
    assert_eq!(analysis.unterminated_lines[0].line_index, 1);
}

#[test]
fn test_report_text_contains_all_sections() {
    let fixture = export_fixture();
    let analysis = analyze_path(fixture.path());
    let report = Report::from_analysis(&analysis, 10);
    let text = render_text(&report);

    assert!(text.contains("RECORDING ANALYSIS"));
    assert!(text.contains("Session start:    2024-03-07T11:23:05Z"));
    assert!(text.contains("Session duration: 0:01:00"));
    assert!(text.contains("Full snapshots:"));
    assert!(text.contains("FullSnapshot: 1"));
    assert!(text.contains("Mutation:"));
    assert!(text.contains("MouseMove:"));
    assert!(text.contains("removals: 1"));
    assert!(text.contains("Attach-iframe full snapshots: 1"));
    assert!(text.contains("rrweb/console@1"));
    assert!(text.contains("mutation buckets by size"));
}

#[test]
fn test_report_json_write_and_validate_round_trip() {
    let fixture = export_fixture();
    let analysis = analyze_path(fixture.path());
    let report = Report::from_analysis(&analysis, 10);

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    write_report(&report, &report_path).unwrap();

    let loaded = read_report(&report_path).unwrap();
    assert_eq!(loaded.version, report.version);
    assert_eq!(loaded.total_events, 5);
    assert_eq!(loaded.event_type_counts, report.event_type_counts);
    assert_eq!(loaded.mutations.addition_count, 2);
    assert_eq!(loaded.attach_iframe_count, 1);
}

#[test]
fn test_top_mutations_ranked_by_size() {
    let fixture = export_fixture();
    let analysis = analyze_path(fixture.path());
    let report = Report::from_analysis(&analysis, 2);

    assert_eq!(report.top_mutations.len(), 2);
    assert!(report.top_mutations[0].bytes >= report.top_mutations[1].bytes);
}
