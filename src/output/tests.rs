//! Tests for output module

use super::*;
use crate::schema::{JsonType, SchemaProperty};
use crate::state::State;
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::json;

fn object(value: serde_json::Value) -> JsonObject {
    value.as_object().unwrap().clone()
}

// ============================================================================
// Enrich Tests
// ============================================================================

#[test]
fn test_enrich_adds_provenance() {
    let row = enrich(object(json!({"id": "1"})), "bucket", "data/a.csv", 0);
    assert_eq!(
        serde_json::Value::Object(row),
        json!({
            "id": "1",
            "_sdc_source_bucket": "bucket",
            "_sdc_source_file": "data/a.csv",
            "_sdc_source_lineno": 2
        })
    );
}

#[test]
fn test_enrich_line_numbers_follow_header() {
    let row = enrich(JsonObject::new(), "b", "k", 9);
    assert_eq!(row["_sdc_source_lineno"], json!(11));
}

#[test]
fn test_enrich_overwrites_colliding_columns() {
    let row = enrich(
        object(json!({"_sdc_source_file": "spoofed", "_sdc_source_lineno": "x"})),
        "b",
        "real.csv",
        0,
    );
    assert_eq!(row["_sdc_source_file"], json!("real.csv"));
    assert_eq!(row["_sdc_source_lineno"], json!(2));
}

// ============================================================================
// Message Serialization Tests
// ============================================================================

#[test]
fn test_sequenced_record_injects_sequence() {
    let record = SequencedRecord::new(object(json!({"id": 1})), 1_580_515_200);
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"id": 1, "sequence": 1_580_515_200})
    );
}

#[test]
fn test_sequenced_record_replaces_data_sequence() {
    let record = SequencedRecord::new(object(json!({"sequence": "data"})), 7);
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({"sequence": 7}));
}

#[test]
fn test_record_message_shape() {
    let message = Message::record(
        "orders",
        SequencedRecord::new(object(json!({"id": 1})), 42),
    );
    assert!(message.is_record());
    assert_eq!(message.stream(), Some("orders"));
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "RECORD",
            "stream": "orders",
            "record": {"id": 1, "sequence": 42}
        })
    );
}

#[test]
fn test_schema_message_shape() {
    let message = Message::schema(
        "orders",
        SchemaProperty::new(JsonType::Integer),
        vec!["id".to_string()],
    );
    assert!(message.is_schema());
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "SCHEMA",
            "stream": "orders",
            "schema": {"type": "integer"},
            "key_properties": ["id"]
        })
    );
}

#[test]
fn test_state_message_shape() {
    let mut state = State::new();
    state.set_modified_since("orders", "2020-03-01T00:00:00+00:00".to_string());
    let message = Message::state(state);

    assert!(message.is_state());
    assert_eq!(message.stream(), None);
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "STATE",
            "value": {"bookmarks": {"orders": {"modified_since": "2020-03-01T00:00:00+00:00"}}}
        })
    );
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_json_lines_writer() {
    let mut writer = JsonLinesWriter::new(Vec::new());
    writer
        .emit(&Message::record(
            "t",
            SequencedRecord::new(object(json!({"a": "x"})), 1),
        ))
        .unwrap();
    writer.emit(&Message::state(State::new())).unwrap();
    assert_eq!(writer.written(), 2);

    let output = String::from_utf8(writer.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["record"], json!({"a": "x", "sequence": 1}));
    assert_eq!(lines[1]["type"], json!("STATE"));
}

#[test]
fn test_json_lines_writer_pretty() {
    let mut writer = JsonLinesWriter::new(Vec::new()).with_pretty(true);
    writer.emit(&Message::state(State::new())).unwrap();
    let output = String::from_utf8(writer.into_inner()).unwrap();
    assert!(output.lines().count() > 1);
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["type"], json!("STATE"));
}

#[test]
fn test_vec_sink_collects() {
    let mut sink: Vec<Message> = Vec::new();
    sink.emit(&Message::state(State::new())).unwrap();
    sink.flush().unwrap();
    assert_eq!(sink.len(), 1);
}
