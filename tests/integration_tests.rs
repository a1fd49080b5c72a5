//! Integration tests over a local object store
//!
//! Tests the full end-to-end flow: config → file listing → CSV decoding →
//! coerced records on a JSON lines stream → bookmark file

use chrono::{DateTime, TimeZone, Utc};
use object_csv_tap::output::JsonLinesWriter;
use object_csv_tap::{Message, ObjectStoreFiles, StateManager, SyncEngine, TapConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::TempDir;

fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, month, day, 0, 0, 0).unwrap()
}

fn write_file(root: &Path, key: &str, body: &str, modified: DateTime<Utc>) {
    let path = root.join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, body).unwrap();
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::from(modified)).unwrap();
}

fn config_for(data: &TempDir) -> TapConfig {
    TapConfig::from_json_str(
        &json!({
            "bucket": "test-bucket",
            "start_date": "2020-01-01T00:00:00Z",
            "storage_url": format!("file://{}", data.path().display()),
            "tables": [{
                "table_name": "orders",
                "search_prefix": "exports/orders",
                "search_pattern": "\\.csv$",
                "key_properties": ["id"],
                "date_overrides": ["placed_at"],
                "schema": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "amount": {"type": ["null", "number"]},
                        "paid": {"type": ["null", "boolean"]}
                    }
                }
            }]
        })
        .to_string(),
    )
    .unwrap()
}

/// Run one sync and return the parsed output lines
async fn run_sync(config: &TapConfig, state_path: &Path) -> Vec<Value> {
    config.validate().unwrap();
    let store = Arc::new(ObjectStoreFiles::parse(&config.storage_url()).unwrap());
    let state = StateManager::from_file(state_path).unwrap();
    let mut engine = SyncEngine::from_tap_config(store, state, config).unwrap();

    let mut sink = JsonLinesWriter::new(Vec::new());
    engine.sync_all(&config.tables, &mut sink).await.unwrap();

    String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn of_type<'a>(lines: &'a [Value], kind: &str) -> Vec<&'a Value> {
    lines.iter().filter(|l| l["type"] == kind).collect()
}

fn read_state(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_local_store_sync_and_resume() {
    let data = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let state_path = state_dir.path().join("state.json");

    write_file(
        data.path(),
        "exports/orders/feb.csv",
        "id,amount,paid,placed_at\n1,9.5,yes,2020-02-01 10:00:00\n",
        day(2, 1),
    );
    write_file(
        data.path(),
        "exports/orders/mar.csv",
        "id,amount,paid,placed_at\n2,,no,\n3,1,true,2020-03-01T08:30:00+02:00\n",
        day(3, 1),
    );
    write_file(data.path(), "exports/other/x.csv", "id\n99\n", day(3, 5));

    let config = config_for(&data);
    let lines = run_sync(&config, &state_path).await;

    let schemas = of_type(&lines, "SCHEMA");
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0]["key_properties"], json!(["id"]));

    let records = of_type(&lines, "RECORD");
    assert_eq!(records.len(), 3);
    assert_eq!(
        *records[0],
        json!({
            "type": "RECORD",
            "stream": "orders",
            "record": {
                "id": 1,
                "amount": 9.5,
                "paid": true,
                "placed_at": "2020-02-01T10:00:00.000000Z",
                "_sdc_source_bucket": "test-bucket",
                "_sdc_source_file": "exports/orders/feb.csv",
                "_sdc_source_lineno": 2,
                "sequence": 1_580_515_200
            }
        })
    );
    assert_eq!(records[1]["record"]["amount"], Value::Null);
    assert_eq!(records[1]["record"]["placed_at"], Value::Null);
    assert_eq!(records[2]["record"]["placed_at"], json!("2020-03-01T06:30:00.000000Z"));
    assert_eq!(records[2]["record"]["_sdc_source_lineno"], json!(3));
    assert_eq!(records[2]["record"]["sequence"], json!(1_583_020_800));

    assert_eq!(of_type(&lines, "STATE").len(), 2);
    assert_eq!(
        read_state(&state_path),
        json!({"bookmarks": {"orders": {"modified_since": "2020-03-01T00:00:00+00:00"}}})
    );

    // Nothing new: no records, bookmark unchanged
    let lines = run_sync(&config, &state_path).await;
    assert!(of_type(&lines, "RECORD").is_empty());
    assert!(of_type(&lines, "STATE").is_empty());
    assert_eq!(
        read_state(&state_path)["bookmarks"]["orders"]["modified_since"],
        json!("2020-03-01T00:00:00+00:00")
    );

    // A later file is the only one read on the next run
    write_file(
        data.path(),
        "exports/orders/apr.csv",
        "id,amount,paid,placed_at\n4,2,,\n",
        day(4, 1),
    );
    let lines = run_sync(&config, &state_path).await;
    let records = of_type(&lines, "RECORD");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["record"]["id"], json!(4));
    assert_eq!(
        read_state(&state_path)["bookmarks"]["orders"]["modified_since"],
        json!("2020-04-01T00:00:00+00:00")
    );
}

#[tokio::test]
async fn test_bad_file_stops_before_its_bookmark() {
    let data = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let state_path = state_dir.path().join("state.json");

    write_file(
        data.path(),
        "exports/orders/a.csv",
        "id,placed_at\n1,2020-02-01\n",
        day(2, 1),
    );
    write_file(
        data.path(),
        "exports/orders/b.csv",
        "id,placed_at\nnot-a-number,2020-03-01\n",
        day(3, 1),
    );

    let config = config_for(&data);
    let store = Arc::new(ObjectStoreFiles::parse(&config.storage_url()).unwrap());
    let state = StateManager::from_file(&state_path).unwrap();
    let mut engine = SyncEngine::from_tap_config(store, state, &config).unwrap();
    let mut sink: Vec<Message> = Vec::new();

    let result = engine.sync_all(&config.tables, &mut sink).await;

    assert!(result.is_err());
    assert_eq!(sink.iter().filter(|m| m.is_record()).count(), 1);
    assert_eq!(
        read_state(&state_path)["bookmarks"]["orders"]["modified_since"],
        json!("2020-02-01T00:00:00+00:00")
    );
}

#[tokio::test]
async fn test_missing_required_header_is_reported() {
    let data = TempDir::new().unwrap();
    write_file(
        data.path(),
        "exports/orders/a.csv",
        "amount,placed_at\n1,2020-02-01\n",
        day(2, 1),
    );

    let config = config_for(&data);
    let store = Arc::new(ObjectStoreFiles::parse(&config.storage_url()).unwrap());
    let mut engine =
        SyncEngine::from_tap_config(store, StateManager::in_memory(), &config).unwrap();
    let mut sink: Vec<Message> = Vec::new();

    let err = engine
        .sync_all(&config.tables, &mut sink)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("id"));
    assert_eq!(engine.state().state().modified_since("orders"), None);
}
