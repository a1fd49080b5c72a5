//! Tests for storage module

use super::*;
use crate::config::TableSpec;
use crate::decode::RowDecoder;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::io::Read;

fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, month, day, 0, 0, 0).unwrap()
}

fn keys(files: &[FileDescriptor]) -> Vec<&str> {
    files.iter().map(|f| f.key.as_str()).collect()
}

/// Store that always fails to list
struct BrokenStore;

#[async_trait]
impl FileStore for BrokenStore {
    async fn list(&self, _prefix: Option<&str>) -> Result<Vec<FileDescriptor>> {
        Err(Error::storage("access denied"))
    }

    async fn open(&self, key: &str) -> Result<ByteStream> {
        Err(Error::storage(format!("access denied: {key}")))
    }
}

// ============================================================================
// FileDescriptor Tests
// ============================================================================

#[test]
fn test_descriptor_sequence() {
    let file = FileDescriptor::new("a.csv", day(2, 1), 10);
    assert_eq!(file.sequence(), 1_580_515_200);
}

#[test]
fn test_sort_for_replay_orders_by_time_then_key() {
    let mut files = vec![
        FileDescriptor::new("c.csv", day(3, 1), 1),
        FileDescriptor::new("b.csv", day(2, 1), 1),
        FileDescriptor::new("a.csv", day(2, 1), 1),
        FileDescriptor::new("d.csv", day(1, 15), 1),
    ];
    sort_for_replay(&mut files);
    assert_eq!(keys(&files), vec!["d.csv", "a.csv", "b.csv", "c.csv"]);
}

#[test]
fn test_sort_for_replay_is_independent_of_input_order() {
    let files = vec![
        FileDescriptor::new("x.csv", day(2, 1), 1),
        FileDescriptor::new("y.csv", day(2, 1), 1),
        FileDescriptor::new("z.csv", day(2, 1), 1),
    ];
    let mut forward = files.clone();
    let mut reversed: Vec<_> = files.into_iter().rev().collect();
    sort_for_replay(&mut forward);
    sort_for_replay(&mut reversed);
    assert_eq!(forward, reversed);
}

// ============================================================================
// MemoryFileStore Tests
// ============================================================================

#[tokio::test]
async fn test_memory_store_list_and_open() {
    let store = MemoryFileStore::new()
        .with_file("data/a.csv", day(2, 1), "id\n1\n")
        .with_file("other/b.csv", day(2, 1), "id\n2\n");
    assert_eq!(store.len(), 2);

    let listed = store.list(Some("data/")).await.unwrap();
    assert_eq!(keys(&listed), vec!["data/a.csv"]);
    assert_eq!(listed[0].size, "id\n1\n".len() as u64);

    let mut contents = String::new();
    store
        .open("data/a.csv")
        .await
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "id\n1\n");

    assert!(store.open("missing.csv").await.is_err());
}

// ============================================================================
// FileSelector Tests
// ============================================================================

fn selector_store() -> MemoryFileStore {
    MemoryFileStore::new()
        .with_file("exports/orders_jan.csv", day(1, 1), "id\n")
        .with_file("exports/orders_feb.csv", day(2, 1), "id\n")
        .with_file("exports/orders_mar.csv", day(3, 1), "id\n")
        .with_file("exports/users_feb.csv", day(2, 1), "id\n")
        .with_file("exports/orders_feb.json", day(2, 1), "{}\n")
}

#[tokio::test]
async fn test_selector_filters_pattern_and_watermark() {
    let store = selector_store();
    let table = TableSpec::new("orders", r"orders_.*\.csv$").with_prefix("exports/");

    let files = FileSelector::new(&store)
        .list_files(&table, &day(1, 1))
        .await
        .unwrap();

    // strictly after the watermark: January's file is excluded
    let mut found = keys(&files);
    found.sort_unstable();
    assert_eq!(found, vec!["exports/orders_feb.csv", "exports/orders_mar.csv"]);
}

#[tokio::test]
async fn test_selector_is_idempotent() {
    let store = selector_store();
    let table = TableSpec::new("orders", "orders_");
    let selector = FileSelector::new(&store);

    let first = selector.list_files(&table, &day(1, 15)).await.unwrap();
    let second = selector.list_files(&table, &day(1, 15)).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_selector_nothing_newer() {
    let store = selector_store();
    let table = TableSpec::new("orders", "orders_");
    let files = FileSelector::new(&store)
        .list_files(&table, &day(3, 1))
        .await
        .unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_selector_propagates_storage_fault() {
    let table = TableSpec::new("orders", "orders_");
    let err = FileSelector::new(&BrokenStore)
        .list_files(&table, &day(1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Storage error: access denied");
}

#[tokio::test]
async fn test_selector_rejects_invalid_pattern() {
    let store = selector_store();
    let table = TableSpec::new("orders", "([");
    let err = FileSelector::new(&store)
        .list_files(&table, &day(1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { .. }));
}

// ============================================================================
// ChunkReader Tests
// ============================================================================

fn chunk_stream(
    chunks: Vec<std::io::Result<bytes::Bytes>>,
) -> impl futures::Stream<Item = std::io::Result<bytes::Bytes>> + Send + Unpin + 'static {
    futures::stream::iter(chunks)
}

#[tokio::test]
async fn test_chunk_reader_joins_chunks() {
    let reader = ChunkReader::spawn(chunk_stream(vec![
        Ok(bytes::Bytes::from_static(b"id,na")),
        Ok(bytes::Bytes::new()),
        Ok(bytes::Bytes::from_static(b"me\n1,al")),
        Ok(bytes::Bytes::from_static(b"pha\n")),
    ]));

    let rows = tokio::task::spawn_blocking(move || {
        crate::decode::CsvRowDecoder::new()
            .rows(
                Box::new(reader),
                &TableSpec::new("t", ".*"),
                "chunked.csv",
                &crate::decode::DecodeOptions::unbounded(),
            )
            .unwrap()
            .collect::<Result<Vec<_>>>()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], serde_json::json!("alpha"));
}

#[tokio::test]
async fn test_chunk_reader_small_buffer_reads() {
    let mut reader = ChunkReader::spawn(chunk_stream(vec![
        Ok(bytes::Bytes::from_static(b"abcdef")),
        Ok(bytes::Bytes::from_static(b"gh")),
    ]));

    let reads = tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; 4];
        let mut reads = Vec::new();
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            reads.push(String::from_utf8(buf[..n].to_vec()).unwrap());
        }
        reads
    })
    .await
    .unwrap();

    assert_eq!(reads, vec!["abcd", "ef", "gh"]);
}

#[tokio::test]
async fn test_chunk_reader_surfaces_stream_error() {
    let mut reader = ChunkReader::spawn(chunk_stream(vec![
        Ok(bytes::Bytes::from_static(b"id\n1\n")),
        Err(std::io::Error::other("connection reset")),
        Ok(bytes::Bytes::from_static(b"2\n")),
    ]));

    let result = tokio::task::spawn_blocking(move || {
        let mut contents = String::new();
        reader.read_to_string(&mut contents).map(|_| contents)
    })
    .await
    .unwrap();

    assert!(result.unwrap_err().to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_object_store_open_streams_large_object() {
    use object_store::{memory::InMemory, path::Path as ObjectPath, ObjectStore};

    let mut body = String::from("id,value\n");
    for i in 0..20_000 {
        body.push_str(&format!("{i},{}\n", "x".repeat(64)));
    }
    let memory = InMemory::new();
    memory
        .put(&ObjectPath::from("big/data.csv"), bytes::Bytes::from(body.clone()).into())
        .await
        .unwrap();
    let files = ObjectStoreFiles::new(std::sync::Arc::new(memory));

    let reader = files.open("big/data.csv").await.unwrap();
    let count = tokio::task::spawn_blocking(move || {
        crate::decode::CsvRowDecoder::new()
            .rows(
                reader,
                &TableSpec::new("t", ".*"),
                "big/data.csv",
                &crate::decode::DecodeOptions::unbounded(),
            )
            .unwrap()
            .count()
    })
    .await
    .unwrap();

    assert_eq!(count, 20_000);
}
