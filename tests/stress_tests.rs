//! Stress tests for the transaction buffer and file sink
//!
//! These tests verify:
//! - No entry is lost or duplicated under concurrent high-volume logging
//! - The backlog bound drops the oldest transactions when nothing drains
//! - Rotation keeps up with many small transactions

use loge::appenders::{FileSink, FileSinkConfig, NamingPolicy};
use loge::{LogEntry, TransactionConfig, TransactionList};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn config(size_limit: usize, max_backlog: usize) -> TransactionConfig {
    TransactionConfig {
        size_limit,
        timeout: Duration::from_secs(60),
        backlog_expiration: Duration::from_secs(3600),
        max_backlog,
    }
}

/// Every entry written by many threads ends up on disk exactly once
#[test]
fn test_no_entries_lost_under_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let buffer = Arc::new(TransactionList::new(config(512, usize::MAX)));
    let mut sink = FileSink::spawn(
        Arc::clone(&buffer),
        FileSinkConfig::new(temp_dir.path(), NamingPolicy::fixed("stress.log"))
            .with_tick_interval(Duration::from_millis(5)),
    )
    .expect("Failed to start sink");

    let threads = 8;
    let per_thread = 2_000;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..per_thread {
                    buffer.write(LogEntry::new(format!("{}:{}", t, i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }
    sink.shutdown();

    let content = fs::read_to_string(temp_dir.path().join("stress.log")).unwrap();
    let mut seen = HashSet::new();
    for line in content.lines() {
        let key = line.rsplit(' ').next().unwrap().to_string();
        assert!(seen.insert(key), "duplicate line {:?}", line);
    }
    assert_eq!(seen.len(), threads * per_thread);
    assert_eq!(buffer.metrics().dropped_count(), 0);
    assert_eq!(buffer.backlog_len(), 0);
}

/// Without a consumer the backlog stays bounded and drops the oldest
#[test]
fn test_backlog_bound_without_consumer() {
    let buffer = TransactionList::new(config(1, 100));

    for i in 0..10_000 {
        buffer.write(LogEntry::new(format!("entry {}", i)));
    }

    assert_eq!(buffer.backlog_len(), 100);
    assert_eq!(buffer.metrics().transactions_evicted(), 9_900);
    assert!(buffer.get(1, false).is_none());
    assert!(buffer.get(10_000, false).is_some());
}

/// Many tiny transactions spread over several rotated files
#[test]
fn test_rotation_under_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let buffer = Arc::new(TransactionList::new(config(64, usize::MAX)));
    let mut sink = FileSink::spawn(
        Arc::clone(&buffer),
        FileSinkConfig::new(temp_dir.path(), NamingPolicy::rotating(1024)),
    )
    .expect("Failed to start sink");

    for i in 0..2_000 {
        buffer.write(LogEntry::new(format!("rotating entry number {:06}", i)));
        if i % 100 == 0 {
            thread::sleep(Duration::from_millis(2));
        }
    }
    sink.shutdown();

    let total: usize = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| fs::read_to_string(e.unwrap().path()).unwrap().lines().count())
        .sum();
    assert_eq!(total, 2_000);
    assert_eq!(buffer.metrics().entries_persisted(), 2_000);
}
