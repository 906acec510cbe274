//! Criterion benchmarks for loge

use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use loge::core::timestamp::format_timestamp;
use loge::prelude::*;
use std::io::sink;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Entry Construction Benchmarks
// ============================================================================

fn bench_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("entry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("format_timestamp", |b| {
        let now = Local::now();
        b.iter(|| format_timestamp(black_box(&now)));
    });

    group.bench_function("new", |b| {
        b.iter(|| LogEntry::new(black_box("request handled in 12ms")));
    });

    group.bench_function("new_with_escapes", |b| {
        b.iter(|| LogEntry::new(black_box("line one\nline two\tcolumn")));
    });

    let entry = LogEntry::new("serialize me").with_level(LogLevel::Info);
    group.bench_function("to_json", |b| {
        b.iter(|| black_box(&entry).to_json());
    });

    group.finish();
}

// ============================================================================
// Transaction Buffer Benchmarks
// ============================================================================

fn bench_buffer_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_write");
    group.throughput(Throughput::Elements(1));

    // Large limit: measures the append path only
    let buffer = TransactionList::new(TransactionConfig {
        size_limit: usize::MAX,
        ..TransactionConfig::default()
    });
    group.bench_function("append", |b| {
        b.iter(|| buffer.write(LogEntry::new(black_box("append only"))));
    });

    // Every write closes a transaction and evicts the oldest beyond the bound
    let closing = TransactionList::new(TransactionConfig {
        size_limit: 1,
        max_backlog: 1024,
        ..TransactionConfig::default()
    });
    group.bench_function("close_each", |b| {
        b.iter(|| closing.write(LogEntry::new(black_box("closes"))));
    });

    group.finish();
}

fn bench_concurrent_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_write");
    let threads = 4;
    let per_thread = 1_000;
    group.throughput(Throughput::Elements((threads * per_thread) as u64));

    group.bench_function("4_threads", |b| {
        b.iter(|| {
            let buffer = Arc::new(TransactionList::new(TransactionConfig::default()));
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let buffer = Arc::clone(&buffer);
                    thread::spawn(move || {
                        for _ in 0..per_thread {
                            buffer.write(LogEntry::new("concurrent entry"));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Logger Benchmarks
// ============================================================================

fn bench_logger(c: &mut Criterion) {
    let mut group = c.benchmark_group("logger");
    group.throughput(Throughput::Elements(1));

    let console = Logger::builder()
        .mode(OutputMode::CONSOLE)
        .log_levels(LevelMask::ALL)
        .console_writer(Box::new(sink()))
        .build();
    group.bench_function("console_info", |b| {
        b.iter(|| console.info(black_box("console message")));
    });

    let filtered = Logger::builder()
        .mode(OutputMode::CONSOLE)
        .log_levels(LevelMask::NONE)
        .console_writer(Box::new(sink()))
        .build();
    group.bench_function("filtered_out", |b| {
        b.iter(|| filtered.debug(black_box("never written")));
    });

    let dir = tempfile::tempdir().unwrap();
    let file = Logger::builder()
        .mode(OutputMode::FILE)
        .path(dir.path())
        .filename("bench.log")
        .transaction_timeout(Duration::from_millis(100))
        .log_levels(LevelMask::ALL)
        .build();
    group.bench_function("file_info", |b| {
        b.iter(|| file.info(black_box("file message")));
    });
    file.shutdown();

    group.finish();
}

criterion_group!(
    benches,
    bench_entry,
    bench_buffer_write,
    bench_concurrent_write,
    bench_logger
);
criterion_main!(benches);
