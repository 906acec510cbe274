//! Asynchronous file sink
//!
//! A [`FileSink`] owns one background worker that persists transactions closed
//! by a [`TransactionList`]. The buffer announces each closed id; the sink
//! queues the id and raises a single-slot "work available" signal, so any
//! number of announcements between two wake-ups collapse into one flush pass.
//!
//! Each pass, on the worker thread:
//!
//! 1. takes every queued id;
//! 2. deletes the oldest log files while the volume is fuller than the
//!    configured threshold (the open file is never deleted);
//! 3. closes the open file if the naming policy now designates another one;
//! 4. opens the designated file if none is open, or terminates the sink for
//!    good if that fails;
//! 5. removes every closed transaction up to the highest queued id in
//!    ascending id order, appends its entries and flushes the buffered writer.
//!
//! Steps 3 to 5 are skipped when no ids were queued, so an idle pass never
//! creates a file.
//!
//! On a fixed schedule, independent of signals, the worker drives
//! [`TransactionList::tick`], so partially filled transactions close on age
//! and expired backlog is swept whether the application is idle or busy.

use super::rotation::{LogTarget, NamingPolicy};
use super::storage::{evict_until_below, eviction_candidates, DiskUsage, FsDiskUsage};
use crate::core::config::{Configuration, OutputMode, DEFAULT_DISK_THRESHOLD};
use crate::core::error::{LoggerError, Result};
use crate::core::metrics::LoggerMetrics;
use crate::core::transaction::{Transaction, TransactionList, TransactionListener};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default interval at which an idle worker checks transaction age
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Where and how a [`FileSink`] writes
#[derive(Debug, Clone, PartialEq)]
pub struct FileSinkConfig {
    /// Output directory
    pub dir: PathBuf,
    pub naming: NamingPolicy,
    /// One JSON object per line instead of `timestamp + message`
    pub json: bool,
    /// Used-disk fraction above which old files are deleted
    pub disk_threshold: f64,
    /// How often an idle worker lets the buffer close aged transactions
    pub tick_interval: Duration,
}

impl FileSinkConfig {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, naming: NamingPolicy) -> Self {
        Self {
            dir: dir.into(),
            naming,
            json: false,
            disk_threshold: DEFAULT_DISK_THRESHOLD,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_disk_threshold(mut self, threshold: f64) -> Self {
        self.disk_threshold = threshold;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

impl From<&Configuration> for FileSinkConfig {
    fn from(config: &Configuration) -> Self {
        let naming = if config.mode.contains(OutputMode::FILE_ROTATE) {
            NamingPolicy::rotating(config.max_file_size)
        } else {
            NamingPolicy::fixed(config.filename.clone())
        };
        // A quarter of the transaction timeout bounds how late an aged
        // transaction can close
        let tick_interval = (config.transaction_timeout / 4)
            .clamp(Duration::from_millis(5), DEFAULT_TICK_INTERVAL);

        Self {
            dir: config.path.clone(),
            naming,
            json: config.json,
            disk_threshold: config.disk_threshold,
            tick_interval,
        }
    }
}

/// Collects announced ids and raises the coalesced work signal
struct Notifier {
    pending: Mutex<Vec<u64>>,
    signal: Sender<()>,
    closed: AtomicBool,
}

impl Notifier {
    fn take_pending(&self) -> Vec<u64> {
        mem::take(&mut *self.pending.lock())
    }
}

impl TransactionListener for Notifier {
    fn on_transaction_ready(&self, id: u64) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.pending.lock().push(id);
        // Capacity one: a full slot already guarantees another pass
        let _ = self.signal.try_send(());
    }
}

/// Background persistence of closed transactions to rotating files
///
/// # Example
///
/// ```no_run
/// use loge::appenders::{FileSink, FileSinkConfig, NamingPolicy};
/// use loge::{LogEntry, TransactionConfig, TransactionList};
/// use std::sync::Arc;
///
/// let buffer = Arc::new(TransactionList::new(TransactionConfig::default()));
/// let mut sink = FileSink::spawn(
///     Arc::clone(&buffer),
///     FileSinkConfig::new("/var/log/app", NamingPolicy::rotating(10 * 1024 * 1024)),
/// )
/// .unwrap();
///
/// buffer.write(LogEntry::new("service started"));
/// sink.shutdown(); // final pass persists the open transaction
/// ```
pub struct FileSink {
    notifier: Arc<Notifier>,
    shutdown: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
    terminated: Arc<AtomicBool>,
}

impl FileSink {
    /// Start a sink measuring disk usage with [`FsDiskUsage`]
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be spawned
    pub fn spawn(buffer: Arc<TransactionList>, config: FileSinkConfig) -> Result<Self> {
        Self::with_disk_usage(buffer, config, Box::new(FsDiskUsage))
    }

    /// Start a sink with a custom disk usage source
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be spawned
    pub fn with_disk_usage(
        buffer: Arc<TransactionList>,
        config: FileSinkConfig,
        usage: Box<dyn DiskUsage>,
    ) -> Result<Self> {
        let (signal_tx, signal_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let notifier = Arc::new(Notifier {
            pending: Mutex::new(Vec::new()),
            signal: signal_tx,
            closed: AtomicBool::new(false),
        });
        let terminated = Arc::new(AtomicBool::new(false));

        buffer.subscribe(notifier.clone());

        let worker = SinkWorker {
            buffer,
            notifier: Arc::clone(&notifier),
            config,
            usage,
            current: None,
            terminated: Arc::clone(&terminated),
        };

        let handle = thread::Builder::new()
            .name("loge-file-sink".to_string())
            .spawn(move || worker.run(signal_rx, shutdown_rx))
            .map_err(|e| {
                notifier.closed.store(true, Ordering::Release);
                LoggerError::io_operation("starting file sink", "cannot spawn worker thread", e)
            })?;

        Ok(Self {
            notifier,
            shutdown: Some(shutdown_tx),
            worker: Some(handle),
            terminated,
        })
    }

    /// Whether the sink gave up on file output after failing to open a file
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Stop the worker after one final flush pass
    ///
    /// Blocks until the worker has exited. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        drop(self.shutdown.take());

        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] File sink worker panicked during shutdown: {:?}", e);
            }
        }
        self.notifier.closed.store(true, Ordering::Release);
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct OpenFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

struct SinkWorker {
    buffer: Arc<TransactionList>,
    notifier: Arc<Notifier>,
    config: FileSinkConfig,
    usage: Box<dyn DiskUsage>,
    current: Option<OpenFile>,
    terminated: Arc<AtomicBool>,
}

impl SinkWorker {
    fn run(mut self, signal: Receiver<()>, shutdown: Receiver<()>) {
        // Fires on schedule regardless of how often the signal is raised
        let ticker = tick(self.config.tick_interval);
        let mut running = true;
        while running {
            select! {
                recv(shutdown) -> _ => running = false,
                recv(signal) -> _ => self.flush_pass(),
                recv(ticker) -> _ => self.buffer.tick(),
            }
        }

        self.buffer.close_open();
        self.flush_pass();
        self.notifier.closed.store(true, Ordering::Release);
        self.close_file();
    }

    fn flush_pass(&mut self) {
        let ids = self.notifier.take_pending();
        if self.terminated.load(Ordering::Acquire) {
            // Nothing will read these ids again; their transactions expire in the buffer
            return;
        }

        self.evict_old_files();
        let Some(&max_id) = ids.iter().max() else {
            return;
        };

        let target = self.config.naming.resolve(&self.config.dir);
        if self.config.naming.is_rotating()
            && self.current.as_ref().is_some_and(|open| open.path != target.path)
        {
            self.close_file();
            self.buffer.metrics().record_rotation();
        }

        if self.current.is_none() {
            match Self::open(&target) {
                Ok(writer) => {
                    self.current = Some(OpenFile {
                        path: target.path,
                        writer,
                    })
                }
                Err(e) => {
                    self.terminated.store(true, Ordering::Release);
                    eprintln!(
                        "[LOGGER ERROR] Unable to create the output file ({}). Log file output is disabled.",
                        e
                    );
                    return;
                }
            }
        }

        if let Err(e) = self.drain(max_id) {
            // Drop the handle; the next pass reopens or terminates
            eprintln!("[LOGGER ERROR] {}", e);
            self.current = None;
        }
    }

    /// Write every closed transaction up to `max_id`, lowest id first
    ///
    /// Ids announced late are covered too, so a pass never writes a
    /// transaction ahead of an earlier one still waiting for its announcement.
    fn drain(&mut self, max_id: u64) -> Result<()> {
        let Some(open) = self.current.as_mut() else {
            return Ok(());
        };

        for transaction in self.buffer.take_through(max_id) {
            let written = Self::write_transaction(
                &mut open.writer,
                &transaction,
                self.config.json,
                self.buffer.metrics(),
            )
            .map_err(|e| {
                LoggerError::file_sink(
                    open.path.display().to_string(),
                    format!("Failed to write transaction {}: {}", transaction.id(), e),
                )
            })?;
            self.buffer.metrics().record_persisted(written);
        }

        open.writer.flush().map_err(|e| {
            LoggerError::file_sink(
                open.path.display().to_string(),
                format!("Failed to flush: {}", e),
            )
        })
    }

    /// Append every entry of `transaction`, returning how many were written
    ///
    /// Entries that fail to serialize are skipped and counted.
    fn write_transaction(
        writer: &mut impl Write,
        transaction: &Transaction,
        json: bool,
        metrics: &LoggerMetrics,
    ) -> std::io::Result<u64> {
        let mut written = 0;
        for entry in transaction.entries() {
            let line = if json {
                match entry.to_json() {
                    Ok(line) => line,
                    Err(_) => {
                        metrics.record_serialization_failure();
                        continue;
                    }
                }
            } else {
                entry.to_plain()
            };
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            written += 1;
        }
        Ok(written)
    }

    fn evict_old_files(&self) {
        let fixed_name = match &self.config.naming {
            NamingPolicy::Fixed(name) => Some(name.as_str()),
            NamingPolicy::Rotating { .. } => None,
        };
        let active = self.current.as_ref().map(|open| open.path.as_path());

        let candidates = eviction_candidates(&self.config.dir, fixed_name, active);
        if candidates.is_empty() {
            return;
        }

        let removed = evict_until_below(
            self.usage.as_ref(),
            &self.config.dir,
            self.config.disk_threshold,
            candidates,
        );
        for _ in 0..removed {
            self.buffer.metrics().record_file_evicted();
        }
    }

    fn open(target: &LogTarget) -> Result<BufWriter<File>> {
        let mut options = OpenOptions::new();
        if target.replace {
            options.write(true).create(true).truncate(true);
        } else {
            options.create(true).append(true);
        }

        let file = options.open(&target.path).map_err(|e| {
            LoggerError::file_sink(
                target.path.display().to_string(),
                format!("Failed to open: {}", e),
            )
        })?;
        Ok(BufWriter::new(file))
    }

    fn close_file(&mut self) {
        if let Some(mut open) = self.current.take() {
            if let Err(e) = open.writer.flush() {
                eprintln!(
                    "[LOGGER ERROR] Failed to flush {} before closing: {}",
                    open.path.display(),
                    e
                );
            }
        }
    }
}
