//! Transaction buffer
//!
//! [`TransactionList`] turns a stream of [`LogEntry`] writes from any number of
//! threads into a stream of bounded, immutable [`Transaction`]s:
//!
//! - at most one transaction is open at a time; entries are appended to it in
//!   arrival order;
//! - the open transaction closes once its accumulated message bytes reach the
//!   size limit (checked after the append) or once it is older than the
//!   transaction timeout (checked before the next append and by [`tick`]);
//! - closing assigns the next id, files the transaction in the backlog and
//!   notifies every [`TransactionListener`] with that id;
//! - a closed transaction is handed out with remove semantics at most once, and
//!   is discarded if nobody retrieves it within the backlog expiration timeout.
//!
//! All state lives behind one mutex that is never held across I/O or listener
//! callbacks.
//!
//! [`tick`]: TransactionList::tick

use super::config::{
    Configuration, DEFAULT_BACKLOG_EXPIRATION, DEFAULT_MAX_BACKLOG, DEFAULT_TRANSACTION_SIZE,
    DEFAULT_TRANSACTION_TIMEOUT,
};
use super::log_entry::LogEntry;
use super::metrics::LoggerMetrics;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives the id of every transaction the buffer closes
///
/// Called on the thread that caused the close (a producer inside `write`, or
/// whoever drives `tick`/`close_open`), after the buffer's lock is released.
/// Implementations must return quickly and must not block.
pub trait TransactionListener: Send + Sync {
    fn on_transaction_ready(&self, id: u64);
}

/// Limits that decide when a transaction closes and how long it is kept
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionConfig {
    /// Accumulated message bytes at which the open transaction closes
    pub size_limit: usize,
    /// Age at which the open transaction closes
    pub timeout: Duration,
    /// Age (since closing) after which an unretrieved transaction is dropped
    pub backlog_expiration: Duration,
    /// Closed transactions kept before the oldest is evicted
    pub max_backlog: usize,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_TRANSACTION_SIZE,
            timeout: DEFAULT_TRANSACTION_TIMEOUT,
            backlog_expiration: DEFAULT_BACKLOG_EXPIRATION,
            max_backlog: DEFAULT_MAX_BACKLOG,
        }
    }
}

impl From<&Configuration> for TransactionConfig {
    fn from(config: &Configuration) -> Self {
        Self {
            size_limit: config.transaction_size,
            timeout: config.transaction_timeout,
            backlog_expiration: config.backlog_expiration_timeout,
            max_backlog: config.max_backlog,
        }
    }
}

/// A closed, immutable batch of entries
#[derive(Debug, Clone)]
pub struct Transaction {
    id: u64,
    entries: Vec<LogEntry>,
    size: usize,
    closed_at: Instant,
}

impl Transaction {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Entries in arrival order
    #[inline]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Accumulated message bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    fn is_expired(&self, now: Instant, expiration: Duration) -> bool {
        now.saturating_duration_since(self.closed_at) >= expiration
    }
}

struct OpenTransaction {
    entries: Vec<LogEntry>,
    size: usize,
    opened_at: Instant,
}

/// Outcome of one locked mutation: ids to announce and drops to report
#[derive(Default)]
struct Changes {
    ready: Vec<u64>,
    dropped_before: u64,
    dropped: u64,
}

struct Inner {
    open: Option<OpenTransaction>,
    backlog: BTreeMap<u64, Transaction>,
    next_id: u64,
}

impl Inner {
    fn close(&mut self, now: Instant, metrics: &LoggerMetrics) -> Option<u64> {
        let open = self.open.take()?;
        let id = self.next_id;
        self.next_id += 1;
        self.backlog.insert(
            id,
            Transaction {
                id,
                entries: open.entries,
                size: open.size,
                closed_at: now,
            },
        );
        metrics.record_closed();
        Some(id)
    }

    fn open_age(&self, now: Instant) -> Option<Duration> {
        self.open
            .as_ref()
            .map(|open| now.saturating_duration_since(open.opened_at))
    }

    /// Drop expired transactions, then evict the oldest past the backlog bound
    ///
    /// Ids grow with closing time, so expired transactions form a prefix of
    /// the backlog.
    fn sweep(
        &mut self,
        now: Instant,
        config: &TransactionConfig,
        metrics: &LoggerMetrics,
        changes: &mut Changes,
    ) {
        while let Some(oldest) = self.backlog.first_entry() {
            if !oldest.get().is_expired(now, config.backlog_expiration) {
                break;
            }
            oldest.remove();
            let before = metrics.record_expired();
            changes.note_drop(before);
        }

        while self.backlog.len() > config.max_backlog {
            if self.backlog.pop_first().is_none() {
                break;
            }
            let before = metrics.record_evicted();
            changes.note_drop(before);
        }
    }
}

impl Changes {
    fn note_drop(&mut self, before: u64) {
        if self.dropped == 0 {
            self.dropped_before = before;
        }
        self.dropped += 1;
    }
}

/// Registry of closed transactions plus the currently open one
///
/// # Example
///
/// ```
/// use loge::{LogEntry, TransactionConfig, TransactionList};
/// use std::time::Duration;
///
/// let buffer = TransactionList::new(TransactionConfig {
///     size_limit: 64,
///     timeout: Duration::from_secs(1),
///     ..Default::default()
/// });
///
/// for _ in 0..4 {
///     buffer.write(LogEntry::new("twenty bytes message"));
/// }
///
/// let transaction = buffer.get(1, true).expect("closed at 80 bytes");
/// assert_eq!(transaction.len(), 4);
/// assert!(buffer.get(1, true).is_none());
/// ```
pub struct TransactionList {
    config: TransactionConfig,
    inner: Mutex<Inner>,
    listeners: RwLock<Vec<Arc<dyn TransactionListener>>>,
    metrics: Arc<LoggerMetrics>,
}

impl TransactionList {
    #[must_use]
    pub fn new(config: TransactionConfig) -> Self {
        Self::with_metrics(config, Arc::new(LoggerMetrics::new()))
    }

    /// Create a buffer that records into shared metrics
    #[must_use]
    pub fn with_metrics(config: TransactionConfig, metrics: Arc<LoggerMetrics>) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                open: None,
                backlog: BTreeMap::new(),
                next_id: 1,
            }),
            listeners: RwLock::new(Vec::new()),
            metrics,
        }
    }

    /// Register a consumer to be told about every closed transaction
    pub fn subscribe(&self, listener: Arc<dyn TransactionListener>) {
        self.listeners.write().push(listener);
    }

    /// Append an entry, closing transactions as the limits require
    ///
    /// Never blocks beyond the brief registry lock and never fails.
    pub fn write(&self, entry: LogEntry) {
        let mut changes = Changes::default();
        {
            let mut inner = self.inner.lock();
            let now = Instant::now();

            if inner.open_age(now).is_some_and(|age| age >= self.config.timeout) {
                changes.ready.extend(inner.close(now, &self.metrics));
            }

            let size = entry.size();
            let open = inner.open.get_or_insert_with(|| OpenTransaction {
                entries: Vec::new(),
                size: 0,
                opened_at: now,
            });
            open.entries.push(entry);
            open.size += size;

            if open.size >= self.config.size_limit {
                changes.ready.extend(inner.close(now, &self.metrics));
            }

            if !changes.ready.is_empty() {
                inner.sweep(now, &self.config, &self.metrics, &mut changes);
            }
        }

        self.metrics.record_buffered();
        self.publish(changes);
    }

    /// Look up a closed transaction
    ///
    /// With `remove` set, the transaction leaves the registry in the same call,
    /// so each id is delivered at most once. Unknown, already removed and
    /// expired ids all yield `None`.
    pub fn get(&self, id: u64, remove: bool) -> Option<Transaction> {
        let mut changes = Changes::default();
        let found = {
            let mut inner = self.inner.lock();
            let now = Instant::now();

            let expired = inner
                .backlog
                .get(&id)
                .map(|t| t.is_expired(now, self.config.backlog_expiration));

            match expired {
                None => None,
                Some(true) => {
                    inner.backlog.remove(&id);
                    let before = self.metrics.record_expired();
                    changes.note_drop(before);
                    None
                }
                Some(false) if remove => {
                    let transaction = inner.backlog.remove(&id);
                    self.metrics.record_delivered();
                    transaction
                }
                Some(false) => inner.backlog.get(&id).cloned(),
            }
        };

        self.publish(changes);
        found
    }

    /// Remove every closed transaction with an id up to `max_id`, in id order
    ///
    /// Ids are assigned under the registry lock but announced after it is
    /// released, so an announcement for `max_id` can arrive before the one for
    /// a lower id. Taking the whole prefix keeps the output in id order; the
    /// late announcement then finds nothing. Expired transactions in the prefix
    /// are dropped rather than returned.
    pub fn take_through(&self, max_id: u64) -> Vec<Transaction> {
        let mut changes = Changes::default();
        let taken = {
            let mut inner = self.inner.lock();
            let now = Instant::now();

            let rest = match max_id.checked_add(1) {
                Some(bound) => inner.backlog.split_off(&bound),
                None => BTreeMap::new(),
            };
            let prefix = mem::replace(&mut inner.backlog, rest);

            let mut taken = Vec::with_capacity(prefix.len());
            for transaction in prefix.into_values() {
                if transaction.is_expired(now, self.config.backlog_expiration) {
                    let before = self.metrics.record_expired();
                    changes.note_drop(before);
                } else {
                    self.metrics.record_delivered();
                    taken.push(transaction);
                }
            }
            taken
        };

        self.publish(changes);
        taken
    }

    /// Periodic maintenance: close the open transaction once it is old enough
    /// and discard expired backlog
    ///
    /// The buffer has no thread of its own; the consumer (normally the file
    /// sink worker) drives this at a fraction of the transaction timeout so
    /// that a quiet application still gets its last entries persisted.
    pub fn tick(&self) {
        let mut changes = Changes::default();
        {
            let mut inner = self.inner.lock();
            let now = Instant::now();

            if inner.open_age(now).is_some_and(|age| age >= self.config.timeout) {
                changes.ready.extend(inner.close(now, &self.metrics));
            }
            inner.sweep(now, &self.config, &self.metrics, &mut changes);
        }
        self.publish(changes);
    }

    /// Close the open transaction regardless of its size or age
    ///
    /// Returns the id assigned to it, or `None` when nothing was open.
    pub fn close_open(&self) -> Option<u64> {
        let mut changes = Changes::default();
        let id = {
            let mut inner = self.inner.lock();
            let now = Instant::now();
            let id = inner.close(now, &self.metrics);
            changes.ready.extend(id);
            if id.is_some() {
                inner.sweep(now, &self.config, &self.metrics, &mut changes);
            }
            id
        };
        self.publish(changes);
        id
    }

    /// Number of closed transactions waiting for retrieval
    pub fn backlog_len(&self) -> usize {
        self.inner.lock().backlog.len()
    }

    /// Number of entries in the open transaction
    pub fn open_len(&self) -> usize {
        self.inner
            .lock()
            .open
            .as_ref()
            .map_or(0, |open| open.entries.len())
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    fn publish(&self, changes: Changes) {
        if changes.dropped > 0 {
            Self::alert_dropped(changes.dropped_before, changes.dropped);
        }
        if changes.ready.is_empty() {
            return;
        }

        let listeners = self.listeners.read();
        for id in changes.ready {
            for listener in listeners.iter() {
                listener.on_transaction_ready(id);
            }
        }
    }

    /// Warn on the first drop and every thousandth one after that
    fn alert_dropped(before: u64, dropped: u64) {
        let after = before + dropped;
        if before == 0 || before / 1000 != after / 1000 {
            eprintln!(
                "[LOGGER WARNING] {} log transactions dropped before reaching the file sink. \
                 The sink may be stalled or falling behind.",
                after
            );
        }
    }
}
