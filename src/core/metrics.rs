//! Logger metrics for observability
//!
//! Counters shared between producer threads, the transaction buffer and the
//! sink worker. Losing an entry is never an error in this system, so these
//! counters are the only place where expired or evicted transactions show up.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use loge::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_buffered();
/// metrics.record_expired();
///
/// assert_eq!(metrics.entries_buffered(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries accepted by the transaction buffer
    entries_buffered: AtomicU64,

    /// Transactions closed and assigned an id
    transactions_closed: AtomicU64,

    /// Transactions handed to a consumer with remove semantics
    transactions_delivered: AtomicU64,

    /// Transactions discarded after the backlog expiration timeout
    transactions_expired: AtomicU64,

    /// Transactions evicted because the backlog was full
    transactions_evicted: AtomicU64,

    /// Entries written to the output file
    entries_persisted: AtomicU64,

    /// Entries skipped because they could not be serialized
    serialization_failures: AtomicU64,

    /// Files deleted to bring disk usage under the threshold
    files_evicted: AtomicU64,

    /// Times the sink switched to a new output file
    rotations: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            entries_buffered: AtomicU64::new(0),
            transactions_closed: AtomicU64::new(0),
            transactions_delivered: AtomicU64::new(0),
            transactions_expired: AtomicU64::new(0),
            transactions_evicted: AtomicU64::new(0),
            entries_persisted: AtomicU64::new(0),
            serialization_failures: AtomicU64::new(0),
            files_evicted: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entries_buffered(&self) -> u64 {
        self.entries_buffered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transactions_closed(&self) -> u64 {
        self.transactions_closed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transactions_delivered(&self) -> u64 {
        self.transactions_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transactions_expired(&self) -> u64 {
        self.transactions_expired.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transactions_evicted(&self) -> u64 {
        self.transactions_evicted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_persisted(&self) -> u64 {
        self.entries_persisted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn serialization_failures(&self) -> u64 {
        self.serialization_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn files_evicted(&self) -> u64 {
        self.files_evicted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Transactions lost without reaching a consumer (expired plus evicted)
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.transactions_expired() + self.transactions_evicted()
    }

    #[inline]
    pub fn record_buffered(&self) -> u64 {
        self.entries_buffered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_closed(&self) -> u64 {
        self.transactions_closed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.transactions_delivered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an expired transaction, returning the previous drop total
    #[inline]
    pub fn record_expired(&self) -> u64 {
        let previous = self.dropped_count();
        self.transactions_expired.fetch_add(1, Ordering::Relaxed);
        previous
    }

    /// Record an evicted transaction, returning the previous drop total
    #[inline]
    pub fn record_evicted(&self) -> u64 {
        let previous = self.dropped_count();
        self.transactions_evicted.fetch_add(1, Ordering::Relaxed);
        previous
    }

    #[inline]
    pub fn record_persisted(&self, entries: u64) -> u64 {
        self.entries_persisted.fetch_add(entries, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_serialization_failure(&self) -> u64 {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_file_evicted(&self) -> u64 {
        self.files_evicted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of closed transactions that never reached a consumer (0.0 - 100.0)
    ///
    /// Returns 0.0 if no transaction has been closed.
    pub fn drop_rate(&self) -> f64 {
        let closed = self.transactions_closed() as f64;
        if closed == 0.0 {
            0.0
        } else {
            (self.dropped_count() as f64 / closed) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        for counter in [
            &self.entries_buffered,
            &self.transactions_closed,
            &self.transactions_delivered,
            &self.transactions_expired,
            &self.transactions_evicted,
            &self.entries_persisted,
            &self.serialization_failures,
            &self.files_evicted,
            &self.rotations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            entries_buffered: AtomicU64::new(self.entries_buffered()),
            transactions_closed: AtomicU64::new(self.transactions_closed()),
            transactions_delivered: AtomicU64::new(self.transactions_delivered()),
            transactions_expired: AtomicU64::new(self.transactions_expired()),
            transactions_evicted: AtomicU64::new(self.transactions_evicted()),
            entries_persisted: AtomicU64::new(self.entries_persisted()),
            serialization_failures: AtomicU64::new(self.serialization_failures()),
            files_evicted: AtomicU64::new(self.files_evicted()),
            rotations: AtomicU64::new(self.rotations()),
        }
    }
}
