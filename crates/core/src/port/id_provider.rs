// ID Provider Port (for deterministic testing)

use crate::domain::OrderId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic order id and sequence generator
pub trait IdProvider: Send + Sync {
    /// Next unique order id; strictly increasing, never reused
    fn next_id(&self) -> OrderId;

    /// Next dispatch sequence number; strictly increasing
    fn next_sequence(&self) -> u64;
}

/// In-memory counters starting at 1 (production and tests)
pub struct SequentialIdProvider {
    next_id: AtomicU64,
    next_sequence: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start both counters at `first` (e.g. to continue after a previous run)
    pub fn starting_at(first: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first),
            next_sequence: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdProvider for SequentialIdProvider {
    fn next_id(&self) -> OrderId {
        OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }
}
