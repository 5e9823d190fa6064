// Queue State - buckets, preparing lookup, history and counters
//
// Buckets are the only source of truth for QUEUED orders; the dispatch view
// is always derived from them and never stored separately.

use crate::domain::{
    dispatch_cmp, Order, OrderId, OrderStatus, Priority, QueueSnapshot, QueueStats,
    WaitTimeEstimator,
};
use crate::error::{AppError, Result};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Where a QUEUED order sits: bucket index and offset within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    bucket: usize,
    index: usize,
}

#[derive(Debug, Default)]
struct Counters {
    total_orders: u64,
    completed: u64,
    cancelled: u64,
    peak_queue_length: usize,
    wait_millis_total: i64,
    prep_millis_total: i64,
}

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    buckets: [VecDeque<Order>; 3],
    preparing: BTreeMap<OrderId, Order>,
    history: Vec<Order>,
    revision: u64,
    counters: Counters,
}

impl QueueState {
    /// Dispatch-ordered view: buckets concatenated in class order
    pub(crate) fn ordered(&self) -> impl Iterator<Item = &Order> {
        Priority::DISPATCH_ORDER
            .into_iter()
            .flat_map(move |p| self.buckets[p.rank()].iter())
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }

    pub(crate) fn bucket_len(&self, priority: Priority) -> usize {
        self.buckets[priority.rank()].len()
    }

    /// Reassign `position_in_queue` from the bucket concatenation.
    pub(crate) fn rebuild(&mut self) {
        let mut position = 0;
        for priority in Priority::DISPATCH_ORDER {
            for order in self.buckets[priority.rank()].iter_mut() {
                position += 1;
                order.position_in_queue = Some(position);
            }
        }
        self.revision += 1;
        debug!(revision = self.revision, queue_length = position, "Queue rebuilt");
    }

    /// Append a new order to the tail of its bucket; caller rebuilds.
    pub(crate) fn push_queued(&mut self, order: Order) -> Slot {
        let bucket = order.priority.rank();
        self.buckets[bucket].push_back(order);
        self.counters.total_orders += 1;
        Slot {
            bucket,
            index: self.buckets[bucket].len() - 1,
        }
    }

    /// Record the queue length after an enqueue rebuild.
    pub(crate) fn observe_queue_length(&mut self) {
        let length = self.queue_len();
        if length > self.counters.peak_queue_length {
            self.counters.peak_queue_length = length;
        }
    }

    pub(crate) fn queued_at(&self, slot: Slot) -> Option<&Order> {
        self.buckets[slot.bucket].get(slot.index)
    }

    /// Slot of the order ranked first in dispatch order
    pub(crate) fn head(&self) -> Option<Slot> {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(bucket, orders)| orders.front().map(|order| (bucket, order)))
            .min_by(|(_, a), (_, b)| dispatch_cmp(a, b))
            .map(|(bucket, _)| Slot { bucket, index: 0 })
    }

    pub(crate) fn locate_queued(&self, id: OrderId) -> Option<Slot> {
        self.buckets.iter().enumerate().find_map(|(bucket, orders)| {
            orders
                .iter()
                .position(|o| o.id == id)
                .map(|index| Slot { bucket, index })
        })
    }

    /// Remove a QUEUED order and apply `transition` to it.
    ///
    /// If the transition is rejected the order is put back where it was and
    /// the state is unchanged. Caller rebuilds on success.
    pub(crate) fn take_queued<F>(&mut self, slot: Slot, transition: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> crate::domain::error::Result<()>,
    {
        let bucket = &mut self.buckets[slot.bucket];
        let mut order = bucket.remove(slot.index).ok_or_else(|| {
            AppError::Internal(format!(
                "bucket {} has no order at {}",
                slot.bucket, slot.index
            ))
        })?;

        if let Err(e) = transition(&mut order) {
            bucket.insert(slot.index, order);
            return Err(e.into());
        }
        Ok(order)
    }

    pub(crate) fn insert_preparing(&mut self, order: Order) {
        self.preparing.insert(order.id, order);
    }

    pub(crate) fn preparing_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.preparing.get_mut(&id)
    }

    pub(crate) fn remove_preparing(&mut self, id: OrderId) -> Option<Order> {
        self.preparing.remove(&id)
    }

    pub(crate) fn preparing(&self) -> impl Iterator<Item = &Order> {
        self.preparing.values()
    }

    /// Move a terminal order into history and update counters.
    pub(crate) fn archive(&mut self, order: Order) -> Result<()> {
        if !order.status.is_terminal() {
            return Err(AppError::Internal(format!(
                "order {} is {}, only terminal orders are archived",
                order.id, order.status
            )));
        }

        if order.status == OrderStatus::Cancelled {
            self.counters.cancelled += 1;
        } else {
            self.counters.completed += 1;
            if let Some(done) = order.completed_at {
                self.counters.wait_millis_total += done - order.created_at;
                if let Some(started) = order.started_at {
                    self.counters.prep_millis_total += done - started;
                }
            }
        }
        self.history.push(order);
        Ok(())
    }

    pub(crate) fn history(&self) -> &[Order] {
        &self.history
    }

    /// Find an order anywhere it can live.
    pub(crate) fn find(&self, id: OrderId) -> Option<&Order> {
        self.locate_queued(id)
            .and_then(|slot| self.queued_at(slot))
            .or_else(|| self.preparing.get(&id))
            .or_else(|| self.history.iter().rev().find(|o| o.id == id))
    }

    /// Explain why `id` cannot move to `to`.
    pub(crate) fn transition_failure(&self, id: OrderId, to: OrderStatus) -> AppError {
        match self.find(id) {
            Some(order) => AppError::InvalidTransition(format!(
                "order {} is {}, cannot move to {}",
                id, order.status, to
            )),
            None => AppError::InvalidTransition(format!(
                "order {} does not exist, cannot move to {}",
                id, to
            )),
        }
    }

    pub(crate) fn snapshot(&self, estimator: &WaitTimeEstimator) -> QueueSnapshot {
        QueueSnapshot {
            revision: self.revision,
            queue_length: self.queue_len(),
            preparing_count: self.preparing.len(),
            estimated_wait_time: estimator.estimate_queue(self.ordered()),
            orders: self.ordered().cloned().collect(),
            preparing: self.preparing.values().cloned().collect(),
        }
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let c = &self.counters;
        QueueStats {
            total_orders: c.total_orders,
            completed: c.completed,
            cancelled: c.cancelled,
            peak_queue_length: c.peak_queue_length,
            average_wait_minutes: average_minutes(c.wait_millis_total, c.completed),
            average_prep_minutes: average_minutes(c.prep_millis_total, c.completed),
        }
    }
}

/// Mean of `total_millis` over `count`, in minutes rounded to one decimal
fn average_minutes(total_millis: i64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let minutes = total_millis as f64 / 60_000.0 / count as f64;
    (minutes * 10.0).round() / 10.0
}
