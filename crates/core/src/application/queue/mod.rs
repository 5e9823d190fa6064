// Queue Manager - priority dispatch queue use cases

pub mod enqueue;
mod state;

pub use enqueue::{validate_request, EnqueueRequest, ValidatedOrder};

use crate::domain::queue::MAX_EVENT_CAPACITY;
use crate::domain::{
    Order, OrderId, OrderStatus, Priority, QueueAnalytics, QueueConfig, QueueEvent,
    QueueSnapshot, QueueStats, WaitTimeEstimator,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider};
use parking_lot::Mutex;
use state::{QueueState, Slot};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Owns every order and decides which one is served next.
///
/// Every mutating operation runs as one critical section (validate, mutate,
/// rebuild, count). Events are published only after the lock is released, so
/// slow subscribers never extend the hold time.
pub struct QueueManager {
    state: Mutex<QueueState>,
    estimator: WaitTimeEstimator,
    recent_limit: usize,
    events: broadcast::Sender<QueueEvent>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueManager {
    pub fn new(
        config: QueueConfig,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        // Configs built by hand skip `validate`
        let capacity = config.event_capacity.clamp(1, MAX_EVENT_CAPACITY);
        let (events, _) = broadcast::channel(capacity);
        Self {
            state: Mutex::new(QueueState::default()),
            estimator: WaitTimeEstimator::new(&config),
            recent_limit: config.recent_limit,
            events,
            id_provider,
            time_provider,
        }
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Create a QUEUED order at the tail of its priority bucket
    pub fn enqueue(&self, req: EnqueueRequest) -> Result<Order> {
        let new_order = validate_request(req).map_err(|e| {
            warn!(error = %e, "Enqueue rejected");
            e
        })?;

        let estimate = self.estimator.estimate_order(new_order.items.len());

        let (order, snapshot) = {
            let mut state = self.state.lock();

            // Assigned under the lock so bucket FIFO order matches sequence order
            let order = Order::new(
                self.id_provider.next_id(),
                self.id_provider.next_sequence(),
                self.time_provider.now_millis(),
                new_order.customer_name,
                new_order.items,
                new_order.priority,
                estimate,
            );

            let slot = state.push_queued(order);
            state.rebuild();
            state.observe_queue_length();

            let order = state
                .queued_at(slot)
                .cloned()
                .ok_or_else(|| AppError::Internal("enqueued order vanished".to_string()))?;
            (order, state.snapshot(&self.estimator))
        };

        info!(
            order_id = %order.id,
            priority = %order.priority,
            position = ?order.position_in_queue,
            estimated_wait = order.estimated_wait_time,
            "Order queued"
        );

        self.publish(QueueEvent::OrderQueued {
            order: order.clone(),
        });
        self.publish(QueueEvent::QueueRebuilt { snapshot });
        Ok(order)
    }

    /// Start the order ranked first; `None` when nothing is queued
    pub fn dispatch_next(&self) -> Result<Option<Order>> {
        let (order, snapshot) = {
            let mut state = self.state.lock();
            let Some(slot) = state.head() else {
                debug!("Dispatch requested on empty queue");
                return Ok(None);
            };
            let now = self.time_provider.now_millis();
            self.start_queued(&mut state, slot, now)?
        };

        info!(order_id = %order.id, priority = %order.priority, "Order dispatched");

        self.publish_started(order.clone(), snapshot);
        Ok(Some(order))
    }

    /// Start a specific QUEUED order out of turn
    pub fn start(&self, order_id: OrderId) -> Result<Order> {
        let (order, snapshot) = {
            let mut state = self.state.lock();
            let Some(slot) = state.locate_queued(order_id) else {
                warn!(order_id = %order_id, "Start rejected: order is not queued");
                return Err(AppError::NotFound(format!(
                    "order {} is not queued",
                    order_id
                )));
            };
            let now = self.time_provider.now_millis();
            self.start_queued(&mut state, slot, now)?
        };

        info!(order_id = %order.id, priority = %order.priority, "Order started out of turn");

        self.publish_started(order.clone(), snapshot);
        Ok(order)
    }

    /// PREPARING -> COMPLETED, moving the order into history
    pub fn complete(&self, order_id: OrderId) -> Result<Order> {
        let order = {
            let mut state = self.state.lock();
            let now = self.time_provider.now_millis();

            match state.preparing_mut(order_id) {
                Some(order) => order.complete(now)?,
                None => {
                    let err = state.transition_failure(order_id, OrderStatus::Completed);
                    warn!(order_id = %order_id, error = %err, "Complete rejected");
                    return Err(err);
                }
            }

            let order = state.remove_preparing(order_id).ok_or_else(|| {
                AppError::Internal(format!("order {} left preparing lookup", order_id))
            })?;
            state.archive(order.clone())?;
            order
        };

        info!(
            order_id = %order.id,
            wait_minutes = ?order.actual_wait_minutes(),
            "Order completed"
        );

        self.publish(QueueEvent::OrderCompleted { order: order.clone() });
        Ok(order)
    }

    /// QUEUED | PREPARING -> CANCELLED, moving the order into history
    pub fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let (order, snapshot) = {
            let mut state = self.state.lock();
            let now = self.time_provider.now_millis();

            if let Some(slot) = state.locate_queued(order_id) {
                let order = state.take_queued(slot, |o| o.cancel(now))?;
                state.archive(order.clone())?;
                state.rebuild();
                (order, Some(state.snapshot(&self.estimator)))
            } else if let Some(order) = state.preparing_mut(order_id) {
                order.cancel(now)?;
                let order = state.remove_preparing(order_id).ok_or_else(|| {
                    AppError::Internal(format!("order {} left preparing lookup", order_id))
                })?;
                state.archive(order.clone())?;
                (order, None)
            } else {
                let err = state.transition_failure(order_id, OrderStatus::Cancelled);
                warn!(order_id = %order_id, error = %err, "Cancel rejected");
                return Err(err);
            }
        };

        info!(
            order_id = %order.id,
            was_queued = snapshot.is_some(),
            "Order cancelled"
        );

        self.publish(QueueEvent::OrderCancelled {
            order: order.clone(),
        });
        if let Some(snapshot) = snapshot {
            self.publish(QueueEvent::QueueRebuilt { snapshot });
        }
        Ok(order)
    }

    /// Current dispatch-ordered view and arrival estimate
    pub fn snapshot(&self) -> QueueSnapshot {
        self.state.lock().snapshot(&self.estimator)
    }

    /// Estimated wait (minutes) for a new arrival
    pub fn estimated_wait(&self) -> u32 {
        let state = self.state.lock();
        self.estimator.estimate_queue(state.ordered())
    }

    pub fn stats(&self) -> QueueStats {
        self.state.lock().stats()
    }

    /// Look up an order wherever it currently lives
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.state.lock().find(order_id).cloned()
    }

    /// Active orders for a customer (case-insensitive), queued first
    pub fn customer_orders(&self, customer_name: &str) -> Vec<Order> {
        let wanted = customer_name.trim().to_lowercase();
        let state = self.state.lock();
        state
            .ordered()
            .chain(state.preparing())
            .filter(|o| o.customer_name.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    /// Stats, per-class queue lengths and recent completions
    pub fn analytics(&self) -> QueueAnalytics {
        let state = self.state.lock();

        let queue_by_priority = Priority::DISPATCH_ORDER
            .into_iter()
            .map(|p| (p, state.bucket_len(p)))
            .collect();

        let mut recent_completions: Vec<Order> = state
            .history()
            .iter()
            .rev()
            .filter(|o| o.status == OrderStatus::Completed)
            .take(self.recent_limit)
            .cloned()
            .collect();
        recent_completions.reverse();

        QueueAnalytics {
            stats: state.stats(),
            queue_by_priority,
            recent_completions,
        }
    }

    /// Shared QUEUED -> PREPARING transition for dispatch and explicit start
    fn start_queued(
        &self,
        state: &mut QueueState,
        slot: Slot,
        now: i64,
    ) -> Result<(Order, QueueSnapshot)> {
        let order = state.take_queued(slot, |o| o.start(now))?;
        state.insert_preparing(order.clone());
        state.rebuild();
        Ok((order, state.snapshot(&self.estimator)))
    }

    fn publish_started(&self, order: Order, snapshot: QueueSnapshot) {
        self.publish(QueueEvent::OrderStarted { order });
        self.publish(QueueEvent::QueueRebuilt { snapshot });
    }

    fn publish(&self, event: QueueEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            debug!(event = name, "No subscribers for queue event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use crate::port::SequentialIdProvider;

    fn manager() -> (QueueManager, Arc<ManualTimeProvider>) {
        let clock = Arc::new(ManualTimeProvider::new(1_000));
        let manager = QueueManager::new(
            QueueConfig::default(),
            Arc::new(SequentialIdProvider::new()),
            clock.clone(),
        );
        (manager, clock)
    }

    fn enqueue(manager: &QueueManager, name: &str, items: &[&str], priority: Priority) -> Order {
        manager
            .enqueue(EnqueueRequest::new(name, items.iter().copied(), priority))
            .unwrap()
    }

    #[test]
    fn test_enqueue_assigns_position_and_estimate() {
        let (manager, _) = manager();
        let order = enqueue(&manager, "Ada", &["Latte", "Croissant"], Priority::Regular);

        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.position_in_queue, Some(1));
        assert_eq!(order.estimated_wait_time, 9);
        assert_eq!(manager.stats().total_orders, 1);
    }

    #[test]
    fn test_vip_jumps_ahead_of_regular() {
        let (manager, _) = manager();
        let regular = enqueue(&manager, "Ada", &["Latte"], Priority::Regular);
        let vip = enqueue(&manager, "Grace", &["Espresso"], Priority::Vip);

        assert_eq!(vip.position_in_queue, Some(1));
        let snapshot = manager.snapshot();
        let ids: Vec<OrderId> = snapshot.orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![vip.id, regular.id]);
        assert_eq!(snapshot.orders[1].position_in_queue, Some(2));
    }

    #[test]
    fn test_dispatch_on_empty_queue() {
        let (manager, _) = manager();
        assert!(manager.dispatch_next().unwrap().is_none());
        assert_eq!(manager.snapshot().revision, 0);
    }

    #[test]
    fn test_start_unknown_is_not_found() {
        let (manager, _) = manager();
        let err = manager.start(OrderId::new(42)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_start_preparing_order_is_not_found() {
        let (manager, _) = manager();
        let order = enqueue(&manager, "Ada", &["Latte"], Priority::Regular);
        manager.dispatch_next().unwrap();

        let err = manager.start(order.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_complete_queued_order_is_invalid_transition() {
        let (manager, _) = manager();
        let order = enqueue(&manager, "Ada", &["Latte"], Priority::Regular);

        let err = manager.complete(order.id).unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(err.to_string().contains("QUEUED"));
        assert_eq!(manager.get(order.id).unwrap().status, OrderStatus::Queued);
    }

    #[test]
    fn test_stats_track_actual_wait() {
        let (manager, clock) = manager();
        let order = enqueue(&manager, "Ada", &["Latte"], Priority::Regular);
        clock.advance_minutes(1);
        manager.dispatch_next().unwrap();
        clock.advance_minutes(3);
        manager.complete(order.id).unwrap();

        let stats = manager.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.average_wait_minutes, 4.0);
        assert_eq!(stats.average_prep_minutes, 3.0);
    }

    #[test]
    fn test_peak_queue_length() {
        let (manager, _) = manager();
        for name in ["a", "b", "c"] {
            enqueue(&manager, name, &["Latte"], Priority::Regular);
        }
        manager.dispatch_next().unwrap();
        manager.dispatch_next().unwrap();
        enqueue(&manager, "d", &["Latte"], Priority::Regular);

        assert_eq!(manager.stats().peak_queue_length, 3);
    }

    #[test]
    fn test_customer_orders_case_insensitive() {
        let (manager, _) = manager();
        enqueue(&manager, "Ada", &["Latte"], Priority::Regular);
        enqueue(&manager, "Grace", &["Mocha"], Priority::Vip);
        enqueue(&manager, "ada", &["Muffin"], Priority::MobileOrder);
        manager.dispatch_next().unwrap(); // Grace

        let orders = manager.customer_orders("ADA");
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Queued));
        assert_eq!(orders[0].items, vec!["Muffin"]);
    }

    #[test]
    fn test_analytics_recent_completions_bounded() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let config = QueueConfig {
            recent_limit: 2,
            ..QueueConfig::default()
        };
        let manager = QueueManager::new(config, Arc::new(SequentialIdProvider::new()), clock);

        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let order = enqueue(&manager, name, &["Latte"], Priority::Regular);
            manager.dispatch_next().unwrap();
            manager.complete(order.id).unwrap();
            ids.push(order.id);
        }
        enqueue(&manager, "d", &["Latte"], Priority::Vip);

        let analytics = manager.analytics();
        let recent: Vec<OrderId> = analytics.recent_completions.iter().map(|o| o.id).collect();
        assert_eq!(recent, vec![ids[1], ids[2]]);
        assert_eq!(analytics.queue_by_priority[&Priority::Vip], 1);
        assert_eq!(analytics.queue_by_priority[&Priority::Regular], 0);
        assert_eq!(analytics.stats.completed, 3);
    }

    #[test]
    fn test_unvalidated_capacity_is_clamped() {
        let config = QueueConfig {
            event_capacity: usize::MAX,
            ..QueueConfig::default()
        };
        let manager = QueueManager::new(
            config,
            Arc::new(SequentialIdProvider::new()),
            Arc::new(ManualTimeProvider::new(0)),
        );
        let mut rx = manager.subscribe();

        enqueue(&manager, "Ada", &["Latte"], Priority::Vip);
        assert_eq!(rx.try_recv().unwrap().name(), "order_queued");
    }
}
