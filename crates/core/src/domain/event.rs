// Domain events published after each successful mutation

use super::order::Order;
use super::queue::QueueSnapshot;
use serde::{Deserialize, Serialize};

/// Outbound queue notification.
///
/// Serialized with an `event` tag, e.g. `{"event":"order_queued","order":{..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    OrderQueued { order: Order },
    OrderStarted { order: Order },
    OrderCompleted { order: Order },
    OrderCancelled { order: Order },
    QueueRebuilt { snapshot: QueueSnapshot },
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::OrderQueued { .. } => "order_queued",
            QueueEvent::OrderStarted { .. } => "order_started",
            QueueEvent::OrderCompleted { .. } => "order_completed",
            QueueEvent::OrderCancelled { .. } => "order_cancelled",
            QueueEvent::QueueRebuilt { .. } => "queue_rebuilt",
        }
    }

    /// The order this event is about, if any.
    pub fn order(&self) -> Option<&Order> {
        match self {
            QueueEvent::OrderQueued { order }
            | QueueEvent::OrderStarted { order }
            | QueueEvent::OrderCompleted { order }
            | QueueEvent::OrderCancelled { order } => Some(order),
            QueueEvent::QueueRebuilt { .. } => None,
        }
    }
}
