// Order Domain Model

use super::error::{DomainError, Result};
use super::priority::Priority;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order ID (monotonic, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(OrderId)
            .map_err(|_| DomainError::ValidationError(format!("invalid order id: {}", s)))
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Queued,
    Preparing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// COMPLETED and CANCELLED accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Queued => write!(f, "QUEUED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Order Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: OrderId,
    pub sequence_number: u64,
    pub customer_name: String,
    pub items: Vec<String>,
    pub priority: Priority,

    // Lifecycle
    pub status: OrderStatus,
    pub estimated_wait_time: u32, // minutes
    pub position_in_queue: Option<usize>,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Create a new QUEUED order
    ///
    /// # Arguments
    ///
    /// * `id` - Unique order ID (injected, not generated)
    /// * `sequence_number` - Dispatch tie-break key (injected)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `customer_name` - Customer display name
    /// * `items` - Ordered item names
    /// * `priority` - Priority class
    /// * `estimated_wait_time` - Minutes, fixed at creation
    pub fn new(
        id: OrderId,
        sequence_number: u64,
        created_at: i64,
        customer_name: impl Into<String>,
        items: Vec<String>,
        priority: Priority,
        estimated_wait_time: u32,
    ) -> Self {
        Self {
            id,
            sequence_number,
            customer_name: customer_name.into(),
            items,
            priority,
            status: OrderStatus::Queued,
            estimated_wait_time,
            position_in_queue: None,
            created_at,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Transition QUEUED -> PREPARING with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        match self.status {
            OrderStatus::Queued => {
                self.status = OrderStatus::Preparing;
                self.started_at = Some(now_millis);
                self.position_in_queue = None;
                Ok(())
            }
            OrderStatus::Preparing | OrderStatus::Completed | OrderStatus::Cancelled => {
                Err(self.rejected(OrderStatus::Preparing))
            }
        }
    }

    /// Transition PREPARING -> COMPLETED with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        match self.status {
            OrderStatus::Preparing => {
                self.status = OrderStatus::Completed;
                self.completed_at = Some(now_millis);
                Ok(())
            }
            OrderStatus::Queued | OrderStatus::Completed | OrderStatus::Cancelled => {
                Err(self.rejected(OrderStatus::Completed))
            }
        }
    }

    /// Transition QUEUED | PREPARING -> CANCELLED with explicit timestamp
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        match self.status {
            OrderStatus::Queued | OrderStatus::Preparing => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_at = Some(now_millis);
                self.position_in_queue = None;
                Ok(())
            }
            OrderStatus::Completed | OrderStatus::Cancelled => {
                Err(self.rejected(OrderStatus::Cancelled))
            }
        }
    }

    /// Minutes between creation and completion, once completed.
    pub fn actual_wait_minutes(&self) -> Option<f64> {
        self.completed_at
            .map(|done| (done - self.created_at) as f64 / 60_000.0)
    }

    fn rejected(&self, to: OrderStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
