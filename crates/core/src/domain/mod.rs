// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod order;
pub mod priority;
pub mod queue;
pub mod wait_time;

// Re-exports
pub use error::DomainError;
pub use event::QueueEvent;
pub use order::{Order, OrderId, OrderStatus};
pub use priority::{dispatch_cmp, Priority};
pub use queue::{QueueAnalytics, QueueConfig, QueueSnapshot, QueueStats};
pub use wait_time::WaitTimeEstimator;
