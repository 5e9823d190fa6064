//! Event relay
//!
//! Stand-in for the broadcast layer: drains the queue's event channel and
//! writes each event to the structured log.

use crate::shutdown::ShutdownToken;
use brewline_core::domain::QueueEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Forward queue events to the log until shutdown or channel close.
///
/// Returns the number of events relayed.
pub async fn run(mut events: broadcast::Receiver<QueueEvent>, mut shutdown: ShutdownToken) -> u64 {
    let mut relayed = 0;
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    relay(&event);
                    relayed += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event relay lagged; subscribers should resync from a snapshot");
                }
                Err(RecvError::Closed) => {
                    info!("Event channel closed");
                    break;
                }
            },
            _ = shutdown.wait() => {
                info!("Event relay shutting down");
                break;
            }
        }
    }
    relayed
}

fn relay(event: &QueueEvent) {
    match event {
        QueueEvent::QueueRebuilt { snapshot } => info!(
            event = event.name(),
            revision = snapshot.revision,
            queue_length = snapshot.queue_length,
            preparing = snapshot.preparing_count,
            estimated_wait = snapshot.estimated_wait_time,
            "Queue event"
        ),
        _ => match serde_json::to_string(event) {
            Ok(payload) => info!(event = event.name(), %payload, "Queue event"),
            Err(e) => warn!(event = event.name(), error = %e, "Failed to encode queue event"),
        },
    }
}
