// Concurrency and Race Condition Tests

use std::collections::HashSet;
use std::sync::Arc;

use brewline_core::application::EnqueueRequest;
use brewline_core::domain::{OrderStatus, Priority, QueueConfig};
use brewline_core::port::{SequentialIdProvider, SystemTimeProvider};
use brewline_core::QueueManager;
use tokio::task::JoinSet;

fn setup() -> Arc<QueueManager> {
    Arc::new(QueueManager::new(
        QueueConfig::default(),
        Arc::new(SequentialIdProvider::new()),
        Arc::new(SystemTimeProvider),
    ))
}

fn priority_for(i: usize) -> Priority {
    Priority::DISPATCH_ORDER[i % Priority::DISPATCH_ORDER.len()]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueue_unique_ids_and_contiguous_positions() {
    let manager = setup();
    let mut set = JoinSet::new();

    for worker in 0..8 {
        let manager = Arc::clone(&manager);
        set.spawn_blocking(move || {
            (0..25)
                .map(|i| {
                    manager
                        .enqueue(EnqueueRequest::new(
                            format!("w{}-{}", worker, i),
                            ["Latte"],
                            priority_for(worker + i),
                        ))
                        .unwrap()
                        .id
                })
                .collect::<Vec<_>>()
        });
    }

    let mut ids = HashSet::new();
    while let Some(result) = set.join_next().await {
        for id in result.unwrap() {
            assert!(ids.insert(id), "duplicate id {}", id);
        }
    }
    assert_eq!(ids.len(), 200);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.queue_length, 200);
    for (i, order) in snapshot.orders.iter().enumerate() {
        assert_eq!(order.position_in_queue, Some(i + 1));
    }
    // Within each class, dispatch order is sequence order
    for pair in snapshot.orders.windows(2) {
        if pair[0].priority == pair[1].priority {
            assert!(pair[0].sequence_number < pair[1].sequence_number);
        } else {
            assert!(pair[0].priority < pair[1].priority);
        }
    }
    assert_eq!(manager.stats().total_orders, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch_never_hands_out_an_order_twice() {
    let manager = setup();
    for i in 0..120 {
        manager
            .enqueue(EnqueueRequest::new(format!("guest-{}", i), ["Tea"], priority_for(i)))
            .unwrap();
    }

    let mut set = JoinSet::new();
    for _ in 0..6 {
        let manager = Arc::clone(&manager);
        set.spawn_blocking(move || {
            let mut served = Vec::new();
            while let Some(order) = manager.dispatch_next().unwrap() {
                assert_eq!(order.status, OrderStatus::Preparing);
                manager.complete(order.id).unwrap();
                served.push(order.id);
            }
            served
        });
    }

    let mut served = HashSet::new();
    while let Some(result) = set.join_next().await {
        for id in result.unwrap() {
            assert!(served.insert(id), "order {} dispatched twice", id);
        }
    }
    assert_eq!(served.len(), 120);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.queue_length, 0);
    assert_eq!(snapshot.preparing_count, 0);
    assert_eq!(manager.stats().completed, 120);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_producers_and_cancellers_keep_counts_consistent() {
    let manager = setup();
    let mut set = JoinSet::new();

    for worker in 0..4 {
        let manager = Arc::clone(&manager);
        set.spawn_blocking(move || {
            for i in 0..30 {
                let order = manager
                    .enqueue(EnqueueRequest::new(
                        format!("p{}-{}", worker, i),
                        ["Tea"],
                        priority_for(i),
                    ))
                    .unwrap();
                if i % 3 == 0 {
                    // May race with a dispatcher; either outcome is legal
                    let _ = manager.cancel(order.id);
                }
            }
        });
    }
    for _ in 0..2 {
        let manager = Arc::clone(&manager);
        set.spawn_blocking(move || {
            for _ in 0..40 {
                if let Some(order) = manager.dispatch_next().unwrap() {
                    // A producer may have cancelled it in between
                    let _ = manager.complete(order.id);
                }
            }
        });
    }
    while let Some(result) = set.join_next().await {
        result.unwrap();
    }

    let stats = manager.stats();
    let snapshot = manager.snapshot();
    assert_eq!(stats.total_orders, 120);
    assert_eq!(
        stats.completed + stats.cancelled + snapshot.queue_length as u64
            + snapshot.preparing_count as u64,
        120
    );
    for (i, order) in snapshot.orders.iter().enumerate() {
        assert_eq!(order.position_in_queue, Some(i + 1));
    }
}
