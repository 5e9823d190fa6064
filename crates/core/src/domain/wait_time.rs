// Wait-time estimation

use super::order::Order;
use super::queue::QueueConfig;

/// Pure wait-time computation, parameterised by [`QueueConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimeEstimator {
    base_minutes: u32,
    per_item_minutes: u32,
    sample_size: usize,
}

impl WaitTimeEstimator {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            base_minutes: config.base_minutes,
            per_item_minutes: config.per_item_minutes,
            sample_size: config.estimate_sample_size,
        }
    }

    /// Per-order estimate: `base + items * per_item`.
    pub fn estimate_order(&self, item_count: usize) -> u32 {
        let items = u32::try_from(item_count).unwrap_or(u32::MAX);
        self.base_minutes
            .saturating_add(items.saturating_mul(self.per_item_minutes))
    }

    /// Estimate for a new arrival, given the dispatch-ordered view.
    ///
    /// Floor-averages the estimates of the first `sample_size` orders and
    /// never returns less than the base time. An empty view yields the base.
    pub fn estimate_queue<'a, I>(&self, ordered: I) -> u32
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let (total, count) = ordered
            .into_iter()
            .take(self.sample_size)
            .fold((0u64, 0u64), |(total, count), order| {
                (total + u64::from(order.estimated_wait_time), count + 1)
            });

        if count == 0 {
            return self.base_minutes;
        }

        let average = u32::try_from(total / count).unwrap_or(u32::MAX);
        average.max(self.base_minutes)
    }
}

impl Default for WaitTimeEstimator {
    fn default() -> Self {
        Self::new(&QueueConfig::default())
    }
}
