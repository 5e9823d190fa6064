// Queue Domain Model - configuration and read models

use super::order::Order;
use super::priority::Priority;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base preparation time for any order (minutes)
pub const DEFAULT_BASE_MINUTES: u32 = 5;

/// Additional preparation time per item (minutes)
pub const DEFAULT_PER_ITEM_MINUTES: u32 = 2;

/// Orders at the head of the queue averaged for the arrival estimate
pub const DEFAULT_ESTIMATE_SAMPLE_SIZE: usize = 5;

/// Buffered events per subscriber before it starts lagging
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Upper bound on the event buffer; slots are allocated up front
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Completed orders reported by analytics
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub base_minutes: u32,
    pub per_item_minutes: u32,
    pub estimate_sample_size: usize,
    pub event_capacity: usize,
    pub recent_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_minutes: DEFAULT_BASE_MINUTES,
            per_item_minutes: DEFAULT_PER_ITEM_MINUTES,
            estimate_sample_size: DEFAULT_ESTIMATE_SAMPLE_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl QueueConfig {
    /// Load configuration from `BREWLINE_*` environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BREWLINE_BASE_MINUTES` (default: 5)
    /// - `BREWLINE_PER_ITEM_MINUTES` (default: 2)
    /// - `BREWLINE_ESTIMATE_SAMPLE_SIZE` (default: 5)
    /// - `BREWLINE_EVENT_CAPACITY` (default: 1024)
    /// - `BREWLINE_RECENT_LIMIT` (default: 10)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`QueueConfig::from_env`] with an injected variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            base_minutes: parse_var(&lookup, "BREWLINE_BASE_MINUTES", defaults.base_minutes)?,
            per_item_minutes: parse_var(
                &lookup,
                "BREWLINE_PER_ITEM_MINUTES",
                defaults.per_item_minutes,
            )?,
            estimate_sample_size: parse_var(
                &lookup,
                "BREWLINE_ESTIMATE_SAMPLE_SIZE",
                defaults.estimate_sample_size,
            )?,
            event_capacity: parse_var(&lookup, "BREWLINE_EVENT_CAPACITY", defaults.event_capacity)?,
            recent_limit: parse_var(&lookup, "BREWLINE_RECENT_LIMIT", defaults.recent_limit)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.estimate_sample_size == 0 {
            return Err(AppError::Config(
                "estimate_sample_size must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(AppError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(AppError::Config(format!(
                "event_capacity must be at most {}, got {}",
                MAX_EVENT_CAPACITY, self.event_capacity
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}

/// Dispatch-ordered view of the queue at one revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Increases by one on every rebuild
    pub revision: u64,
    pub queue_length: usize,
    pub preparing_count: usize,
    /// Estimated wait (minutes) for a new arrival
    pub estimated_wait_time: u32,
    pub orders: Vec<Order>,
    pub preparing: Vec<Order>,
}

/// Cumulative counters and derived averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total_orders: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub peak_queue_length: usize,
    /// Mean created -> completed time (minutes, one decimal)
    pub average_wait_minutes: f64,
    /// Mean started -> completed time (minutes, one decimal)
    pub average_prep_minutes: f64,
}

/// Staff-facing report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueAnalytics {
    pub stats: QueueStats,
    pub queue_by_priority: BTreeMap<Priority, usize>,
    /// Most recently completed orders, newest last
    pub recent_completions: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = QueueConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, QueueConfig::default());
        assert_eq!(config.base_minutes, 5);
        assert_eq!(config.per_item_minutes, 2);
        assert_eq!(config.estimate_sample_size, 5);
    }

    #[test]
    fn test_overrides() {
        let config = QueueConfig::from_lookup(lookup(&[
            ("BREWLINE_BASE_MINUTES", "3"),
            ("BREWLINE_RECENT_LIMIT", " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.base_minutes, 3);
        assert_eq!(config.recent_limit, 25);
        assert_eq!(config.per_item_minutes, 2);
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let err = QueueConfig::from_lookup(lookup(&[("BREWLINE_PER_ITEM_MINUTES", "two")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("BREWLINE_PER_ITEM_MINUTES"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err =
            QueueConfig::from_lookup(lookup(&[("BREWLINE_EVENT_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let max = usize::MAX.to_string();
        let err = QueueConfig::from_lookup(lookup(&[("BREWLINE_EVENT_CAPACITY", max.as_str())]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("at most"));

        let ceiling = MAX_EVENT_CAPACITY.to_string();
        let config =
            QueueConfig::from_lookup(lookup(&[("BREWLINE_EVENT_CAPACITY", ceiling.as_str())]))
                .unwrap();
        assert_eq!(config.event_capacity, MAX_EVENT_CAPACITY);
    }
}
