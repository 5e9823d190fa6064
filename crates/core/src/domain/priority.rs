// Priority classes and the dispatch ordering policy

use super::error::DomainError;
use super::order::Order;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Customer priority class.
///
/// Declaration order is dispatch precedence: the derived `Ord` ranks
/// `Vip < MobileOrder < Regular`, and a smaller rank is served first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Vip,
    MobileOrder,
    #[default]
    Regular,
}

impl Priority {
    /// Fixed class order used when concatenating buckets into the dispatch view.
    pub const DISPATCH_ORDER: [Priority; 3] = [Priority::Vip, Priority::MobileOrder, Priority::Regular];

    /// Zero-based urgency rank (also the bucket index).
    pub fn rank(self) -> usize {
        match self {
            Priority::Vip => 0,
            Priority::MobileOrder => 1,
            Priority::Regular => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Vip => "VIP",
            Priority::MobileOrder => "MOBILE_ORDER",
            Priority::Regular => "REGULAR",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    /// Case-insensitive; `-`, `_` and spaces are interchangeable separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "VIP" => Ok(Priority::Vip),
            "MOBILE_ORDER" | "MOBILE" => Ok(Priority::MobileOrder),
            "REGULAR" => Ok(Priority::Regular),
            _ => Err(DomainError::InvalidPriority(s.to_string())),
        }
    }
}

/// Total dispatch order over orders: priority rank, then sequence number.
///
/// The sequence number is the only tie-break, so two orders of the same class
/// created within the same millisecond still dispatch in enqueue order.
pub fn dispatch_cmp(a: &Order, b: &Order) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.sequence_number.cmp(&b.sequence_number))
}
