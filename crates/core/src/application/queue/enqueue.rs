// Enqueue request and validation

use crate::domain::Priority;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Enqueue request as received from the request-handling layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub customer_name: String,
    pub items: Vec<String>,

    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    Priority::Regular.to_string()
}

impl EnqueueRequest {
    pub fn new(
        customer_name: impl Into<String>,
        items: impl IntoIterator<Item = impl Into<String>>,
        priority: Priority,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            items: items.into_iter().map(Into::into).collect(),
            priority: priority.to_string(),
        }
    }
}

/// Request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub customer_name: String,
    pub items: Vec<String>,
    pub priority: Priority,
}

/// Validate an enqueue request without touching queue state
pub fn validate_request(req: EnqueueRequest) -> Result<ValidatedOrder> {
    let customer_name = req.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::Validation(
            "customer name cannot be empty".to_string(),
        ));
    }

    if req.items.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }

    let mut items = Vec::with_capacity(req.items.len());
    for (index, item) in req.items.iter().enumerate() {
        let item = item.trim();
        if item.is_empty() {
            return Err(AppError::Validation(format!(
                "item {} has an empty name",
                index + 1
            )));
        }
        items.push(item.to_string());
    }

    let priority = req
        .priority
        .parse::<Priority>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(ValidatedOrder {
        customer_name: customer_name.to_string(),
        items,
        priority,
    })
}
