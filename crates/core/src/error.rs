// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for any rejected lifecycle move, whether detected by the queue
    /// manager or by the order itself.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            AppError::InvalidTransition(_)
                | AppError::Domain(crate::domain::DomainError::InvalidStateTransition { .. })
        )
    }

    /// True for rejected enqueue input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Domain(crate::domain::DomainError::ValidationError(_))
                | AppError::Domain(crate::domain::DomainError::InvalidPriority(_))
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
