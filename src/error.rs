use thiserror::Error;

use crate::store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Input rejected before any backend call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Content is required")]
    MissingContent,
    #[error("Due date is required")]
    MissingDueDate,
    #[error("Date is required")]
    MissingDate,
    #[error("Time is required")]
    MissingTime,
    #[error("Duration must be at least 15 minutes (got {0})")]
    DurationTooShort(u32),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
