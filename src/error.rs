use crate::models::PackageStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("package {0} not found")]
    NotFound(Uuid),

    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: PackageStatus, to: PackageStatus },

    /// Defensive: a status with no transition table entry. Unreachable for
    /// the closed enum, reported to callers like any failed transition.
    #[error("status {0} has no transition table entry")]
    UnknownState(PackageStatus),

    #[error("{0}")]
    Validation(String),

    #[error("storage error during {operation}: {details}")]
    Storage { operation: String, details: String },
}
