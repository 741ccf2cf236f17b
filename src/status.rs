use crate::error::TrackingError;
use crate::models::PackageStatus;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::error;

/// Directed adjacency table of legal status transitions. Every status has an
/// entry, including the terminal ones, so completeness is checkable in tests.
static ALLOWED_TRANSITIONS: Lazy<HashMap<PackageStatus, &'static [PackageStatus]>> = Lazy::new(|| {
    use PackageStatus::*;
    HashMap::from([
        (Created, &[Sent, Canceled] as &'static [PackageStatus]),
        (Sent, &[Accepted, Returned, Canceled] as &'static [PackageStatus]),
        (Returned, &[Sent, Canceled] as &'static [PackageStatus]),
        (Accepted, &[] as &'static [PackageStatus]),
        (Canceled, &[] as &'static [PackageStatus]),
    ])
});

/// Statuses reachable from `from` in one step. `None` means the status is
/// missing from the table entirely, which is a table defect, not a terminal
/// state.
pub fn allowed_targets(from: PackageStatus) -> Option<&'static [PackageStatus]> {
    ALLOWED_TRANSITIONS.get(&from).copied()
}

pub fn is_allowed(from: PackageStatus, to: PackageStatus) -> bool {
    allowed_targets(from).is_some_and(|allowed| allowed.contains(&to))
}

/// A terminal status has an entry with no outgoing transitions.
pub fn is_terminal(status: PackageStatus) -> bool {
    allowed_targets(status).is_some_and(|allowed| allowed.is_empty())
}

pub fn ensure_transition(from: PackageStatus, to: PackageStatus) -> Result<(), TrackingError> {
    match allowed_targets(from) {
        None => {
            error!("transition table has no entry for status from={}", from);
            Err(TrackingError::UnknownState(from))
        }
        Some(allowed) if allowed.contains(&to) => Ok(()),
        Some(_) => Err(TrackingError::InvalidTransition { from, to }),
    }
}
