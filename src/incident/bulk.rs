//! Bulk mutation engine -- one administrative action applied across a set
//! of incident numbers.

use crate::incident::store::{IncidentStore, UpdateField};
use crate::incident::{IncidentError, Status};
use tracing::{info, warn};

/// Recognized bulk actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Resolve,
    Acknowledge,
    Reassign,
}

impl BulkAction {
    fn parse(raw: &str) -> Result<Self, IncidentError> {
        match raw {
            "resolve" => Ok(BulkAction::Resolve),
            "acknowledge" => Ok(BulkAction::Acknowledge),
            "reassign" => Ok(BulkAction::Reassign),
            other => Err(IncidentError::InvalidAction(other.to_string())),
        }
    }
}

/// A caller-supplied bulk request, unvalidated. `action` stays optional
/// here so a missing field surfaces as `MissingParameters` rather than a
/// deserialization failure.
#[derive(Debug, Clone)]
pub struct BulkUpdate {
    pub numbers: Vec<i64>,
    pub action: Option<String>,
    pub assignee: Option<String>,
}

/// Validate and apply a bulk request. All validation happens before any
/// write; the mutation itself is a single statement, so the targeted set
/// is updated atomically. Numbers with no matching incident are skipped.
///
/// Returns the count of records actually updated.
pub fn apply(store: &IncidentStore, req: &BulkUpdate) -> Result<usize, IncidentError> {
    let action = match req.action.as_deref() {
        Some(a) if !a.is_empty() => a,
        _ => return Err(IncidentError::MissingParameters),
    };
    if req.numbers.is_empty() {
        return Err(IncidentError::MissingParameters);
    }

    let action = BulkAction::parse(action)?;

    let (field, value) = match action {
        BulkAction::Resolve => (UpdateField::Status, Status::Resolved.as_str().to_string()),
        BulkAction::Acknowledge => (UpdateField::Status, Status::Acknowledged.as_str().to_string()),
        BulkAction::Reassign => {
            let assignee = match req.assignee.as_deref() {
                Some(a) if !a.is_empty() => a,
                _ => return Err(IncidentError::MissingAssignee),
            };
            (UpdateField::AssignedTo, assignee.to_string())
        }
    };

    let updated = store.update_by_numbers(&req.numbers, field, &value)?;
    if updated < req.numbers.len() {
        // Best-effort by design: unknown numbers are not an error, but the
        // mismatch is worth surfacing for callers chasing their own bugs.
        warn!(
            requested = req.numbers.len(),
            updated, "Bulk update skipped unknown incident numbers"
        );
    }
    info!(?action, updated, "Bulk update applied");
    Ok(updated)
}
