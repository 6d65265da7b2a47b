use serde::Serialize;

use super::domain::ListingStatus;

/// Moderation actions available to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Reject,
    Remove,
}

/// Effect of applying an [`AdminAction`] to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Status moves from pending to approved.
    Approved,
    /// Record already in the requested state.
    Unchanged,
    /// Record leaves the store.
    Deleted,
}

impl ListingStatus {
    /// pending -> {approved, removed}; approved -> {removed}.
    pub fn apply(self, action: AdminAction) -> Result<Transition, TransitionError> {
        match (self, action) {
            (ListingStatus::Pending, AdminAction::Approve) => Ok(Transition::Approved),
            (ListingStatus::Approved, AdminAction::Approve) => Ok(Transition::Unchanged),
            (ListingStatus::Pending, AdminAction::Reject) => Ok(Transition::Deleted),
            (ListingStatus::Approved, AdminAction::Reject) => Err(TransitionError::RejectApproved),
            (_, AdminAction::Remove) => Ok(Transition::Deleted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("approved listings cannot be rejected; remove them instead")]
    RejectApproved,
}
