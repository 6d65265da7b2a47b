use crate::marketplace::approval::{AdminAction, Transition, TransitionError};
use crate::marketplace::domain::ListingStatus;

#[test]
fn pending_listing_can_be_approved_or_removed() {
    assert_eq!(
        ListingStatus::Pending.apply(AdminAction::Approve),
        Ok(Transition::Approved)
    );
    assert_eq!(
        ListingStatus::Pending.apply(AdminAction::Reject),
        Ok(Transition::Deleted)
    );
    assert_eq!(
        ListingStatus::Pending.apply(AdminAction::Remove),
        Ok(Transition::Deleted)
    );
}

#[test]
fn approved_listing_only_leaves_by_removal() {
    assert_eq!(
        ListingStatus::Approved.apply(AdminAction::Approve),
        Ok(Transition::Unchanged)
    );
    assert_eq!(
        ListingStatus::Approved.apply(AdminAction::Reject),
        Err(TransitionError::RejectApproved)
    );
    assert_eq!(
        ListingStatus::Approved.apply(AdminAction::Remove),
        Ok(Transition::Deleted)
    );
}

#[test]
fn status_parses_case_insensitively() {
    assert_eq!(ListingStatus::parse(" Approved "), Some(ListingStatus::Approved));
    assert_eq!(ListingStatus::parse("PENDING"), Some(ListingStatus::Pending));
    assert_eq!(ListingStatus::parse("archived"), None);
    assert_eq!(ListingStatus::default(), ListingStatus::Pending);
}
