//! Membership-transition classification.

/// How a node's membership in the observed set changed across a batch.
///
/// `Reparented` and `Reordered` are refinements of `StayedIn`: a node is
/// classified as one of the three only when it was reachable both before
/// and after the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    StayedOut,
    Entered,
    StayedIn,
    Reparented,
    Reordered,
    Exited,
}
