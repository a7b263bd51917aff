//! Query precondition violations.
//!
//! All of these are programmer-error class failures (the query API was
//! used against a node in the wrong category). They are reported
//! synchronously at the query call and are deterministic for a given
//! batch and node.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The node has no prior parent (it did not exist before the batch).
    #[error("old parent requested on an invalid node")]
    InvalidOldParentQuery,
    /// The node is outside removed/reparented/reordered, or old-sibling
    /// tracking was not requested for the batch.
    #[error("old previous sibling requested on an invalid node")]
    InvalidOldSiblingQuery,
    /// The node had no attribute change, or the given attribute name was
    /// untouched.
    #[error("old attribute value requested for an unchanged attribute")]
    InvalidOldAttributeQuery,
    /// The node had no character data change.
    #[error("old character data requested on an invalid node")]
    InvalidOldTextQuery,
}
