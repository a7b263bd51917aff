//! treewatch summary
//!
//! Computes the net effect of an ordered batch of tree mutation records
//! relative to an observed root: which nodes entered or exited the
//! observed subtree, which stayed but changed parent or sibling order,
//! and which had attribute or character data changes. Prior-state facts
//! (old parent, old previous sibling, old values) are reconstructed from
//! the mutation log alone; no snapshot of the previous tree is retained.
//!
//! The entire projection for a batch is computed eagerly inside
//! [`MutationProjection::new`]; all caches are batch-scoped.

mod child_list;
mod error;
mod matcher;
mod movement;
mod node_change;
mod projection;
mod summary;
mod tree_changes;

pub use child_list::ChildListChange;
pub use error::QueryError;
pub use matcher::{AttributeQualifier, ElementMatcher, Matcher};
pub use movement::Movement;
pub use node_change::NodeChange;
pub use projection::{MutationProjection, ProjectionOptions};
pub use summary::{Summary, SummaryRequest};
pub use tree_changes::TreeChanges;
