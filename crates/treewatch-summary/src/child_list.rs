//! Per-parent child-order state, reconstructed from the batch.

use treewatch_dom::{NodeId, NodeMap};

/// What happened inside one parent's child list during the batch.
///
/// `maybe_moved` holds nodes that were both removed from and re-added to
/// this parent's list: candidates for reorder-vs-untouched
/// classification. `old_previous` is first-seen-wins; an inner `None`
/// means "was the first child". `moved` is filled lazily by the move
/// detector on first query.
#[derive(Debug, Default)]
pub struct ChildListChange {
    pub added: NodeMap<bool>,
    pub removed: NodeMap<bool>,
    pub maybe_moved: NodeMap<bool>,
    pub old_previous: NodeMap<Option<NodeId>>,
    pub moved: Option<NodeMap<bool>>,
}
