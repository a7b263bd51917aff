//! treewatch DOM
//!
//! Arena-backed host tree for the change-projection engine.
//! Nodes are identified by dense `NodeId` handles; auxiliary per-node
//! data lives in identity-keyed [`NodeMap`]s, never on the nodes
//! themselves.

mod node;
mod node_map;
mod observer;
mod record;
mod tree;

pub use node::{ElementData, Node, NodeData};
pub use node_map::NodeMap;
pub use observer::TreeObserver;
pub use record::{MutationRecord, MutationType};
pub use tree::{Children, DomError, DomResult, DomTree};

/// Node identifier (index into the tree arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot for this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
