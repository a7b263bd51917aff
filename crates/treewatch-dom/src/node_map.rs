//! Identity-keyed associative storage.
//!
//! `NodeId`s are dense arena indices, so a map from node to value is a
//! plain vector of options. `keys` iterates in ascending id order, which
//! makes every consumer of the map deterministic.

use crate::NodeId;

/// Maps nodes to arbitrary values without touching the host tree.
#[derive(Debug)]
pub struct NodeMap<T> {
    values: Vec<Option<T>>,
}

impl<T> NodeMap<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn set(&mut self, node: NodeId, value: T) {
        let idx = node.index();
        if idx >= self.values.len() {
            self.values.resize_with(idx + 1, || None);
        }
        self.values[idx] = Some(value);
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.values.get(node.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        self.values.get_mut(node.index()).and_then(Option::as_mut)
    }

    /// Returns the value for `node`, inserting one first if absent.
    pub fn get_or_insert_with(&mut self, node: NodeId, f: impl FnOnce() -> T) -> &mut T {
        let idx = node.index();
        if idx >= self.values.len() {
            self.values.resize_with(idx + 1, || None);
        }
        self.values[idx].get_or_insert_with(f)
    }

    pub fn has(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    pub fn remove(&mut self, node: NodeId) -> Option<T> {
        self.values.get_mut(node.index()).and_then(Option::take)
    }

    /// Nodes present in the map, in ascending id order.
    pub fn keys(&self) -> Vec<NodeId> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|_| NodeId(i as u32)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

impl<T> Default for NodeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
