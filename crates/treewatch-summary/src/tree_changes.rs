//! Change log: the fold of a mutation batch, plus reachability.
//!
//! Built once per batch. Reachability in the current and the
//! reconstructed prior tree is memoized per node; the prior-state parent
//! of a node follows the three-way rule in [`NodeChange::old_parent`].

use treewatch_dom::{DomTree, MutationRecord, MutationType, NodeId, NodeMap};

use crate::movement::Movement;
use crate::node_change::NodeChange;

/// Per-node change records for one batch, keyed by node identity.
#[derive(Debug)]
pub struct TreeChanges {
    root: NodeId,
    changes: NodeMap<NodeChange>,
    pub any_parents_changed: bool,
    pub any_attributes_changed: bool,
    pub any_character_data_changed: bool,
    reachable_cache: NodeMap<bool>,
    was_reachable_cache: NodeMap<bool>,
}

impl TreeChanges {
    /// Folds the ordered record list. Strictly sequential: the
    /// first-seen-wins fields depend on delivery order.
    pub fn new(tree: &DomTree, root: NodeId, records: &[MutationRecord]) -> Self {
        let mut this = Self {
            root,
            changes: NodeMap::new(),
            any_parents_changed: false,
            any_attributes_changed: false,
            any_character_data_changed: false,
            reachable_cache: NodeMap::new(),
            was_reachable_cache: NodeMap::new(),
        };

        for record in records {
            match record.mutation_type {
                MutationType::ChildList => {
                    this.any_parents_changed = true;
                    for &node in &record.removed_nodes {
                        this.change_mut(tree, node).removed_from_parent(record.target);
                    }
                    for &node in &record.added_nodes {
                        this.change_mut(tree, node).inserted_into_parent();
                    }
                }
                MutationType::Attributes => {
                    if let Some(name) = &record.attribute_name {
                        this.any_attributes_changed = true;
                        this.change_mut(tree, record.target)
                            .attribute_mutated(name, record.old_value.clone());
                    }
                }
                MutationType::CharacterData => {
                    this.any_character_data_changed = true;
                    this.change_mut(tree, record.target)
                        .character_data_mutated(record.old_value.clone());
                }
            }
        }

        tracing::debug!(
            records = records.len(),
            touched = this.changes.keys().len(),
            "folded mutation batch"
        );
        this
    }

    fn change_mut(&mut self, tree: &DomTree, node: NodeId) -> &mut NodeChange {
        self.changes
            .get_or_insert_with(node, || NodeChange::new(tree, node))
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeChange> {
        self.changes.get(node)
    }

    /// Every node touched by the batch, in id order.
    pub fn keys(&self) -> Vec<NodeId> {
        self.changes.keys()
    }

    /// Prior-state parent: recorded old parent, `None` for fresh
    /// inserts, present parent for untouched links.
    pub fn old_parent(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        match self.changes.get(node) {
            Some(change) => change.old_parent(tree),
            None => tree.parent(node),
        }
    }

    /// Is `node` connected to the observed root right now?
    pub fn is_reachable(&mut self, tree: &DomTree, node: NodeId) -> bool {
        if node == self.root {
            return true;
        }
        if let Some(&cached) = self.reachable_cache.get(node) {
            return cached;
        }
        let reachable = match tree.parent(node) {
            Some(parent) => self.is_reachable(tree, parent),
            None => false,
        };
        self.reachable_cache.set(node, reachable);
        reachable
    }

    /// Was `node` connected to the observed root before the batch?
    /// A node was reachable iff its old parent was reachable.
    pub fn was_reachable(&mut self, tree: &DomTree, node: NodeId) -> bool {
        if node == self.root {
            return true;
        }
        if let Some(&cached) = self.was_reachable_cache.get(node) {
            return cached;
        }
        let reachable = match self.old_parent(tree, node) {
            Some(parent) => self.was_reachable(tree, parent),
            None => false,
        };
        self.was_reachable_cache.set(node, reachable);
        reachable
    }

    pub fn reachability_change(&mut self, tree: &DomTree, node: NodeId) -> Movement {
        match (self.was_reachable(tree, node), self.is_reachable(tree, node)) {
            (true, true) => Movement::StayedIn,
            (false, true) => Movement::Entered,
            (true, false) => Movement::Exited,
            (false, false) => Movement::StayedOut,
        }
    }
}
