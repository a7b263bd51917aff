//! Per-node change record.
//!
//! Accumulates every way a single node was touched during a batch.
//! Old-value fields are first-seen-wins: only the earliest recorded
//! value survives, because later records' "old" values are not the
//! value from before the batch began.

use std::collections::HashMap;

use treewatch_dom::{DomTree, NodeId};

/// Everything the batch did to one node.
#[derive(Debug)]
pub struct NodeChange {
    pub node: NodeId,
    /// The node was removed from or added to some child list.
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    /// Parent the node was first removed from, if any.
    pub old_parent: Option<NodeId>,
    /// The node was inserted without a prior removal ("fresh" insert).
    pub added: bool,
    /// First-seen old value per attribute name. An inner `None` means
    /// the attribute was absent before the batch; a missing key means
    /// the attribute was never touched. The two must stay distinct.
    attribute_old_values: Option<HashMap<String, Option<String>>>,
    pub character_data_old_value: Option<String>,
    /// Attribute names on this node compare case-insensitively.
    pub case_insensitive: bool,
}

impl NodeChange {
    pub fn new(tree: &DomTree, node: NodeId) -> Self {
        Self {
            node,
            child_list: false,
            attributes: false,
            character_data: false,
            old_parent: None,
            added: false,
            attribute_old_values: None,
            character_data_old_value: None,
            case_insensitive: tree.is_case_insensitive(node),
        }
    }

    pub(crate) fn attribute_mutated(&mut self, name: &str, old_value: Option<String>) {
        self.attributes = true;
        let values = self.attribute_old_values.get_or_insert_with(HashMap::new);
        // First-seen-wins.
        values.entry(name.to_string()).or_insert(old_value);
    }

    pub(crate) fn character_data_mutated(&mut self, old_value: Option<String>) {
        if self.character_data {
            return;
        }
        self.character_data = true;
        self.character_data_old_value = old_value;
    }

    // A removal can follow a removal: the node is re-added to an
    // unobserved parent, that parent enters the observed area, and the
    // node is removed from it again. Only the first removal carries the
    // pre-batch parent.
    pub(crate) fn removed_from_parent(&mut self, parent: NodeId) {
        self.child_list = true;
        if self.added || self.old_parent.is_some() {
            self.added = false;
        } else {
            self.old_parent = Some(parent);
        }
    }

    pub(crate) fn inserted_into_parent(&mut self) {
        self.child_list = true;
        self.added = true;
    }

    /// The node's parent before the batch:
    /// - the parent it was first removed from, if it was removed;
    /// - `None` if the first thing that happened to it was an insert;
    /// - its present parent otherwise.
    pub fn old_parent(&self, tree: &DomTree) -> Option<NodeId> {
        if self.child_list {
            if self.old_parent.is_some() {
                return self.old_parent;
            }
            if self.added {
                return None;
            }
        }
        tree.parent(self.node)
    }

    /// First-seen old value for `name`. Outer `None` means the
    /// attribute was never touched in this batch.
    pub fn attribute_old_value(&self, name: &str) -> Option<&Option<String>> {
        let values = self.attribute_old_values.as_ref()?;
        if self.case_insensitive {
            values.get(&name.to_ascii_lowercase())
        } else {
            values.get(name)
        }
    }

    /// Names of every attribute touched in this batch.
    pub fn attribute_names_mutated(&self) -> Vec<&str> {
        match &self.attribute_old_values {
            Some(values) => values.keys().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_old_value_wins() {
        let tree = DomTree::new();
        let mut change = NodeChange::new(&tree, tree.root());
        change.attribute_mutated("foo", Some("1".into()));
        change.attribute_mutated("foo", Some("2".into()));
        assert_eq!(
            change.attribute_old_value("foo"),
            Some(&Some("1".to_string()))
        );
    }

    #[test]
    fn second_removal_clears_added_without_touching_old_parent() {
        let mut tree = DomTree::new();
        let p1 = tree.create_element("p1");
        let p2 = tree.create_element("p2");
        let node = tree.create_element("node");

        let mut change = NodeChange::new(&tree, node);
        change.removed_from_parent(p1);
        change.inserted_into_parent();
        change.removed_from_parent(p2);

        assert!(!change.added);
        assert_eq!(change.old_parent, Some(p1));
    }

    #[test]
    fn fresh_insert_has_no_old_parent() {
        let mut tree = DomTree::new();
        let node = tree.create_element("node");
        tree.append_child(tree.root(), node).unwrap();

        let mut change = NodeChange::new(&tree, node);
        change.inserted_into_parent();
        assert_eq!(change.old_parent(&tree), None);
    }

    #[test]
    fn untouched_parent_link_keeps_present_parent() {
        let mut tree = DomTree::new();
        let node = tree.create_element("node");
        tree.append_child(tree.root(), node).unwrap();

        let mut change = NodeChange::new(&tree, node);
        change.attribute_mutated("foo", None);
        assert_eq!(change.old_parent(&tree), Some(tree.root()));
    }
}
