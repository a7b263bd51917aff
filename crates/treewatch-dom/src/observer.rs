//! Recording edit seam.
//!
//! `TreeObserver` routes edits through the tree and captures one
//! [`MutationRecord`] per operation, with the sibling context taken at
//! the moment of the edit. Moving an attached node produces two records
//! (a removal from the old parent, then the insertion), matching how the
//! host observation mechanism reports moves.

use crate::record::{MutationRecord, MutationType};
use crate::tree::{DomResult, DomTree};
use crate::NodeId;

/// Applies edits to a tree while logging mutation records.
#[derive(Debug)]
pub struct TreeObserver<'a> {
    tree: &'a mut DomTree,
    records: Vec<MutationRecord>,
}

impl<'a> TreeObserver<'a> {
    pub fn new(tree: &'a mut DomTree) -> Self {
        Self {
            tree,
            records: Vec::new(),
        }
    }

    pub fn tree(&self) -> &DomTree {
        self.tree
    }

    /// Drains the records accumulated so far, in delivery order.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn record_detach(&mut self, child: NodeId) -> DomResult<()> {
        let Some(old_parent) = self.tree.parent(child) else {
            return Ok(());
        };
        let prev = self.tree.prev_sibling(child);
        let next = self.tree.next_sibling(child);
        self.tree.remove_child(old_parent, child)?;
        self.records.push(MutationRecord::child_list(
            old_parent,
            Vec::new(),
            vec![child],
            prev,
            next,
        ));
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<()> {
        // Validate up front: a rejected edit must leave neither a
        // detached child nor a stray removal record behind.
        let ref_child = self.tree.resolve_ref_child(child, ref_child);
        self.tree.check_insert_before(parent, child, ref_child)?;
        self.record_detach(child)?;
        let prev = match ref_child {
            Some(r) => self.tree.prev_sibling(r),
            None => self.tree.last_child(parent),
        };
        self.tree.insert_before(parent, child, ref_child)?;
        tracing::trace!(?parent, ?child, "insert");
        self.records.push(MutationRecord::child_list(
            parent,
            vec![child],
            Vec::new(),
            prev,
            ref_child,
        ));
        Ok(())
    }

    /// Inserts `child` just after `ref_child` (or first when `None`).
    pub fn insert_after(
        &mut self,
        parent: NodeId,
        child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<()> {
        let before = match ref_child {
            Some(r) => self.tree.next_sibling(r),
            None => self.tree.first_child(parent),
        };
        // The reference may be displaced by the implicit detach of
        // `child`; recompute against the post-detach sibling chain.
        let before = if before == Some(child) {
            self.tree.next_sibling(child)
        } else {
            before
        };
        self.insert_before(parent, child, before)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let prev = self.tree.prev_sibling(child);
        let next = self.tree.next_sibling(child);
        self.tree.remove_child(parent, child)?;
        tracing::trace!(?parent, ?child, "remove");
        self.records.push(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![child],
            prev,
            next,
        ));
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let old = self.tree.set_attribute(node, name, value)?;
        let name = self.folded_name(node, name);
        self.records
            .push(MutationRecord::attribute(node, &name, old));
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        let old = self.tree.remove_attribute(node, name)?;
        // An absent attribute is not a mutation.
        if let Some(old) = old {
            let name = self.folded_name(node, name);
            self.records
                .push(MutationRecord::attribute(node, &name, Some(old)));
        }
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        let old = self.tree.set_text(node, text)?;
        self.records.push(MutationRecord::character_data(node, old));
        Ok(())
    }

    fn folded_name(&self, node: NodeId, name: &str) -> String {
        if self.tree.is_case_insensitive(node) {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }
}
