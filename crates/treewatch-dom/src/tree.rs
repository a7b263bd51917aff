//! Arena-based tree with DOM-style structural operations.
//!
//! The document root occupies arena slot 0. Structural mutators keep the
//! sibling links consistent; all of them reject edits that would detach
//! the root or create a cycle.

use crate::node::{ElementData, Node, NodeData};
use crate::NodeId;

/// Result type for tree operations.
pub type DomResult<T> = Result<T, DomError>;

/// Tree operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node not found")]
    NotFound,
    #[error("hierarchy request error")]
    HierarchyRequest,
    #[error("node is not a child of the given parent")]
    NotAChild,
    #[error("operation is invalid for this node type")]
    InvalidNodeType,
}

/// Arena-based tree.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Creates a tree holding only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Creates a detached HTML element (case-insensitive names).
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(name, true)))
    }

    /// Creates a detached foreign (SVG-like) element with case-sensitive
    /// names.
    pub fn create_foreign_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(name, false)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Creates a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    // --- structural queries -------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.first_child)
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.last_child)
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.prev_sibling)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.next_sibling)
    }

    /// Iterates over the children of `node` in order.
    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }

    /// True if `node` is `ancestor` or lies in its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// True for HTML elements whose names compare case-insensitively.
    pub fn is_case_insensitive(&self, node: NodeId) -> bool {
        self.get(node)
            .and_then(Node::as_element)
            .is_some_and(|el| el.case_insensitive_names)
    }

    pub fn element_name(&self, node: NodeId) -> Option<&str> {
        self.get(node).and_then(Node::as_element).map(|el| el.name.as_str())
    }

    // --- structural mutators ------------------------------------------

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound)?;
        if !matches!(parent_node.data, NodeData::Document | NodeData::Element(_)) {
            return Err(DomError::InvalidNodeType);
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if child == self.root() || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Appends `child` to the end of `parent`'s child list, detaching it
    /// from its current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// A node inserted before itself keeps its position.
    pub(crate) fn resolve_ref_child(
        &self,
        child: NodeId,
        ref_child: Option<NodeId>,
    ) -> Option<NodeId> {
        if ref_child == Some(child) {
            self.next_sibling(child)
        } else {
            ref_child
        }
    }

    /// Full validation for `insert_before`, without mutating anything.
    pub(crate) fn check_insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insertion(parent, child)?;
        if let Some(r) = ref_child {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        Ok(())
    }

    /// Inserts `child` before `ref_child` (or at the end when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<()> {
        let ref_child = self.resolve_ref_child(child, ref_child);
        self.check_insert_before(parent, child, ref_child)?;
        self.detach(child);

        let prev = match ref_child {
            Some(r) => self.prev_sibling(r),
            None => self.last_child(parent),
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = ref_child;
        }
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        match ref_child {
            Some(r) => self.nodes[r.index()].prev_sibling = Some(child),
            None => self.nodes[parent.index()].last_child = Some(child),
        }
        Ok(())
    }

    /// Removes `child` from `parent`, leaving it detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let prev = self.prev_sibling(node);
        let next = self.next_sibling(node);
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }
        let n = &mut self.nodes[node.index()];
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    // --- attributes and character data --------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).and_then(Node::as_element)?.attribute(name)
    }

    /// Sets an attribute, returning the prior value (`None` if absent).
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> DomResult<Option<String>> {
        let el = self
            .get_mut(node)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(el.set_attribute(name, value))
    }

    /// Removes an attribute, returning the prior value (`None` if absent).
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        let el = self
            .get_mut(node)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(el.remove_attribute(name))
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Replaces the character data of a text or comment node, returning
    /// the prior value.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<String> {
        match &mut self.get_mut(node).ok_or(DomError::NotFound)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => {
                Ok(std::mem::replace(t, text.to_string()))
            }
            _ => Err(DomError::InvalidNodeType),
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's children.
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.next_sibling(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_link_children() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let text = tree.create_text("hi");

        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, span).unwrap();
        tree.append_child(span, text).unwrap();

        assert_eq!(tree.parent(div), Some(tree.root()));
        assert_eq!(tree.first_child(div), Some(span));
        assert_eq!(tree.children(div).collect::<Vec<_>>(), vec![span]);
        assert!(tree.contains(tree.root(), text));
    }

    #[test]
    fn insert_before_maintains_sibling_order() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), c).unwrap();
        tree.insert_before(tree.root(), b, Some(c)).unwrap();

        let order: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.next_sibling(b), Some(c));
    }

    #[test]
    fn reinsert_moves_node() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), b).unwrap();

        // Append an already-attached node: it moves.
        tree.append_child(tree.root(), a).unwrap();
        let order: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn remove_child_detaches() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        tree.append_child(tree.root(), a).unwrap();
        tree.remove_child(tree.root(), a).unwrap();
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.first_child(tree.root()), None);
        assert_eq!(tree.remove_child(tree.root(), a), Err(DomError::NotAChild));
    }

    #[test]
    fn cycle_insertion_rejected() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(a, b).unwrap();
        assert_eq!(tree.append_child(b, a), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn html_attribute_names_fold_case() {
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let svg = tree.create_foreign_element("Svg");

        assert_eq!(tree.element_name(div), Some("div"));
        assert_eq!(tree.element_name(svg), Some("Svg"));

        tree.set_attribute(div, "FOO", "1").unwrap();
        assert_eq!(tree.attribute(div, "foo"), Some("1"));

        tree.set_attribute(svg, "FOO", "1").unwrap();
        assert_eq!(tree.attribute(svg, "foo"), None);
        assert_eq!(tree.attribute(svg, "FOO"), Some("1"));
    }
}
