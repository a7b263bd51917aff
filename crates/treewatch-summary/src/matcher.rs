//! Interest predicates and their tri-state transitions.

use treewatch_dom::{DomTree, Node, NodeId};

use crate::movement::Movement;
use crate::node_change::NodeChange;

/// An interest predicate over nodes.
///
/// Implementations report how a node's membership in the predicate's
/// match set changed across the batch: one of `StayedOut`, `Entered`,
/// `StayedIn`, `Exited` (never the reachability-only refinements
/// `Reparented`/`Reordered`). The "before" side must be reconstructed
/// from the node's change record, since the prior attribute values are
/// no longer observable on the tree.
pub trait Matcher {
    fn matchability_change(
        &self,
        tree: &DomTree,
        node: NodeId,
        change: Option<&NodeChange>,
    ) -> Movement;
}

/// One attribute condition on an [`ElementMatcher`].
#[derive(Debug, Clone)]
pub struct AttributeQualifier {
    pub name: String,
    /// Required value; `None` means the attribute only has to exist.
    pub value: Option<String>,
    /// Match any whitespace-separated token instead of the whole value.
    pub contains: bool,
}

impl AttributeQualifier {
    /// Does a (current or reconstructed-old) attribute value satisfy
    /// this qualifier? An absent attribute never matches.
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some(want) = &self.value else {
            return true;
        };
        if !self.contains {
            return want == value;
        }
        value.split(' ').any(|token| token == want)
    }
}

/// Tag-plus-qualifiers predicate, built programmatically.
///
/// This is the concrete form of the opaque matcher capability: selector
/// grammar parsing is not this crate's concern.
#[derive(Debug, Clone, Default)]
pub struct ElementMatcher {
    /// Required tag name; `None` matches any element.
    pub tag: Option<String>,
    pub qualifiers: Vec<AttributeQualifier>,
}

impl ElementMatcher {
    /// Matches every element.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(name: &str) -> Self {
        Self {
            tag: Some(name.to_string()),
            qualifiers: Vec::new(),
        }
    }

    /// Requires the attribute to be present, any value.
    pub fn with_attribute(mut self, name: &str) -> Self {
        self.qualifiers.push(AttributeQualifier {
            name: name.to_string(),
            value: None,
            contains: false,
        });
        self
    }

    /// Requires the attribute to equal `value`.
    pub fn with_attribute_value(mut self, name: &str, value: &str) -> Self {
        self.qualifiers.push(AttributeQualifier {
            name: name.to_string(),
            value: Some(value.to_string()),
            contains: false,
        });
        self
    }

    /// Requires `value` to appear as a whitespace-separated token, the
    /// `~=` / class-name style of matching.
    pub fn with_attribute_token(mut self, name: &str, value: &str) -> Self {
        self.qualifiers.push(AttributeQualifier {
            name: name.to_string(),
            value: Some(value.to_string()),
            contains: true,
        });
        self
    }

    fn tag_matches(&self, name: &str, case_insensitive: bool) -> bool {
        match &self.tag {
            Some(tag) if case_insensitive => tag.eq_ignore_ascii_case(name),
            Some(tag) => tag == name,
            None => true,
        }
    }

    fn is_matching(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(el) = tree.get(node).and_then(Node::as_element) else {
            return false;
        };
        if !self.tag_matches(&el.name, el.case_insensitive_names) {
            return false;
        }
        self.qualifiers
            .iter()
            .all(|q| q.matches(el.attribute(&q.name)))
    }

    fn was_matching(
        &self,
        tree: &DomTree,
        node: NodeId,
        change: Option<&NodeChange>,
        is_matching: bool,
    ) -> bool {
        // Without attribute changes the match status cannot have moved.
        let Some(change) = change.filter(|c| c.attributes) else {
            return is_matching;
        };
        let Some(el) = tree.get(node).and_then(Node::as_element) else {
            return false;
        };
        if !self.tag_matches(&el.name, el.case_insensitive_names) {
            return false;
        }

        let old_values: Vec<Option<&Option<String>>> = self
            .qualifiers
            .iter()
            .map(|q| change.attribute_old_value(&q.name))
            .collect();
        if old_values.iter().all(Option::is_none) {
            return is_matching;
        }

        for (qualifier, old) in self.qualifiers.iter().zip(&old_values) {
            let value = match old {
                // Touched in this batch: the first-seen old value, which
                // may be `None` for "was absent".
                Some(recorded) => recorded.as_deref(),
                // Untouched: the present value is also the old value.
                None => el.attribute(&qualifier.name),
            };
            if !qualifier.matches(value) {
                return false;
            }
        }
        true
    }
}

impl Matcher for ElementMatcher {
    fn matchability_change(
        &self,
        tree: &DomTree,
        node: NodeId,
        change: Option<&NodeChange>,
    ) -> Movement {
        let is_matching = self.is_matching(tree, node);
        let was_matching = self.was_matching(tree, node, change, is_matching);
        match (was_matching, is_matching) {
            (true, true) => Movement::StayedIn,
            (false, true) => Movement::Entered,
            (true, false) => Movement::Exited,
            (false, false) => Movement::StayedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treewatch_dom::DomTree;

    #[test]
    fn qualifier_token_matching() {
        let q = AttributeQualifier {
            name: "class".into(),
            value: Some("foo".into()),
            contains: true,
        };
        assert!(q.matches(Some("bar foo baz")));
        assert!(!q.matches(Some("foobaz")));
        assert!(!q.matches(None));
    }

    #[test]
    fn tag_compare_respects_case_rules() {
        let mut tree = DomTree::new();
        let html = tree.create_element("div");
        let svg = tree.create_foreign_element("Div");
        tree.append_child(tree.root(), html).unwrap();
        tree.append_child(tree.root(), svg).unwrap();

        let m = ElementMatcher::tag("DIV");
        assert!(m.is_matching(&tree, html));
        assert!(!m.is_matching(&tree, svg));
    }

    #[test]
    fn attribute_flip_enters_and_exits() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        tree.set_attribute(div, "foo", "1").unwrap();

        let matcher = ElementMatcher::any().with_attribute("foo");

        // Gained the attribute during the batch: Entered.
        let mut change = NodeChange::new(&tree, div);
        change.attribute_mutated("foo", None);
        assert_eq!(
            matcher.matchability_change(&tree, div, Some(&change)),
            Movement::Entered
        );

        // Value changed but attribute present throughout: StayedIn.
        let mut change = NodeChange::new(&tree, div);
        change.attribute_mutated("foo", Some("0".into()));
        assert_eq!(
            matcher.matchability_change(&tree, div, Some(&change)),
            Movement::StayedIn
        );
    }

    #[test]
    fn non_element_never_matches() {
        let mut tree = DomTree::new();
        let text = tree.create_text("hi");
        tree.append_child(tree.root(), text).unwrap();
        let m = ElementMatcher::any();
        assert_eq!(
            m.matchability_change(&tree, text, None),
            Movement::StayedOut
        );
    }
}
