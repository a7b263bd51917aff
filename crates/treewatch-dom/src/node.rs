//! Node storage: link fields plus node-specific data.

use crate::NodeId;

/// A single node in the arena tree.
#[derive(Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Text and comment nodes carry character data.
    pub fn is_character_data(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::Comment(_))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Node-specific payload.
#[derive(Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Element name and attributes.
#[derive(Debug)]
pub struct ElementData {
    pub name: String,
    /// Attribute name/value pairs in set order.
    pub attributes: Vec<(String, String)>,
    /// True for HTML elements in an HTML document, where attribute and
    /// tag names compare case-insensitively.
    pub case_insensitive_names: bool,
}

impl ElementData {
    pub(crate) fn new(name: &str, case_insensitive_names: bool) -> Self {
        let name = if case_insensitive_names {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        Self {
            name,
            attributes: Vec::new(),
            case_insensitive_names,
        }
    }

    /// Canonical form of an attribute name for this element.
    pub fn fold_name(&self, name: &str) -> String {
        if self.case_insensitive_names {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = self.fold_name(name);
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, returning the prior value if one existed.
    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        let name = self.fold_name(name);
        for (n, v) in &mut self.attributes {
            if *n == name {
                return Some(std::mem::replace(v, value.to_string()));
            }
        }
        self.attributes.push((name, value.to_string()));
        None
    }

    /// Removes an attribute, returning the prior value if one existed.
    pub(crate) fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let name = self.fold_name(name);
        let pos = self.attributes.iter().position(|(n, _)| *n == name)?;
        Some(self.attributes.remove(pos).1)
    }
}
