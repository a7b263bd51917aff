//! The consumer-facing result of projecting one batch.

use std::collections::HashMap;

use treewatch_dom::NodeId;

/// What a consumer wants reported, beyond the always-on added/removed
/// sets.
#[derive(Debug, Clone, Default)]
pub struct SummaryRequest {
    pub reparented: bool,
    pub reordered: bool,
    pub attributes: bool,
    /// Restrict attribute reporting to these names. Each requested name
    /// gets an entry in the result even when no node changed it.
    pub attribute_filter: Option<Vec<String>>,
    pub character_data: bool,
}

impl SummaryRequest {
    /// Everything on, no attribute filter.
    pub fn all() -> Self {
        Self {
            reparented: true,
            reordered: true,
            attributes: true,
            attribute_filter: None,
            character_data: true,
        }
    }
}

/// Net effect of one mutation batch, relative to the observed root and
/// the active matchers.
///
/// Optional sections are `Some` exactly when the request asked for them.
#[derive(Debug, Default)]
pub struct Summary {
    /// Nodes that entered the observed matched set.
    pub added: Vec<NodeId>,
    /// Nodes that left the observed matched set.
    pub removed: Vec<NodeId>,
    /// Still-observed nodes whose parent changed.
    pub reparented: Option<Vec<NodeId>>,
    /// Still-observed nodes whose position among surviving siblings
    /// changed without a parent change.
    pub reordered: Option<Vec<NodeId>>,
    /// Still-observed nodes with a net attribute value change, grouped
    /// by attribute name.
    pub attribute_changed: Option<HashMap<String, Vec<NodeId>>>,
    /// Still-observed nodes with a net character data change.
    pub character_data_changed: Option<Vec<NodeId>>,
}

impl Summary {
    pub(crate) fn for_request(request: &SummaryRequest) -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            reparented: request.reparented.then(Vec::new),
            reordered: request.reordered.then(Vec::new),
            attribute_changed: None,
            character_data_changed: None,
        }
    }

    /// True when the batch had no net observable effect.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.reparented.as_ref().is_none_or(Vec::is_empty)
            && self.reordered.as_ref().is_none_or(Vec::is_empty)
            && self
                .attribute_changed
                .as_ref()
                .is_none_or(|m| m.values().all(Vec::is_empty))
            && self
                .character_data_changed
                .as_ref()
                .is_none_or(Vec::is_empty)
    }
}
