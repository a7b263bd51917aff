//! Projection engine: classifies every affected node for one batch.
//!
//! Seeds a traversal from the change log's touched-node set, classifies
//! each node's reachability transition, refines `StayedIn` nodes into
//! reparented/reordered, and answers old-state queries. Child-order
//! reconstruction and move detection run lazily, only when a consumer
//! needs old-sibling or reorder information.

use std::collections::{HashMap, HashSet};

use treewatch_dom::{
    DomTree, MutationRecord, MutationType, Node, NodeId, NodeMap,
};

use crate::child_list::ChildListChange;
use crate::error::QueryError;
use crate::matcher::Matcher;
use crate::movement::Movement;
use crate::summary::{Summary, SummaryRequest};
use crate::tree_changes::TreeChanges;

/// Per-batch projection settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionOptions {
    /// Classify same-parent position changes as `Reordered`.
    pub calc_reordered: bool,
    /// Record old previous siblings for removed/reparented nodes so
    /// they can be queried after the fact.
    pub calc_old_previous_sibling: bool,
    /// Match only text/comment nodes instead of running matchers.
    pub character_data_only: bool,
}

/// The computed net effect of one mutation batch.
///
/// Construction runs the whole projection eagerly; queries afterwards
/// only read (and lazily extend) batch-scoped caches.
pub struct MutationProjection<'a> {
    tree: &'a DomTree,
    mutations: &'a [MutationRecord],
    matchers: Option<&'a [Box<dyn Matcher>]>,
    options: ProjectionOptions,
    tree_changes: TreeChanges,
    entered: Vec<NodeId>,
    exited: Vec<NodeId>,
    stayed_in: NodeMap<Movement>,
    visited: NodeMap<bool>,
    child_list_change_map: Option<NodeMap<ChildListChange>>,
    match_cache: Vec<NodeMap<Movement>>,
}

impl<'a> MutationProjection<'a> {
    pub fn new(
        tree: &'a DomTree,
        root: NodeId,
        mutations: &'a [MutationRecord],
        matchers: Option<&'a [Box<dyn Matcher>]>,
        options: ProjectionOptions,
    ) -> Self {
        let tree_changes = TreeChanges::new(tree, root, mutations);
        let matcher_count = matchers.map_or(0, <[_]>::len);
        let mut this = Self {
            tree,
            mutations,
            matchers,
            options,
            tree_changes,
            entered: Vec::new(),
            exited: Vec::new(),
            stayed_in: NodeMap::new(),
            visited: NodeMap::new(),
            child_list_change_map: None,
            match_cache: (0..matcher_count).map(|_| NodeMap::new()).collect(),
        };
        this.process_mutations();
        this
    }

    fn process_mutations(&mut self) {
        if !self.tree_changes.any_parents_changed && !self.tree_changes.any_attributes_changed {
            return;
        }
        for node in self.tree_changes.keys() {
            self.visit_node(node, None);
        }
        tracing::debug!(
            entered = self.entered.len(),
            exited = self.exited.len(),
            stayed_in = self.stayed_in.keys().len(),
            "projected batch"
        );
    }

    fn visit_node(&mut self, node: NodeId, parent_reachable: Option<Movement>) {
        if self.visited.has(node) {
            return;
        }
        self.visited.set(node, true);

        let (child_list, old_parent) = match self.tree_changes.get(node) {
            Some(change) => (change.child_list, change.old_parent(self.tree)),
            None => (false, None),
        };

        // A node inherits its parent's reachability change unless its
        // own parent link was mutated.
        let reachable = match parent_reachable {
            Some(movement) if !child_list => movement,
            _ => self.tree_changes.reachability_change(self.tree, node),
        };

        if reachable == Movement::StayedOut {
            return;
        }

        // Warm the match caches while the node is in hand.
        self.matchability_change(node);

        match reachable {
            Movement::Entered => self.entered.push(node),
            Movement::Exited => {
                self.exited.push(node);
                self.ensure_old_previous_sibling_if_needed(node);
            }
            Movement::StayedIn => {
                let mut movement = Movement::StayedIn;
                if child_list {
                    if old_parent != self.tree.parent(node) {
                        movement = Movement::Reparented;
                        self.ensure_old_previous_sibling_if_needed(node);
                    } else if self.options.calc_reordered && self.was_reordered(node) {
                        movement = Movement::Reordered;
                    }
                }
                self.stayed_in.set(node, movement);
                return;
            }
            _ => {}
        }

        // Entered or exited: the whole subtree crosses the boundary.
        let mut child = self.tree.first_child(node);
        while let Some(c) = child {
            self.visit_node(c, Some(reachable));
            child = self.tree.next_sibling(c);
        }
    }

    fn ensure_old_previous_sibling_if_needed(&mut self, node: NodeId) {
        if !self.options.calc_old_previous_sibling {
            return;
        }
        self.process_child_list_changes();

        let parent = match self.tree_changes.get(node).and_then(|c| c.old_parent) {
            Some(p) => Some(p),
            None => self.tree.parent(node),
        };
        let Some(parent) = parent else {
            return;
        };
        let prev = self.tree.prev_sibling(node);

        let map = self.child_list_change_map.get_or_insert_with(NodeMap::new);
        let change = map.get_or_insert_with(parent, ChildListChange::default);
        if !change.old_previous.has(node) {
            change.old_previous.set(node, prev);
        }
    }

    /// Replays the childList records, building per-parent child-order
    /// state. Memoized for the batch; skipped entirely when nothing
    /// asks for old-sibling or reorder data.
    fn process_child_list_changes(&mut self) {
        if self.child_list_change_map.is_some() {
            return;
        }
        let mut map: NodeMap<ChildListChange> = NodeMap::new();
        let records = self.mutations;
        let tree = self.tree;

        for record in records {
            if record.mutation_type != MutationType::ChildList {
                continue;
            }
            if self.tree_changes.reachability_change(tree, record.target) != Movement::StayedIn
                && !self.options.calc_old_previous_sibling
            {
                continue;
            }
            let change = map.get_or_insert_with(record.target, ChildListChange::default);

            let mut old_previous = record.previous_sibling;
            for &node in &record.removed_nodes {
                record_old_previous(change, node, old_previous);

                if change.added.has(node) {
                    // Added and removed within the batch: ephemeral,
                    // not a net removal.
                    change.added.remove(node);
                } else {
                    change.removed.set(node, true);
                    change.maybe_moved.remove(node);
                }
                old_previous = Some(node);
            }
            if let Some(next) = record.next_sibling {
                record_old_previous(change, next, old_previous);
            }

            for &node in &record.added_nodes {
                if change.removed.has(node) {
                    change.removed.remove(node);
                    change.maybe_moved.set(node, true);
                } else {
                    change.added.set(node, true);
                }
            }
        }

        tracing::trace!(
            parents = map.keys().len(),
            "reconstructed child-order state"
        );
        self.child_list_change_map = Some(map);
    }

    /// Did `node`'s position among its stable siblings change?
    fn was_reordered(&mut self, node: NodeId) -> bool {
        if !self.tree_changes.any_parents_changed {
            return false;
        }
        self.process_child_list_changes();

        let parent = match self.tree_changes.get(node).and_then(|c| c.old_parent) {
            Some(p) => Some(p),
            None => self.tree.parent(node),
        };
        let Some(parent) = parent else {
            return false;
        };

        let tree = self.tree;
        let map = self.child_list_change_map.get_or_insert_with(NodeMap::new);
        let Some(change) = map.get_mut(parent) else {
            return false;
        };

        if change.moved.is_none() {
            let ChildListChange {
                added,
                removed,
                maybe_moved,
                old_previous,
                moved,
            } = change;
            let mut resolver = MoveResolver {
                tree,
                added,
                removed,
                maybe_moved,
                old_previous,
                moved: NodeMap::new(),
                pending: NodeMap::new(),
                previous_cache: NodeMap::new(),
                old_previous_cache: NodeMap::new(),
            };
            // Force every ambiguous node; memoization makes the order
            // irrelevant.
            for candidate in resolver.maybe_moved.keys() {
                resolver.is_moved(Some(candidate));
            }
            *moved = Some(resolver.moved);
        }

        change
            .moved
            .as_ref()
            .and_then(|m| m.get(node))
            .copied()
            .unwrap_or(false)
    }

    /// Aggregate matcher verdict for `node`, memoized per matcher.
    pub fn matchability_change(&mut self, node: NodeId) -> Movement {
        if self.options.character_data_only {
            return if self.tree.get(node).is_some_and(Node::is_character_data) {
                Movement::StayedIn
            } else {
                Movement::StayedOut
            };
        }

        // No element filter: include all nodes.
        let Some(matchers) = self.matchers else {
            return Movement::StayedIn;
        };
        if !self.tree.get(node).is_some_and(Node::is_element) {
            return Movement::StayedOut;
        }

        let verdicts: Vec<Movement> = (0..matchers.len())
            .map(|i| self.compute_matchability_change(i, node))
            .collect();

        // A node matching any predicate now and any predicate before
        // counts as "stayed interesting" even when the specific
        // predicate differs between before and after.
        let mut accum = Movement::StayedOut;
        for verdict in verdicts {
            if accum == Movement::StayedIn {
                break;
            }
            accum = match verdict {
                Movement::StayedIn => Movement::StayedIn,
                Movement::Entered if accum == Movement::Exited => Movement::StayedIn,
                Movement::Entered => Movement::Entered,
                Movement::Exited if accum == Movement::Entered => Movement::StayedIn,
                Movement::Exited => Movement::Exited,
                _ => accum,
            };
        }
        accum
    }

    fn compute_matchability_change(&mut self, index: usize, node: NodeId) -> Movement {
        if let Some(&cached) = self.match_cache[index].get(node) {
            return cached;
        }
        let matchers = self.matchers.unwrap_or(&[]);
        let result =
            matchers[index].matchability_change(self.tree, node, self.tree_changes.get(node));
        self.match_cache[index].set(node, result);
        result
    }

    /// Builds the externally visible summary for this batch.
    pub fn summarize(&mut self, request: &SummaryRequest) -> Summary {
        if request.reordered && !self.options.calc_reordered {
            tracing::debug!("reordered requested without reorder tracking; reporting none");
        }
        let mut summary = Summary::for_request(request);

        for node in self.entered.clone() {
            let matchable = self.matchability_change(node);
            if matchable == Movement::Entered || matchable == Movement::StayedIn {
                summary.added.push(node);
            }
        }

        for node in self.stayed_in.keys() {
            let matchable = self.matchability_change(node);
            match matchable {
                Movement::Entered => summary.added.push(node),
                Movement::Exited => summary.removed.push(node),
                Movement::StayedIn => {
                    let movement = self.stayed_in.get(node).copied();
                    if movement == Some(Movement::Reparented) {
                        if let Some(reparented) = &mut summary.reparented {
                            reparented.push(node);
                        }
                    } else if movement == Some(Movement::Reordered) {
                        if let Some(reordered) = &mut summary.reordered {
                            reordered.push(node);
                        }
                    }
                }
                _ => {}
            }
        }

        for node in self.exited.clone() {
            let matchable = self.matchability_change(node);
            if matchable == Movement::Exited || matchable == Movement::StayedIn {
                summary.removed.push(node);
            }
        }

        if request.attributes {
            let mut changed = self.attribute_changed_nodes(request.attribute_filter.as_deref());
            if let Some(filter) = &request.attribute_filter {
                for name in filter {
                    changed.entry(name.clone()).or_default();
                }
            }
            summary.attribute_changed = Some(changed);
        }

        if request.character_data {
            summary.character_data_changed = Some(self.character_data_changed());
        }

        summary
    }

    /// Nodes whose attribute values actually differ from before the
    /// batch, grouped per attribute name. Only nodes that stayed
    /// reachable and stayed matching are reported.
    pub fn attribute_changed_nodes(
        &mut self,
        filter: Option<&[String]>,
    ) -> HashMap<String, Vec<NodeId>> {
        let mut result: HashMap<String, Vec<NodeId>> = HashMap::new();
        if !self.tree_changes.any_attributes_changed {
            return result;
        }

        let mut attribute_filter: Option<HashSet<String>> = None;
        let mut case_insensitive_filter: HashMap<String, String> = HashMap::new();
        if let Some(filter) = filter {
            let mut set = HashSet::new();
            for name in filter {
                set.insert(name.clone());
                case_insensitive_filter.insert(name.to_ascii_lowercase(), name.clone());
            }
            attribute_filter = Some(set);
        }

        for node in self.tree_changes.keys() {
            if !self.tree_changes.get(node).is_some_and(|c| c.attributes) {
                continue;
            }
            if self.tree_changes.reachability_change(self.tree, node) != Movement::StayedIn {
                continue;
            }
            if self.matchability_change(node) != Movement::StayedIn {
                continue;
            }

            let Some(change) = self.tree_changes.get(node) else {
                continue;
            };
            for name in change.attribute_names_mutated() {
                if let Some(allowed) = &attribute_filter {
                    let case_mapped =
                        change.case_insensitive && case_insensitive_filter.contains_key(name);
                    if !allowed.contains(name) && !case_mapped {
                        continue;
                    }
                }

                let Some(old_value) = change.attribute_old_value(name) else {
                    continue;
                };
                // Net no-op: the value was restored within the batch.
                if old_value.as_deref() == self.tree.attribute(node, name) {
                    continue;
                }

                let reported = if change.case_insensitive {
                    case_insensitive_filter
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| name.to_string())
                } else {
                    name.to_string()
                };
                result.entry(reported).or_default().push(node);
            }
        }

        result
    }

    /// Still-reachable nodes whose character data differs from before
    /// the batch.
    pub fn character_data_changed(&mut self) -> Vec<NodeId> {
        if !self.tree_changes.any_character_data_changed {
            return Vec::new();
        }

        let mut result = Vec::new();
        for node in self.tree_changes.keys() {
            if !self
                .tree_changes
                .get(node)
                .is_some_and(|c| c.character_data)
            {
                continue;
            }
            if self.tree_changes.reachability_change(self.tree, node) != Movement::StayedIn {
                continue;
            }
            let Some(change) = self.tree_changes.get(node) else {
                continue;
            };
            if self.tree.text(node) == change.character_data_old_value.as_deref() {
                continue;
            }
            result.push(node);
        }
        result
    }

    // --- old-state queries --------------------------------------------

    /// The node's parent before the batch. Errors if the node did not
    /// exist in the prior tree.
    pub fn old_parent_node(&mut self, node: NodeId) -> Result<Option<NodeId>, QueryError> {
        if let Some(change) = self.tree_changes.get(node) {
            if change.child_list {
                return Ok(change.old_parent);
            }
        }
        match self.tree_changes.reachability_change(self.tree, node) {
            Movement::StayedOut | Movement::Entered => Err(QueryError::InvalidOldParentQuery),
            _ => Ok(self.tree.parent(node)),
        }
    }

    /// The node's previous sibling before the batch. Valid only when
    /// old-sibling tracking was requested and the node was removed,
    /// reparented, or reordered.
    pub fn old_previous_sibling(&mut self, node: NodeId) -> Result<Option<NodeId>, QueryError> {
        if !self.options.calc_old_previous_sibling && !self.options.calc_reordered {
            return Err(QueryError::InvalidOldSiblingQuery);
        }
        self.process_child_list_changes();
        let parent = match self.tree_changes.get(node).and_then(|c| c.old_parent) {
            Some(p) => Some(p),
            None => self.tree.parent(node),
        };
        let parent = parent.ok_or(QueryError::InvalidOldSiblingQuery)?;

        let change = self
            .child_list_change_map
            .as_ref()
            .and_then(|map| map.get(parent))
            .ok_or(QueryError::InvalidOldSiblingQuery)?;
        change
            .old_previous
            .get(node)
            .copied()
            .ok_or(QueryError::InvalidOldSiblingQuery)
    }

    /// First-seen old value of an attribute touched in this batch.
    /// `Ok(None)` means the attribute was absent before the batch.
    pub fn old_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, QueryError> {
        let change = self
            .tree_changes
            .get(node)
            .filter(|c| c.attributes)
            .ok_or(QueryError::InvalidOldAttributeQuery)?;
        change
            .attribute_old_value(name)
            .cloned()
            .ok_or(QueryError::InvalidOldAttributeQuery)
    }

    /// Character data of the node before the batch.
    pub fn old_character_data(&self, node: NodeId) -> Result<Option<String>, QueryError> {
        let change = self
            .tree_changes
            .get(node)
            .filter(|c| c.character_data)
            .ok_or(QueryError::InvalidOldTextQuery)?;
        Ok(change.character_data_old_value.clone())
    }
}

/// First-seen-wins old-previous-sibling recording, with the skip rules
/// for nodes whose position in the prior list is unknown or already
/// captured.
fn record_old_previous(change: &mut ChildListChange, node: NodeId, previous: Option<NodeId>) {
    if change.old_previous.has(node) || change.added.has(node) || change.maybe_moved.has(node) {
        return;
    }
    if let Some(prev) = previous {
        if change.added.has(prev) || change.maybe_moved.has(prev) {
            return;
        }
    }
    change.old_previous.set(node, previous);
}

/// Move detection over one parent's ambiguity set.
///
/// The mutually recursive "previous sibling skipping moved nodes"
/// definitions can form cycles (two siblings swapped); `pending` is the
/// visited-in-progress marker that breaks them. A reentrant decision
/// provisionally answers "moved"; whichever call still owns the pending
/// marker afterwards caches the final verdict. Genuinely cyclic swaps
/// may over-report as moved; the provisional answer is what guarantees
/// termination.
struct MoveResolver<'a> {
    tree: &'a DomTree,
    added: &'a NodeMap<bool>,
    removed: &'a NodeMap<bool>,
    maybe_moved: &'a NodeMap<bool>,
    old_previous: &'a NodeMap<Option<NodeId>>,
    moved: NodeMap<bool>,
    pending: NodeMap<bool>,
    previous_cache: NodeMap<Option<NodeId>>,
    old_previous_cache: NodeMap<Option<NodeId>>,
}

impl MoveResolver<'_> {
    fn is_moved(&mut self, node: Option<NodeId>) -> bool {
        let Some(node) = node else {
            return false;
        };
        if !self.maybe_moved.has(node) {
            return false;
        }
        if let Some(&did_move) = self.moved.get(node) {
            return did_move;
        }

        let mut did_move;
        if self.pending.has(node) {
            // Cycle: assume moved.
            did_move = true;
        } else {
            self.pending.set(node, true);
            did_move = self.previous(node) != self.old_previous_of(node);
        }

        if self.pending.has(node) {
            self.pending.remove(node);
            self.moved.set(node, did_move);
        } else {
            // A reentrant call consumed the marker and cached the
            // cycle's resolution; read that back.
            did_move = self.moved.get(node).copied().unwrap_or(did_move);
        }
        did_move
    }

    /// Current previous sibling, skipping freshly added and moved nodes.
    fn previous(&mut self, node: NodeId) -> Option<NodeId> {
        if let Some(&cached) = self.previous_cache.get(node) {
            return cached;
        }
        let mut previous = self.tree.prev_sibling(node);
        while let Some(p) = previous {
            if self.added.has(p) || self.is_moved(Some(p)) {
                previous = self.tree.prev_sibling(p);
            } else {
                break;
            }
        }
        self.previous_cache.set(node, previous);
        previous
    }

    /// Reconstructed old previous sibling, skipping removed and moved
    /// nodes, chasing the old-previous chain when the immediate old
    /// previous is itself gone.
    fn old_previous_of(&mut self, node: NodeId) -> Option<NodeId> {
        if let Some(&cached) = self.old_previous_cache.get(node) {
            return cached;
        }
        let mut old_previous: Option<Option<NodeId>> = self.old_previous.get(node).copied();
        while let Some(Some(p)) = old_previous {
            if self.removed.has(p) || self.is_moved(Some(p)) {
                old_previous = Some(self.old_previous_of(p));
            } else {
                break;
            }
        }
        let old_previous = match old_previous {
            Some(p) => p,
            // Never recorded: the node was untouched at this position.
            None => self.tree.prev_sibling(node),
        };
        self.old_previous_cache.set(node, old_previous);
        old_previous
    }
}
