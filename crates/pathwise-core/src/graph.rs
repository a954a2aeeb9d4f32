//! # Graph Engine
//!
//! The acyclic directed graph at the heart of Pathwise.
//!
//! Nodes live in an arena (`Vec<GraphNode>`) in append order; a `BTreeMap`
//! maps caller ids to arena slots. Edges are stored only in the source
//! node's outgoing list; there is no reverse index.
//!
//! ## Invariants
//!
//! - Every edge inserted through [`DirectedGraph::try_add_edge_acyclic`]
//!   keeps the graph acyclic. There is no repair operation.
//! - `(from, to)` pairs are unique.
//! - Iteration follows node append order, so every derived order is
//!   deterministic.
//!
//! Stored rows can be loaded verbatim with [`DirectedGraph::from_stored`];
//! [`DirectedGraph::try_topological_order`] then detects any cycle they carry.

use crate::NodeId;
use crate::primitives::INITIAL_VISIT_TOKEN;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// NODES & EDGES
// =============================================================================

/// A directed edge, stored in its source node's outgoing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Destination node.
    pub to: NodeId,
}

/// A node owned by a `DirectedGraph`.
#[derive(Debug, Clone)]
pub struct GraphNode {
    id: NodeId,
    label: String,
    outgoing: Vec<Edge>,
    /// Recomputed from scratch by every operation that reads it.
    in_degree: usize,
    /// Equal to the graph's current visit token once visited in this query.
    visit_mark: u32,
}

impl GraphNode {
    fn new(id: NodeId, label: String) -> Self {
        Self {
            id,
            label,
            outgoing: Vec::new(),
            in_degree: 0,
            visit_mark: 0,
        }
    }

    /// The caller-supplied node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The label given when the node was first added.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Outgoing edges in insertion order.
    #[must_use]
    pub fn outgoing(&self) -> &[Edge] {
        &self.outgoing
    }
}

/// Result of Kahn's algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopologicalOrder {
    /// `false` when the edges contain a cycle; `order` is then partial.
    pub complete: bool,
    /// Node ids, every edge pointing from an earlier to a later entry.
    pub order: Vec<NodeId>,
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// Directed graph with a guarded, cycle-rejecting edge insertion.
#[derive(Debug, Clone)]
pub struct DirectedGraph {
    /// Node arena in append order.
    nodes: Vec<GraphNode>,

    /// Lookup: NodeId -> arena slot
    index: BTreeMap<NodeId, usize>,

    /// Marker for the current reachability query.
    visit_token: u32,
}

impl Default for DirectedGraph {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: BTreeMap::new(),
            visit_token: INITIAL_VISIT_TOKEN,
        }
    }
}

impl DirectedGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load nodes and edges exactly as they were stored.
    ///
    /// Edges bypass the acyclic guard: this is how persisted state is
    /// brought in for inspection. Edges with a missing endpoint are dropped
    /// and duplicate pairs are stored once; everything else, including
    /// cycles and self-loops, is kept so `try_topological_order` can see it.
    pub fn from_stored<L, N, E>(nodes: N, edges: E) -> Self
    where
        L: Into<String>,
        N: IntoIterator<Item = (NodeId, L)>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = Self::new();
        for (id, label) in nodes {
            graph.add_node(id, label);
        }

        for (from, to) in edges {
            if !graph.contains_node(to) || graph.has_edge(from, to) {
                continue;
            }
            if let Some(slot) = graph.slot(from) {
                graph.nodes[slot].outgoing.push(Edge { to });
            }
        }

        graph
    }

    fn slot(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Insert a node if its id is absent. Re-adding an id is a no-op and
    /// keeps the first label.
    pub fn add_node(&mut self, id: NodeId, label: impl Into<String>) {
        if self.index.contains_key(&id) {
            return;
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(GraphNode::new(id, label.into()));
    }

    /// Check if the graph contains a node.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Lookup a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.slot(id).map(|slot| &self.nodes[slot])
    }

    /// Check if the edge `from -> to` is stored.
    #[must_use]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.node(from)
            .is_some_and(|node| node.outgoing.iter().any(|edge| edge.to == to))
    }

    /// Add `from -> to` unless it would break acyclicity.
    ///
    /// Returns `false` for a self-loop, a missing endpoint, or when `from`
    /// is already reachable from `to`. Returns `true` when the edge is
    /// added or was already present.
    pub fn try_add_edge_acyclic(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }

        let (Some(from_slot), Some(_)) = (self.slot(from), self.slot(to)) else {
            return false;
        };

        if self.has_edge(from, to) {
            return true;
        }

        if self.is_reachable(to, from) {
            return false;
        }

        self.nodes[from_slot].outgoing.push(Edge { to });
        true
    }

    /// Iterative depth-first search from `start` looking for `target`.
    ///
    /// Uses the visit token instead of a fresh visited set.
    pub fn is_reachable(&mut self, start: NodeId, target: NodeId) -> bool {
        let Some(start_slot) = self.slot(start) else {
            return false;
        };

        let token = self.next_visit_token();
        self.nodes[start_slot].visit_mark = token;

        let mut stack = vec![start_slot];
        while let Some(current) = stack.pop() {
            if self.nodes[current].id == target {
                return true;
            }

            for i in 0..self.nodes[current].outgoing.len() {
                let to = self.nodes[current].outgoing[i].to;
                if let Some(next) = self.slot(to) {
                    if self.nodes[next].visit_mark != token {
                        self.nodes[next].visit_mark = token;
                        stack.push(next);
                    }
                }
            }
        }

        false
    }

    /// Deterministic topological order (Kahn).
    ///
    /// Ties between ready nodes resolve by append order, not by id.
    /// `complete == false` means the stored edges contain a cycle.
    pub fn try_topological_order(&mut self) -> TopologicalOrder {
        if self.nodes.is_empty() {
            return TopologicalOrder {
                complete: true,
                order: Vec::new(),
            };
        }

        self.reset_in_degrees();

        let mut queue: VecDeque<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.in_degree == 0)
            .map(|(slot, _)| slot)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(current) = queue.pop_front() {
            order.push(self.nodes[current].id);

            for i in 0..self.nodes[current].outgoing.len() {
                let to = self.nodes[current].outgoing[i].to;
                if let Some(next) = self.slot(to) {
                    let node = &mut self.nodes[next];
                    node.in_degree = node.in_degree.saturating_sub(1);
                    if node.in_degree == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        TopologicalOrder {
            complete: order.len() == self.nodes.len(),
            order,
        }
    }

    /// First node, in append order, with no incoming edge.
    pub fn first_source(&mut self) -> Option<NodeId> {
        self.reset_in_degrees();
        self.nodes
            .iter()
            .find(|node| node.in_degree == 0)
            .map(|node| node.id)
    }

    /// Breadth-first order of the nodes reachable from `start`.
    ///
    /// Returns an empty order when `start` is absent.
    #[must_use]
    pub fn bfs_order(&self, start: NodeId) -> Vec<NodeId> {
        if !self.contains_node(start) {
            return Vec::new();
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for next in self.successors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }

    /// Breadth-first distance of every node reachable from `start`.
    #[must_use]
    pub fn bfs_levels(&self, start: NodeId) -> BTreeMap<NodeId, usize> {
        let mut levels = BTreeMap::new();
        if !self.contains_node(start) {
            return levels;
        }

        let mut queue = VecDeque::new();
        levels.insert(start, 0usize);
        queue.push_back((start, 0usize));

        while let Some((current, level)) = queue.pop_front() {
            for next in self.successors(current) {
                if !levels.contains_key(&next) {
                    levels.insert(next, level.saturating_add(1));
                    queue.push_back((next, level.saturating_add(1)));
                }
            }
        }

        levels
    }

    /// Destinations of `id`'s outgoing edges, in insertion order.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.outgoing.iter().map(|edge| edge.to))
    }

    /// Get all nodes in append order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// Get all edges: sources in append order, then outgoing order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes
            .iter()
            .flat_map(|node| node.outgoing.iter().map(move |edge| (node.id, edge.to)))
    }

    /// Get the total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.outgoing.len()).sum()
    }

    /// Check if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn reset_in_degrees(&mut self) {
        for node in &mut self.nodes {
            node.in_degree = 0;
        }

        for slot in 0..self.nodes.len() {
            for i in 0..self.nodes[slot].outgoing.len() {
                let to = self.nodes[slot].outgoing[i].to;
                if let Some(next) = self.slot(to) {
                    self.nodes[next].in_degree = self.nodes[next].in_degree.saturating_add(1);
                }
            }
        }
    }

    fn next_visit_token(&mut self) -> u32 {
        self.visit_token = self.visit_token.saturating_add(1);
        if self.visit_token == u32::MAX {
            // Stale marks from before the wrap must not equal a reused token.
            self.visit_token = INITIAL_VISIT_TOKEN;
            for node in &mut self.nodes {
                node.visit_mark = 0;
            }
        }
        self.visit_token
    }
}

// =============================================================================
// TESTS
// =============================================================================
