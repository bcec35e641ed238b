//! Cast graph: directed edges between registered types.
//!
//! Nodes are type hashes, edges carry the projection `&From -> &To`. Paths
//! are found breadth first so the shortest chain wins; among equally short
//! chains the one whose edges were registered first wins.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use scriptbind_core::{Cost, Projection, TypeHash, View};

/// A resolved conversion between two types.
#[derive(Clone, Debug)]
pub struct CastPath {
    steps: Vec<Projection>,
}

impl CastPath {
    /// The empty path, for `from == to`.
    pub fn identity() -> Self {
        Self { steps: Vec::new() }
    }

    /// Number of edges walked.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Scoring cost: one per edge.
    pub fn cost(&self) -> Cost {
        Cost::cast(self.depth())
    }

    /// Projections in walk order.
    pub fn steps(&self) -> &[Projection] {
        &self.steps
    }

    /// Extend a view with this path.
    pub fn apply_to(&self, view: &View) -> View {
        view.then(self.steps.iter())
    }
}

/// Directed graph of cast edges.
#[derive(Default)]
pub struct CastGraph {
    graph: DiGraph<TypeHash, Projection>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl CastGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, hash: TypeHash) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&hash) {
            return idx;
        }
        let idx = self.graph.add_node(hash);
        self.nodes.insert(hash, idx);
        idx
    }

    /// Add a type without edges.
    pub fn add_type(&mut self, hash: TypeHash) {
        self.node(hash);
    }

    /// Add the edge `from -> to`.
    pub fn add_edge(&mut self, from: TypeHash, to: TypeHash, projection: Projection) {
        let a = self.node(from);
        let b = self.node(to);
        self.graph.add_edge(a, b, projection);
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing edges of a node in registration order.
    fn outgoing(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<_> = self
            .graph
            .edges(node)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| id.index());
        edges
    }

    /// Shortest conversion `from -> to` of at most `max_depth` edges.
    ///
    /// Returns `None` when `to` is unreachable; a cycle cannot loop because
    /// each node is visited once.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn find_path(&self, from: TypeHash, to: TypeHash, max_depth: usize) -> Option<CastPath> {
        if from == to {
            return Some(CastPath::identity());
        }
        let start = *self.nodes.get(&from)?;
        let goal = *self.nodes.get(&to)?;

        let mut parent: FxHashMap<NodeIndex, EdgeIndex> = FxHashMap::default();
        let mut visited: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back((start, 0usize));

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for (edge, next) in self.outgoing(node) {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, edge);
                if next == goal {
                    return Some(self.rebuild(start, goal, &parent));
                }
                queue.push_back((next, depth + 1));
            }
        }
        None
    }

    fn rebuild(
        &self,
        start: NodeIndex,
        goal: NodeIndex,
        parent: &FxHashMap<NodeIndex, EdgeIndex>,
    ) -> CastPath {
        let mut steps = Vec::new();
        let mut current = goal;
        while current != start {
            let Some(&edge) = parent.get(&current) else {
                break;
            };
            if let (Some(projection), Some((source, _))) =
                (self.graph.edge_weight(edge), self.graph.edge_endpoints(edge))
            {
                steps.push(projection.clone());
                current = source;
            } else {
                break;
            }
        }
        steps.reverse();
        CastPath { steps }
    }

    /// Whether `to` is reachable from `from` within `max_depth` edges.
    pub fn is_reachable(&self, from: TypeHash, to: TypeHash, max_depth: usize) -> bool {
        self.find_path(from, to, max_depth).is_some()
    }
}

impl std::fmt::Debug for CastGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastGraph")
            .field("types", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
