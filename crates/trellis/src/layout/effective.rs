//! The node set a layout actually positions.

use std::collections::HashMap;

use log::trace;
use petgraph::{
    graph::DiGraph,
    visit::EdgeRef,
};

use trellis_core::{geometry::Position, graph::Graph, identifier::Id};

/// Positionable nodes in ascending id order, with the edges between them.
///
/// Leaves and empty containers are positionable. Non-empty containers are
/// not: their position always follows their children. When collapsed
/// containers are respected, each non-empty collapsed container stands in
/// for its whole subtree and edges touching the subtree are redirected to
/// it. Self-loops and repeated node pairs are dropped.
///
/// Node `i` of [`digraph`](Self::digraph) is the `i`-th id, and edge
/// indices follow the order of the source graph's edges.
#[derive(Debug, Clone)]
pub(crate) struct EffectiveGraph {
    graph: DiGraph<Id, ()>,
    positions: Vec<Position>,
}

impl EffectiveGraph {
    pub(crate) fn new(graph: &Graph, respect_collapsed: bool) -> Self {
        let representatives: HashMap<Id, Id> = graph
            .nodes()
            .filter_map(|node| {
                representative(graph, node.id(), respect_collapsed).map(|rep| (node.id(), rep))
            })
            .collect();

        let mut ids: Vec<Id> = representatives
            .iter()
            .filter(|(id, rep)| id == rep)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();

        let mut digraph = DiGraph::with_capacity(ids.len(), graph.edge_count());
        let mut index = HashMap::with_capacity(ids.len());
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            index.insert(id, digraph.add_node(id));
            positions.push(graph.node(id).map_or(Position::ORIGIN, |node| node.position()));
        }

        for edge in graph.edges() {
            let endpoints = representatives
                .get(&edge.source())
                .zip(representatives.get(&edge.target()))
                .and_then(|(source, target)| index.get(source).zip(index.get(target)));
            let Some((&source, &target)) = endpoints else {
                continue;
            };
            if source != target && digraph.find_edge(source, target).is_none() {
                digraph.add_edge(source, target, ());
            }
        }

        trace!(nodes = digraph.node_count(), edges = digraph.edge_count(); "Effective graph built");
        Self {
            graph: digraph,
            positions,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn digraph(&self) -> &DiGraph<Id, ()> {
        &self.graph
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.graph.node_weights().copied()
    }

    /// Current positions, parallel to [`ids`](Self::ids).
    pub(crate) fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Edges as `(source, target)` node indices, in edge index order.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
    }

    /// Neighbours ignoring direction, sorted and without repeats.
    pub(crate) fn neighbours(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|node| {
                let mut list: Vec<usize> = self
                    .graph
                    .neighbors_undirected(node)
                    .map(|next| next.index())
                    .collect();
                list.sort_unstable();
                list.dedup();
                list
            })
            .collect()
    }
}

/// The effective node that `id` is laid out as, if any.
fn representative(graph: &Graph, id: Id, respect_collapsed: bool) -> Option<Id> {
    if respect_collapsed {
        let opaque = |node: Id| {
            !graph.is_free(node) && graph.node(node).is_some_and(|n| n.is_collapsed())
        };
        // The outermost collapsed ancestor hides everything below it.
        if let Some(outer) = graph.hierarchy().ancestors(id).filter(|a| opaque(*a)).last() {
            return Some(outer);
        }
        if opaque(id) {
            return Some(id);
        }
    }
    graph.is_free(id).then_some(id)
}
