//! Layered layout along edge direction.
//!
//! Back edges found by a depth-first search (started from each node in
//! ascending id order) are dropped so the rest forms a DAG. Each node's layer
//! is the length of the longest path reaching it from a source, taken over a
//! topological order; layers are rows, their nodes spread evenly around
//! `x = 0`.

use log::{debug, warn};
use petgraph::{
    algo::toposort,
    graph::{DiGraph, EdgeIndex},
    visit::{DfsEvent, depth_first_search},
};

use trellis_core::{geometry::Position, identifier::Id};

use crate::{
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

pub struct Engine {
    layer_spacing: f64,
    node_spacing: f64,
    break_cycles: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            layer_spacing: 100.0,
            node_spacing: 50.0,
            break_cycles: true,
        }
    }

    /// Set the vertical distance between layers
    pub fn set_layer_spacing(&mut self, spacing: f64) -> &mut Self {
        self.layer_spacing = spacing;
        self
    }

    /// Set the horizontal distance between nodes of one layer
    pub fn set_node_spacing(&mut self, spacing: f64) -> &mut Self {
        self.node_spacing = spacing;
        self
    }

    pub fn set_break_cycles(&mut self, enabled: bool) -> &mut Self {
        self.break_cycles = enabled;
        self
    }
}

/// Edges closing a cycle during a depth-first search, in discovery order.
fn back_edges(graph: &DiGraph<Id, ()>) -> Vec<EdgeIndex> {
    let mut back = Vec::new();
    depth_first_search(graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(source, target) = event {
            back.extend(graph.find_edge(source, target));
        }
    });
    back
}

/// Longest-path layer of every node over the edges not in `dropped`.
fn layers(graph: &DiGraph<Id, ()>, dropped: &[EdgeIndex]) -> Result<Vec<usize>, LayoutError> {
    let mut pruned = graph.clone();
    // Edges are visited from the last index down, so `dropped` stays valid.
    pruned.retain_edges(|_, edge| !dropped.contains(&edge));

    let order = toposort(&pruned, None).map_err(|cycle| LayoutError::Cycle {
        node: pruned[cycle.node_id()],
    })?;
    let mut layer = vec![0usize; pruned.node_count()];
    for node in order {
        let next_layer = layer[node.index()] + 1;
        for next in pruned.neighbors(node) {
            layer[next.index()] = layer[next.index()].max(next_layer);
        }
    }
    Ok(layer)
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        _cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let digraph = graph.digraph();
        let back = back_edges(digraph);
        let closing = back
            .first()
            .and_then(|edge| digraph.edge_endpoints(*edge))
            .map(|(_, target)| digraph[target]);
        if let Some(node) = closing {
            if !self.break_cycles {
                return Err(LayoutError::Cycle { node });
            }
            warn!(dropped = back.len(), node:% = node; "Breaking cycles for layered layout");
        }

        let layers = layers(digraph, &back)?;
        let depth = layers.iter().max().map_or(0, |max| max + 1);
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for (node, layer) in layers.iter().enumerate() {
            rows[*layer].push(node);
        }
        debug!(layers = depth; "Layers assigned");

        let mut positions = vec![Position::ORIGIN; graph.len()];
        for (layer, row) in rows.iter().enumerate() {
            let y = layer as f64 * self.layer_spacing;
            for (node, x) in row.iter().zip(engines::centered(row.len(), self.node_spacing)) {
                positions[*node] = Position::planar(x, y);
            }
        }
        Ok(Placement::complete(positions))
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{edge::Edge, graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    fn build(nodes: &[&str], edges: &[(&str, &str)]) -> EffectiveGraph {
        let mut graph = Graph::new();
        for name in nodes {
            graph.add_node(Node::new(Id::new(name))).unwrap();
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            graph
                .add_edge(Edge::new(Id::new(&format!("e{i}")), Id::new(s), Id::new(t)))
                .unwrap();
        }
        EffectiveGraph::new(&graph, false)
    }

    #[test]
    fn test_longest_path_layering() {
        // a -> b -> c and a shortcut a -> c: `c` still lands on layer 2
        let graph = build(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(back_edges(graph.digraph()).is_empty());
        assert_eq!(layers(graph.digraph(), &[]).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_is_broken() {
        let graph = build(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(back_edges(graph.digraph()), vec![EdgeIndex::new(2)]);

        let placement = Engine::new()
            .calculate(&graph, &CancelToken::new())
            .unwrap();
        let ys: Vec<f64> = placement.positions.iter().map(|p| p.y()).collect();
        assert_eq!(ys, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn test_cycle_rejected_when_breaking_disabled() {
        let graph = build(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let mut engine = Engine::new();
        engine.set_break_cycles(false);
        assert_eq!(
            engine.calculate(&graph, &CancelToken::new()).unwrap_err(),
            LayoutError::Cycle { node: Id::new("a") }
        );
    }

    #[test]
    fn test_siblings_spread_within_layer() {
        let graph = build(&["r", "x", "y"], &[("r", "x"), ("r", "y")]);
        let placement = Engine::new()
            .calculate(&graph, &CancelToken::new())
            .unwrap();
        assert_eq!(placement.positions[1], Position::planar(-25.0, 100.0));
        assert_eq!(placement.positions[2], Position::planar(25.0, 100.0));
    }
}
