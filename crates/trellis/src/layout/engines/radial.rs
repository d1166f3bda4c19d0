//! Radial layout around the most connected node.
//!
//! The hub sits at the origin. Every other node lands on the ring matching
//! its hop distance from the hub, ignoring edge direction. Nodes the hub
//! cannot reach share one extra ring outside the last.

use log::debug;
use petgraph::{
    Undirected,
    graph::{NodeIndex, UnGraph},
    visit::Bfs,
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
    ring_spacing: f64,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            ring_spacing: 100.0,
        }
    }

    pub fn set_ring_spacing(&mut self, spacing: f64) -> &mut Self {
        self.ring_spacing = spacing;
        self
    }
}

/// Ring index of every node, with `None` for nodes the hub cannot reach.
fn rings(graph: &UnGraph<Id, ()>, hub: usize) -> Vec<Option<usize>> {
    let mut distance = vec![None; graph.node_count()];
    distance[hub] = Some(0);
    let mut bfs = Bfs::new(graph, NodeIndex::new(hub));
    while let Some(node) = bfs.next(graph) {
        let next_distance = distance[node.index()].map_or(0, |d| d + 1);
        for next in graph.neighbors(node) {
            if distance[next.index()].is_none() {
                distance[next.index()] = Some(next_distance);
            }
        }
    }
    distance
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        _cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        if graph.is_empty() {
            return Ok(Placement::complete(Vec::new()));
        }
        let neighbours = graph.neighbours();
        // Ties go to the smallest id.
        let mut hub = 0;
        for (node, list) in neighbours.iter().enumerate() {
            if list.len() > neighbours[hub].len() {
                hub = node;
            }
        }

        let undirected = graph.digraph().clone().into_edge_type::<Undirected>();
        let distance = rings(&undirected, hub);
        let outer = distance.iter().flatten().max().copied().unwrap_or(0) + 1;
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); outer + 1];
        for (node, ring) in distance.iter().enumerate() {
            members[ring.unwrap_or(outer)].push(node);
        }
        debug!(hub = hub, rings = outer, unreachable = members[outer].len(); "Radial rings");

        let mut positions = vec![Position::ORIGIN; graph.len()];
        for (ring, nodes) in members.iter().enumerate().skip(1) {
            let radius = ring as f64 * self.ring_spacing;
            for (slot, node) in nodes.iter().enumerate() {
                positions[*node] = engines::on_circle(slot, nodes.len(), radius);
            }
        }
        Ok(Placement::complete(positions))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use trellis_core::{edge::Edge, graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    #[test]
    fn test_star_with_tail_and_island() {
        let mut graph = Graph::new();
        for name in ["a", "hub", "b", "c", "tail", "island"] {
            graph.add_node(Node::new(Id::new(name))).unwrap();
        }
        for (i, (s, t)) in [("hub", "a"), ("b", "hub"), ("hub", "c"), ("c", "tail")]
            .into_iter()
            .enumerate()
        {
            graph
                .add_edge(Edge::new(Id::new(&format!("e{i}")), Id::new(s), Id::new(t)))
                .unwrap();
        }
        let effective = EffectiveGraph::new(&graph, false);
        let index = |name: &str| effective.ids().position(|id| id == name).unwrap();

        let placement = Engine::new()
            .calculate(&effective, &CancelToken::new())
            .unwrap();
        let radius = |name: &str| placement.positions[index(name)].hypot();

        assert_approx_eq!(f64, radius("hub"), 0.0);
        for leaf in ["a", "b", "c"] {
            assert_approx_eq!(f64, radius(leaf), 100.0, epsilon = 1e-9);
        }
        assert_approx_eq!(f64, radius("tail"), 200.0, epsilon = 1e-9);
        assert_approx_eq!(f64, radius("island"), 300.0, epsilon = 1e-9);
    }
}
