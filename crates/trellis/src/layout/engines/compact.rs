//! Compaction from the current positions.
//!
//! Each iteration first pushes apart every pair closer than the minimum
//! distance, then pulls every connected node toward the centroid of its
//! neighbours by a step that grows from pass to pass. A pull that would
//! bring a node within the minimum distance of another is skipped. The run
//! ends when a pass finds no overlap and moves nothing, or at the iteration
//! cap.

use log::debug;

use trellis_core::geometry::Position;

use crate::{
    config::CompactConfig,
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

pub struct Engine {
    iterations: usize,
    min_distance: f64,
    initial_step: f64,
    step_growth: f64,
    max_step: f64,
}

impl Engine {
    pub fn new(config: &CompactConfig) -> Self {
        Self {
            iterations: config.iterations,
            min_distance: config.min_distance,
            initial_step: config.initial_step,
            step_growth: config.step_growth,
            max_step: config.max_step,
        }
    }

    /// Separates overlapping pairs; returns how many were found.
    fn resolve_overlaps(&self, positions: &mut [Position]) -> usize {
        let mut overlaps = 0;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let trans = positions[i].sub_position(positions[j]);
                let distance = trans.hypot();
                if distance >= self.min_distance {
                    continue;
                }
                overlaps += 1;
                let direction = if distance < f64::EPSILON {
                    engines::separation(i, j)
                } else {
                    trans.scale(1.0 / distance)
                };
                let push = direction.scale((self.min_distance - distance) / 2.0);
                positions[i] = positions[i].add_position(push);
                positions[j] = positions[j].sub_position(push);
            }
        }
        overlaps
    }

    /// Pulls connected nodes toward their neighbours; returns whether any
    /// node moved.
    fn compress(&self, positions: &mut [Position], neighbours: &[Vec<usize>], step: f64) -> bool {
        let mut moved = false;
        for node in 0..positions.len() {
            let Some(center) =
                Position::centroid(neighbours[node].iter().map(|other| positions[*other]))
            else {
                continue;
            };
            let target = positions[node].add_position(center.sub_position(positions[node]).scale(step));
            let blocked = positions
                .iter()
                .enumerate()
                .any(|(other, p)| other != node && p.distance_2d(target) < self.min_distance);
            if !blocked && target != positions[node] {
                positions[node] = target;
                moved = true;
            }
        }
        moved
    }
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let neighbours = graph.neighbours();
        let mut positions: Vec<Position> = graph
            .positions()
            .iter()
            .map(|p| Position::planar(p.x(), p.y()))
            .collect();
        let mut step = self.initial_step;
        let mut cancelled = false;
        let mut passes = 0;

        for _ in 0..self.iterations {
            passes += 1;
            let overlaps = self.resolve_overlaps(&mut positions);
            let moved = self.compress(&mut positions, &neighbours, step);
            step = (step * self.step_growth).min(self.max_step);

            if overlaps == 0 && !moved {
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        debug!(passes = passes, cancelled = cancelled; "Compaction finished");
        Ok(Placement {
            positions,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{edge::Edge, graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    fn min_pair_distance(positions: &[Position]) -> f64 {
        let mut min = f64::INFINITY;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                min = min.min(positions[i].distance_2d(positions[j]));
            }
        }
        min
    }

    #[test]
    fn test_stacked_nodes_are_separated() {
        let mut graph = Graph::new();
        for name in ["a", "b", "c", "d"] {
            graph.add_node(Node::new(Id::new(name))).unwrap();
        }
        let effective = EffectiveGraph::new(&graph, false);
        let config = CompactConfig {
            iterations: 500,
            ..CompactConfig::default()
        };

        let placement = Engine::new(&config)
            .calculate(&effective, &CancelToken::new())
            .unwrap();
        assert!(min_pair_distance(&placement.positions) >= 50.0 - 1e-6);
    }

    #[test]
    fn test_connected_nodes_pulled_together() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(Id::new("a"))).unwrap();
        graph
            .add_node(Node::new(Id::new("b")).with_position(Position::planar(1_000.0, 0.0)))
            .unwrap();
        graph
            .add_edge(Edge::new(Id::new("e0"), Id::new("a"), Id::new("b")))
            .unwrap();
        let effective = EffectiveGraph::new(&graph, false);

        let placement = Engine::new(&CompactConfig::default())
            .calculate(&effective, &CancelToken::new())
            .unwrap();
        let distance = placement.positions[0].distance_2d(placement.positions[1]);
        assert!(distance < 1_000.0);
        assert!(distance >= 50.0);
    }
}
