//! Force-directed layout engines
//!
//! Every node pair repels with a force inversely proportional to their squared
//! distance, and every edge pulls its endpoints together in proportion to its
//! length. Forces accumulate into a damped velocity.
//!
//! The `organic` variant adds simulated annealing: a temperature caps the
//! displacement of each iteration and cools geometrically.
//!
//! Both start from the current positions, so repeated runs refine a layout
//! instead of starting over.

use log::debug;

use trellis_core::geometry::Position;

use crate::{
    config::{OrganicConfig, SpringConfig},
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

/// Distances below this count as coincident.
const MIN_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct Annealing {
    initial_temperature: f64,
    cooling_factor: f64,
}

pub struct Engine {
    // Simulation parameters
    iterations: usize,
    spring_constant: f64,
    repulsion_constant: f64,
    damping_factor: f64,
    convergence_threshold: f64,
    annealing: Option<Annealing>,
}

impl Engine {
    /// Create a plain spring engine
    pub fn spring(config: &SpringConfig) -> Self {
        Self {
            iterations: config.iterations,
            spring_constant: config.spring_constant,
            repulsion_constant: config.repulsion_constant,
            damping_factor: config.damping_factor,
            convergence_threshold: config.convergence_threshold,
            annealing: None,
        }
    }

    /// Create an annealing engine with the spring force model
    pub fn organic(spring: &SpringConfig, organic: &OrganicConfig) -> Self {
        let mut engine = Self::spring(spring);
        engine.set_iterations(organic.iterations);
        engine.annealing = Some(Annealing {
            initial_temperature: organic.initial_temperature,
            cooling_factor: organic.cooling_factor,
        });
        engine
    }

    /// Set the number of iterations for the force simulation
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Net force on every node for the given positions.
    fn forces(&self, graph: &EffectiveGraph, positions: &[Position]) -> Vec<Position> {
        let mut forces = vec![Position::ORIGIN; positions.len()];

        // Add repulsive forces between all nodes
        for i in 0..positions.len() {
            for j in 0..positions.len() {
                if i == j {
                    continue;
                }
                let trans = positions[i].sub_position(positions[j]);
                let raw = trans.hypot();
                let (direction, distance) = if raw < MIN_DISTANCE {
                    (engines::separation(i, j), MIN_DISTANCE)
                } else {
                    (trans.scale(1.0 / raw), raw)
                };
                let force = self.repulsion_constant / (distance * distance);
                forces[i] = forces[i].add_position(direction.scale(force));
            }
        }

        // Add attractive forces between connected nodes
        for (source, target) in graph.edges() {
            let trans = positions[source].sub_position(positions[target]);
            // Pulls along the edge with magnitude spring_constant * length
            let pull = trans.scale(self.spring_constant);
            forces[source] = forces[source].sub_position(pull);
            forces[target] = forces[target].add_position(pull);
        }

        forces
    }
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let mut positions: Vec<Position> = graph
            .positions()
            .iter()
            .map(|p| Position::planar(p.x(), p.y()))
            .collect();
        let mut velocities = vec![Position::ORIGIN; positions.len()];
        let mut temperature = self.annealing.map(|a| a.initial_temperature);
        let mut cancelled = false;
        let mut iterations = 0;

        if positions.len() < 2 {
            return Ok(Placement::complete(positions));
        }

        for _ in 0..self.iterations {
            let forces = self.forces(graph, &positions);
            let mut max_force: f64 = 0.0;

            for (i, force) in forces.iter().enumerate() {
                max_force = max_force.max(force.hypot());
                let mut velocity = velocities[i].add_position(*force).scale(self.damping_factor);
                if let Some(limit) = temperature {
                    let speed = velocity.hypot();
                    if speed > limit {
                        velocity = velocity.scale(limit / speed);
                    }
                }
                velocities[i] = velocity;
                positions[i] = positions[i].add_position(velocity);
            }

            iterations += 1;
            if let (Some(t), Some(annealing)) = (temperature.as_mut(), self.annealing) {
                *t *= annealing.cooling_factor;
            }
            if max_force < self.convergence_threshold {
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        debug!(
            iterations = iterations,
            annealed = self.annealing.is_some(),
            cancelled = cancelled;
            "Force simulation finished"
        );
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

    fn two_connected(distance: f64) -> EffectiveGraph {
        let mut graph = Graph::new();
        graph.add_node(Node::new(Id::new("a"))).unwrap();
        graph
            .add_node(Node::new(Id::new("b")).with_position(Position::planar(distance, 0.0)))
            .unwrap();
        graph
            .add_edge(Edge::new(Id::new("e0"), Id::new("a"), Id::new("b")))
            .unwrap();
        EffectiveGraph::new(&graph, false)
    }

    #[test]
    fn test_spring_settles_near_equilibrium() {
        let graph = two_connected(30.0);
        let mut engine = Engine::spring(&SpringConfig::default());
        engine.set_iterations(2_000);

        let placement = engine.calculate(&graph, &CancelToken::new()).unwrap();
        let distance = placement.positions[0].distance_2d(placement.positions[1]);
        // repulsion / d^2 == spring * d  =>  d^3 == 10_000 / 0.01
        assert!((distance - 100.0).abs() < 5.0, "distance {distance}");
    }

    #[test]
    fn test_spring_is_deterministic() {
        let graph = two_connected(10.0);
        let engine = Engine::spring(&SpringConfig::default());
        let first = engine.calculate(&graph, &CancelToken::new()).unwrap();
        let second = engine.calculate(&graph, &CancelToken::new()).unwrap();
        assert_eq!(first.positions, second.positions);
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let graph = two_connected(0.0);
        let engine = Engine::spring(&SpringConfig::default());
        let placement = engine.calculate(&graph, &CancelToken::new()).unwrap();
        assert!(placement.positions[0].distance_2d(placement.positions[1]) > 1.0);
    }

    #[test]
    fn test_organic_displacement_bounded_by_temperature() {
        let graph = two_connected(0.0);
        let spring = SpringConfig::default();
        let mut engine = Engine::organic(
            &spring,
            &OrganicConfig {
                iterations: 1,
                initial_temperature: 5.0,
                cooling_factor: 0.9,
            },
        );
        engine.set_iterations(1);

        let placement = engine.calculate(&graph, &CancelToken::new()).unwrap();
        for position in &placement.positions {
            assert!(position.hypot() <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn test_cancelled_run_still_makes_progress() {
        let graph = two_connected(10.0);
        let mut engine = Engine::spring(&SpringConfig::default());
        engine.set_iterations(1_000_000);
        let cancel = CancelToken::new();
        cancel.cancel();

        let placement = engine.calculate(&graph, &cancel).unwrap();
        assert!(placement.cancelled);
        assert_ne!(placement.positions[1], Position::planar(10.0, 0.0));
    }
}
