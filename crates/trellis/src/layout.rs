//! Layout computation.
//!
//! A layout runs against an [`EffectiveGraph`]: the nodes whose positions an
//! algorithm may choose, in ascending id order, with edges redirected onto
//! them. The result is a [`PositionAssignment`] that [`commit`] applies to the
//! graph in a single step.
//!
//! Layouts never touch the graph themselves. Container positions follow from
//! the committed child positions.

mod effective;
mod engines;

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Deserialize;

use trellis_core::{
    command::Command, error::GraphError, geometry::Position, graph::Graph, identifier::Id,
};

use crate::{
    config::{CompactConfig, LayeredConfig, LayoutConfig, OrganicConfig, SpacingConfig, SpringConfig},
    error::LayoutError,
};

pub(crate) use effective::EffectiveGraph;
use engines::EngineBuilder;

/// The available layout algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Spring,
    Circle,
    Tree,
    Grid,
    Random,
    Radial,
    Layered,
    Organic,
    Compact,
}

impl Algorithm {
    /// Every algorithm, in listing order.
    pub const ALL: [Algorithm; 9] = [
        Algorithm::Spring,
        Algorithm::Circle,
        Algorithm::Tree,
        Algorithm::Grid,
        Algorithm::Random,
        Algorithm::Radial,
        Algorithm::Layered,
        Algorithm::Organic,
        Algorithm::Compact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Spring => "spring",
            Algorithm::Circle => "circle",
            Algorithm::Tree => "tree",
            Algorithm::Grid => "grid",
            Algorithm::Random => "random",
            Algorithm::Radial => "radial",
            Algorithm::Layered => "layered",
            Algorithm::Organic => "organic",
            Algorithm::Compact => "compact",
        }
    }
}

impl FromStr for Algorithm {
    type Err = LayoutError;

    /// Names match ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LayoutError::UnknownAlgorithm(s.to_string()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunables for a single layout run.
#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    respect_collapsed_containers: bool,
    pub spring: SpringConfig,
    pub organic: OrganicConfig,
    pub compact: CompactConfig,
    pub layered: LayeredConfig,
    pub spacing: SpacingConfig,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every collapsed container as one opaque node.
    pub fn with_respect_collapsed_containers(mut self, respect: bool) -> Self {
        self.respect_collapsed_containers = respect;
        self
    }

    pub fn respect_collapsed_containers(&self) -> bool {
        self.respect_collapsed_containers
    }
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            respect_collapsed_containers: config.respect_collapsed_containers(),
            spring: config.spring.clone(),
            organic: config.organic.clone(),
            compact: config.compact.clone(),
            layered: config.layered.clone(),
            spacing: config.spacing.clone(),
        }
    }
}

/// Shared cancellation flag, checked by iterative algorithms between
/// iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Non-fatal findings attached to a [`PositionAssignment`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutDiagnostic {
    /// The algorithm produced a non-finite coordinate for `node`, which keeps
    /// its previous position.
    AlgorithmDivergence { node: Id },
}

impl fmt::Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDiagnostic::AlgorithmDivergence { node } => {
                write!(f, "layout diverged at node `{node}`; its position was kept")
            }
        }
    }
}

/// Proposed positions produced by one layout run.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAssignment {
    algorithm: Algorithm,
    positions: IndexMap<Id, Position>,
    diagnostics: Vec<LayoutDiagnostic>,
    cancelled: bool,
}

impl PositionAssignment {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// New positions by node id. A collapsed container treated as opaque
    /// appears under its own id and moves its subtree rigidly on commit.
    pub fn positions(&self) -> &IndexMap<Id, Position> {
        &self.positions
    }

    pub fn get(&self, id: Id) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if the run stopped early because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Names of every algorithm, in listing order.
pub fn list_algorithms() -> Vec<&'static str> {
    Algorithm::ALL.into_iter().map(Algorithm::name).collect()
}

/// Runs `algorithm` over `graph` without modifying it.
///
/// # Errors
///
/// Returns [`LayoutError::Cycle`] from `layered` when cycle breaking is
/// disabled and the effective graph has a cycle.
pub fn compute(
    graph: &Graph,
    algorithm: Algorithm,
    options: &LayoutOptions,
    cancel: &CancelToken,
) -> Result<PositionAssignment, LayoutError> {
    let effective = EffectiveGraph::new(graph, options.respect_collapsed_containers());
    info!(
        algorithm = algorithm.name(),
        nodes = effective.len(),
        edges = effective.edge_count();
        "Computing layout"
    );

    let mut builder = EngineBuilder::new(options);
    let placement = builder.engine(algorithm).calculate(&effective, cancel)?;

    let mut positions = IndexMap::with_capacity(effective.len());
    let mut diagnostics = Vec::new();
    for (index, id) in effective.ids().enumerate() {
        let before = effective.positions()[index];
        let proposed = placement.positions[index];
        if proposed.x().is_finite() && proposed.y().is_finite() {
            positions.insert(id, Position::new(proposed.x(), proposed.y(), before.z()));
        } else {
            warn!(node:% = id, algorithm = algorithm.name(); "Layout diverged, keeping position");
            diagnostics.push(LayoutDiagnostic::AlgorithmDivergence { node: id });
        }
    }

    debug!(
        positioned = positions.len(),
        diverged = diagnostics.len(),
        cancelled = placement.cancelled;
        "Layout computed"
    );
    Ok(PositionAssignment {
        algorithm,
        positions,
        diagnostics,
        cancelled: placement.cancelled,
    })
}

/// Applies `assignment` to `graph` in one step and records the algorithm as
/// the graph's last layout.
///
/// # Errors
///
/// Returns a [`GraphError`] if a node of the assignment no longer exists.
/// The graph is unchanged in that case.
pub fn commit(graph: &mut Graph, assignment: &PositionAssignment) -> Result<Command, GraphError> {
    let undo = graph.set_positions(
        assignment
            .positions
            .iter()
            .map(|(id, position)| (*id, *position)),
    )?;
    graph.advisory_mut().last_layout = Some(assignment.algorithm.name().to_string());
    info!(algorithm = assignment.algorithm.name(); "Layout committed");
    Ok(undo)
}

#[cfg(test)]
mod tests {
    use trellis_core::{edge::Edge, node::Node};

    use super::*;

    fn path_graph(n: usize) -> Graph {
        let mut graph = Graph::new();
        for i in 0..n {
            graph.add_node(Node::new(Id::new(&format!("n{i}")))).unwrap();
        }
        for i in 1..n {
            let edge = Edge::new(
                graph.next_edge_id(),
                Id::new(&format!("n{}", i - 1)),
                Id::new(&format!("n{i}")),
            );
            graph.add_edge(edge).unwrap();
        }
        graph
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
        }
        assert_eq!(" Spring ".parse::<Algorithm>(), Ok(Algorithm::Spring));
    }

    #[test]
    fn test_unknown_algorithm() {
        assert_eq!(
            "hyperbolic".parse::<Algorithm>(),
            Err(LayoutError::UnknownAlgorithm("hyperbolic".to_string()))
        );
    }

    #[test]
    fn test_list_algorithms_order() {
        assert_eq!(
            list_algorithms(),
            vec![
                "spring", "circle", "tree", "grid", "random", "radial", "layered", "organic",
                "compact"
            ]
        );
    }

    #[test]
    fn test_every_algorithm_positions_every_node() {
        let graph = path_graph(6);
        for algorithm in Algorithm::ALL {
            let assignment =
                compute(&graph, algorithm, &LayoutOptions::new(), &CancelToken::new()).unwrap();
            assert_eq!(assignment.positions().len(), 6, "{algorithm}");
            assert!(assignment.diagnostics().is_empty(), "{algorithm}");
            assert!(
                assignment.positions().values().all(|p| p.is_finite()),
                "{algorithm}"
            );
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new();
        for algorithm in Algorithm::ALL {
            let assignment =
                compute(&graph, algorithm, &LayoutOptions::new(), &CancelToken::new()).unwrap();
            assert!(assignment.positions().is_empty());
        }
    }

    #[test]
    fn test_z_is_preserved() {
        let mut graph = Graph::new();
        graph
            .add_node(Node::new(Id::new("a")).with_position(Position::new(0.0, 0.0, 40.0)))
            .unwrap();
        let assignment =
            compute(&graph, Algorithm::Circle, &LayoutOptions::new(), &CancelToken::new()).unwrap();
        assert_eq!(assignment.get(Id::new("a")).map(Position::z), Some(40.0));
    }

    #[test]
    fn test_divergence_freezes_node() {
        let mut graph = path_graph(3);
        graph
            .move_node(Id::new("n1"), Position::planar(30.0, 10.0))
            .unwrap();
        let mut options = LayoutOptions::new();
        options.spring.repulsion_constant = f64::INFINITY;

        let assignment =
            compute(&graph, Algorithm::Spring, &options, &CancelToken::new()).unwrap();
        assert_eq!(assignment.diagnostics().len(), 3);
        assert!(assignment.positions().is_empty());

        let before: Vec<Position> = graph.nodes().map(|n| n.position()).collect();
        commit(&mut graph, &assignment).unwrap();
        let after: Vec<Position> = graph.nodes().map(|n| n.position()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_commit_records_last_layout_and_undoes() {
        let mut graph = path_graph(4);
        let assignment =
            compute(&graph, Algorithm::Grid, &LayoutOptions::new(), &CancelToken::new()).unwrap();

        let undo = commit(&mut graph, &assignment).unwrap();
        assert_eq!(graph.advisory().last_layout.as_deref(), Some("grid"));
        assert_eq!(
            graph.node(Id::new("n3")).map(|n| n.position()),
            assignment.get(Id::new("n3"))
        );

        undo.apply(&mut graph).unwrap();
        assert!(graph.nodes().all(|n| n.position() == Position::ORIGIN));
    }
}
