//! Layout recommendations from graph topology.
//!
//! Suggestions come from three groups:
//!
//! 1. at most [`SMALL_GRAPH`] nodes: `circle`, `grid`, `tree`
//! 2. density above [`DENSE`]: `spring`, `organic`, `compact`
//! 3. when neither of the above applies: `tree`, `layered`, `radial`
//!
//! The small and dense groups may both apply; they are concatenated in that
//! order without repeats.
//!
//! Nothing here is cached implicitly. [`refresh`] is the only way the
//! advisory fields of a [`Graph`] are brought up to date.

use log::debug;

use trellis_core::graph::Graph;

use crate::layout::Algorithm;

/// Node count up to which the small-graph group applies.
pub const SMALL_GRAPH: usize = 10;

/// Density above which a graph counts as dense.
pub const DENSE: f64 = 0.3;

/// Edge count over the edge count of a complete undirected simple graph
/// with the same node count. Zero for fewer than two nodes.
///
/// ```
/// # use trellis::advisor::density;
/// # use trellis_core::graph::Graph;
/// assert_eq!(density(&Graph::new()), 0.0);
/// ```
pub fn density(graph: &Graph) -> f64 {
    let nodes = graph.node_count();
    if nodes < 2 {
        return 0.0;
    }
    let possible = (nodes * (nodes - 1)) as f64 / 2.0;
    graph.edge_count() as f64 / possible
}

/// Ordered algorithm suggestions for `graph`.
pub fn suggest(graph: &Graph) -> Vec<Algorithm> {
    suggest_for(graph.node_count(), density(graph))
}

fn suggest_for(nodes: usize, density: f64) -> Vec<Algorithm> {
    let mut groups: Vec<[Algorithm; 3]> = Vec::with_capacity(2);
    if nodes <= SMALL_GRAPH {
        groups.push([Algorithm::Circle, Algorithm::Grid, Algorithm::Tree]);
    }
    if density > DENSE {
        groups.push([Algorithm::Spring, Algorithm::Organic, Algorithm::Compact]);
    }
    if groups.is_empty() {
        groups.push([Algorithm::Tree, Algorithm::Layered, Algorithm::Radial]);
    }

    let mut suggestions: Vec<Algorithm> = Vec::with_capacity(6);
    for algorithm in groups.into_iter().flatten() {
        if !suggestions.contains(&algorithm) {
            suggestions.push(algorithm);
        }
    }
    suggestions
}

/// Recomputes density and suggestions and stores them on `graph`.
pub fn refresh(graph: &mut Graph) -> Vec<Algorithm> {
    let density = density(graph);
    let suggestions = suggest_for(graph.node_count(), density);
    debug!(density = density, suggestions:? = suggestions; "Advisory refreshed");

    let advisory = graph.advisory_mut();
    advisory.density = Some(density);
    advisory.suggested_layouts = suggestions.iter().map(|a| a.name().to_string()).collect();
    suggestions
}
