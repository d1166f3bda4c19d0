//! Trellis - layout and DOT interchange for hierarchical graph editors.
//!
//! The crate ties the graph model of `trellis-core` and the DOT codec of
//! `trellis-dot` to the layout algorithms and the layout advisor. A host
//! either calls the free functions below directly or owns a [`Document`],
//! which runs layouts on a worker thread and commits them atomically.
//!
//! # Examples
//!
//! ```rust
//! use trellis::{LayoutOptions, apply_layout, export_text, import_text};
//!
//! let mut graph = import_text("digraph { a; b; c; a -> b; a -> c; }").expect("valid DOT");
//! let assignment = apply_layout(&graph, "tree", &LayoutOptions::default())
//!     .expect("known algorithm");
//! trellis::layout::commit(&mut graph, &assignment).expect("nodes still exist");
//!
//! assert!(export_text(&graph).contains("_last_layout=\"tree\""));
//! ```

pub mod advisor;
pub mod config;
pub mod layout;

mod document;
mod error;

pub use trellis_core::{command, edge, geometry, graph, hierarchy, identifier, node};
pub use trellis_dot::{ParseError, SCALE_FACTOR};

pub use document::{BusyPolicy, Document, LayoutJob};
pub use error::{LayoutError, TrellisError};
pub use layout::{
    Algorithm, CancelToken, LayoutDiagnostic, LayoutOptions, PositionAssignment, list_algorithms,
};

use log::{debug, info};

use graph::Graph;

/// Parses DOT text into a graph.
///
/// # Errors
///
/// Returns [`TrellisError::Parse`] with the source attached, so every
/// diagnostic can be rendered against it.
pub fn import_text(text: &str) -> Result<Graph, TrellisError> {
    info!("Importing graph");
    let graph = trellis_dot::parse(text).map_err(|err| TrellisError::new_parse_error(err, text))?;
    debug!(nodes = graph.node_count(), edges = graph.edge_count(); "Graph imported");
    Ok(graph)
}

/// Serializes `graph` to DOT text.
pub fn export_text(graph: &Graph) -> String {
    info!(nodes = graph.node_count(), edges = graph.edge_count(); "Exporting graph");
    trellis_dot::serialize(graph)
}

/// Computes a layout by algorithm name without modifying `graph`.
///
/// The computation runs on the calling thread and cannot be cancelled; use
/// [`Document::start_layout`] for a cancellable run.
///
/// # Errors
///
/// [`LayoutError::UnknownAlgorithm`] for an unrecognised name, or the
/// algorithm's own failure.
pub fn apply_layout(
    graph: &Graph,
    name: &str,
    options: &LayoutOptions,
) -> Result<PositionAssignment, LayoutError> {
    let algorithm: Algorithm = name.parse()?;
    layout::compute(graph, algorithm, options, &CancelToken::new())
}

/// Ordered names of the algorithms the advisor recommends for `graph`.
pub fn suggest_layouts(graph: &Graph) -> Vec<&'static str> {
    advisor::suggest(graph)
        .into_iter()
        .map(Algorithm::name)
        .collect()
}
