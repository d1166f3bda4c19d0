//! Error types for Trellis operations.
//!
//! [`TrellisError`] is the umbrella type returned by the host-facing API.
//! [`LayoutError`] covers the failures of a layout request on its own.

use std::io;

use thiserror::Error;

use trellis_core::{error::GraphError, identifier::Id};
use trellis_dot::ParseError;

/// Reasons a layout request produces no assignment at all.
///
/// Numerical divergence is not an error: it is reported per node inside the
/// [`PositionAssignment`](crate::layout::PositionAssignment).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("unknown layout algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("a layout is already running for this document")]
    Busy,

    #[error("edge cycle through `{node}` cannot be layered")]
    Cycle { node: Id },

    #[error("layout worker could not be started or stopped without a result")]
    Disconnected,
}

/// The main error type for Trellis operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the parse error so the
/// caller can render labelled snippets.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrellisError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
