//! # Trellis DOT codec
//!
//! Reads and writes graphs in a subset of the DOT language, extended with
//! reserved `_`-prefixed attributes that carry node positions, container
//! expansion state and layout advisory data.
//!
//! ## Usage
//!
//! ```
//! # use trellis_dot::{parse, serialize, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         digraph {
//!             subgraph cluster_services {
//!                 api [_x="5", _y="0"];
//!                 db [_x="5", _y="4"];
//!             }
//!             client [_x="0", _y="2"];
//!             client -> api;
//!             api -> db;
//!         }
//!     "#;
//!
//!     let graph = parse(source)?;
//!     assert_eq!(graph.node_count(), 4);
//!     let text = serialize(&graph);
//!     assert!(text.contains("subgraph cluster_services"));
//!     Ok(())
//! }
//! ```
//!
//! Coordinates in the text are multiplied by [`SCALE_FACTOR`] on import and
//! divided by it on export.

mod builder;
pub mod error;
mod keys;
mod lexer;
mod parser;
mod parser_types;
mod serializer;
mod span;
mod tokens;

pub use error::ParseError;
pub use serializer::DotWriter;
pub use span::Span;

use log::debug;

use trellis_core::graph::Graph;

use builder::Builder;

/// Factor between coordinates in the text and coordinates in the model.
pub const SCALE_FACTOR: f64 = 20.0;

/// Subgraph name prefix marking a container block, matched ignoring case.
pub const CLUSTER_PREFIX: &str = "cluster";

/// Parse DOT text into a [`Graph`].
///
/// The pipeline runs in three steps:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the statement tree from the significant tokens
/// 3. **Build** - Resolve clusters, defaults and reserved attributes
///
/// # Errors
///
/// Returns a [`ParseError`] with every diagnostic found, each carrying a
/// resolved line and column. No graph is returned on error.
pub fn parse(source: &str) -> Result<Graph, ParseError> {
    parse_unlocated(source).map_err(|err| err.locate(source))
}

fn parse_unlocated(source: &str) -> Result<Graph, ParseError> {
    let tokens: Vec<_> = lexer::tokenize(source)?
        .into_iter()
        .filter(|token| !token.token.is_trivia())
        .collect();
    debug!(tokens = tokens.len(); "Tokenized graph text");

    let document = parser::build_document(&tokens)?;
    Builder::new().build(&document)
}

/// Serialize a [`Graph`] to DOT text.
pub fn serialize(graph: &Graph) -> String {
    DotWriter::new(graph).to_string()
}
