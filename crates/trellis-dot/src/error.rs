//! Diagnostics for malformed graph text.
//!
//! Every phase of [`parse`](crate::parse) (lexing, parsing, graph
//! construction) reports problems as [`Diagnostic`]s carrying an
//! [`ErrorCode`], labelled byte spans and an optional help text. A phase
//! collects as many diagnostics as it can before failing, and the caller
//! receives them all inside one [`ParseError`] with line/column
//! [`Location`]s resolved against the source text.
//!
//! ```
//! # use trellis_dot::error::{Diagnostic, ErrorCode};
//! # use trellis_dot::Span;
//! let diag = Diagnostic::error("edge references undeclared node `b`")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(12..13), "not declared")
//!     .with_help("declare `b` with a node statement");
//! assert_eq!(diag.to_string(), "error[E200]: edge references undeclared node `b`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod location;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use location::Location;
pub use parse_error::ParseError;
pub use severity::Severity;
