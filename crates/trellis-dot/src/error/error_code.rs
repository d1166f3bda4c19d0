//! Error codes for graph text diagnostics.
//!
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Graph construction errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    E002,

    /// Unterminated block comment.
    ///
    /// A `/*` comment was opened but never closed with `*/`.
    E003,

    /// Unexpected token.
    E100,

    /// Unexpected end of input, typically an unbalanced `{`.
    E101,

    /// Input continues after the closing brace of the graph.
    E102,

    /// An edge references a node that is never declared.
    E200,

    /// Subgraph nesting would make a container its own ancestor.
    E201,

    /// Two edges share the same `_edge_id`.
    E202,

    /// Edge operator does not match the graph kind (`--` in a `digraph`,
    /// `->` in a `graph`).
    E203,

    /// A reserved attribute has a value that cannot be interpreted.
    E204,

    /// A cluster and a plain node use the same identifier.
    E205,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated block comment",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "trailing input",
            ErrorCode::E200 => "undeclared node",
            ErrorCode::E201 => "containment cycle",
            ErrorCode::E202 => "duplicate edge id",
            ErrorCode::E203 => "edge operator mismatch",
            ErrorCode::E204 => "invalid attribute value",
            ErrorCode::E205 => "cluster id conflict",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E101.to_string(), "E101");
        assert_eq!(ErrorCode::E205.to_string(), "E205");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E200.description(), "undeclared node");
        assert_eq!(ErrorCode::E201.description(), "containment cycle");
    }
}
