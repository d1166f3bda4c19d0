//! Parser AST types.
//!
//! Leaf values are wrapped in [`Spanned<T>`] so later phases can point
//! diagnostics at the exact source text. Identifiers are kept as strings
//! here; interning happens when the graph is built.

use crate::span::Spanned;

/// A whole graph document: `[strict] (graph | digraph) [ID] { ... }`.
#[derive(Debug, Clone)]
pub struct Document {
    /// `digraph` header rather than `graph`.
    pub directed: bool,
    pub name: Option<Spanned<String>>,
    pub statements: Vec<Statement>,
}

/// A `key = value` pair, either inside `[...]` or as a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: Spanned<String>,
    pub value: Spanned<String>,
}

/// Which default set an attribute statement changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    Graph,
    Node,
    Edge,
}

/// Edge operator as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOp {
    /// `->`
    Directed,
    /// `--`
    Undirected,
}

#[derive(Debug, Clone)]
pub enum Statement {
    /// `id [attrs]`
    Node {
        id: Spanned<String>,
        attributes: Vec<Attribute>,
    },
    /// `a -> b -> { c d } [attrs]`
    Edge {
        operands: Vec<EdgeOperand>,
        /// `ops[i]` joins `operands[i]` and `operands[i + 1]`.
        ops: Vec<Spanned<EdgeOp>>,
        attributes: Vec<Attribute>,
    },
    /// `graph [attrs]`, `node [attrs]` or `edge [attrs]`
    Attributes {
        target: AttributeTarget,
        attributes: Vec<Attribute>,
    },
    /// `key = value` at statement level, a graph attribute.
    Assignment(Attribute),
    Subgraph(Subgraph),
}

#[derive(Debug, Clone)]
pub enum EdgeOperand {
    Node(Spanned<String>),
    Subgraph(Subgraph),
}

/// `[subgraph [ID]] { ... }`
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: Option<Spanned<String>>,
    pub statements: Vec<Statement>,
}
