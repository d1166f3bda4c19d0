//! Tokens of the graph description language.

use std::fmt;

use crate::span::Span;

/// A lexical token.
///
/// Keywords are matched case-insensitively, as the language defines them.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    // Keywords
    Strict,
    Graph,
    Digraph,
    Subgraph,
    Node,
    Edge,

    /// Alphanumeric identifier, not starting with a digit.
    Identifier(&'a str),
    /// Numeral such as `12`, `-3.5` or `.25`.
    Numeral(&'a str),
    /// Double-quoted string with escapes resolved.
    StringLiteral(String),

    /// `->`
    DirectedEdge,
    /// `--`
    UndirectedEdge,

    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Equals,
    Semicolon,
    Comma,
    Colon,
    Plus,

    Whitespace,
    Newline,
    LineComment(&'a str),
    BlockComment(&'a str),
}

impl Token<'_> {
    /// Whitespace and comments, which the parser never sees.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_) | Token::BlockComment(_)
        )
    }

    /// Tokens that can serve as an identifier.
    pub fn is_id(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_) | Token::Numeral(_) | Token::StringLiteral(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Strict => f.write_str("`strict`"),
            Token::Graph => f.write_str("`graph`"),
            Token::Digraph => f.write_str("`digraph`"),
            Token::Subgraph => f.write_str("`subgraph`"),
            Token::Node => f.write_str("`node`"),
            Token::Edge => f.write_str("`edge`"),
            Token::Identifier(name) => write!(f, "identifier `{name}`"),
            Token::Numeral(value) => write!(f, "numeral `{value}`"),
            Token::StringLiteral(_) => f.write_str("string literal"),
            Token::DirectedEdge => f.write_str("`->`"),
            Token::UndirectedEdge => f.write_str("`--`"),
            Token::LeftBrace => f.write_str("`{`"),
            Token::RightBrace => f.write_str("`}`"),
            Token::LeftBracket => f.write_str("`[`"),
            Token::RightBracket => f.write_str("`]`"),
            Token::Equals => f.write_str("`=`"),
            Token::Semicolon => f.write_str("`;`"),
            Token::Comma => f.write_str("`,`"),
            Token::Colon => f.write_str("`:`"),
            Token::Plus => f.write_str("`+`"),
            Token::Whitespace | Token::Newline => f.write_str("whitespace"),
            Token::LineComment(_) | Token::BlockComment(_) => f.write_str("comment"),
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}
