//! Parser for graph description tokens.
//!
//! Turns the significant tokens from the [`lexer`](super::lexer) into a
//! [`Document`]. The entry point is [`build_document`]; trivia tokens must be
//! removed beforehand.

use winnow::{
    Parser as _,
    combinator::{alt, opt},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types::{
        Attribute, AttributeTarget, Document, EdgeOp, EdgeOperand, Statement, Subgraph,
    },
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context attached to parser errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what the parser expected
    Label(&'static str),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

fn cut_error(label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    ErrMode::Cut(e)
}

fn peek<'src>(input: &Input<'src>) -> Option<&'src Token<'src>> {
    input.peek_token().map(|t| &t.token)
}

/// Match one specific token, returning its span.
fn punct<'src>(
    expected: Token<'static>,
    label: &'static str,
) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify_map(|t: &'src PositionedToken<'src>| (t.token == expected).then_some(t.span))
            .context(Context::Label(label))
            .parse_next(input)
    }
}

/// A single identifier token, flagged when it was a quoted string.
fn id_token<'src>(input: &mut Input<'src>) -> IResult<(Spanned<String>, bool)> {
    any.verify_map(|t: &'src PositionedToken<'src>| match &t.token {
        Token::Identifier(s) | Token::Numeral(s) => Some((Spanned::new(s.to_string(), t.span), false)),
        Token::StringLiteral(s) => Some((Spanned::new(s.clone(), t.span), true)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// Parse an ID: identifier, numeral or quoted string.
///
/// Quoted strings may be concatenated with `+`: `"a" + "b"`.
fn id<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    let (first, quoted) = id_token.parse_next(input)?;
    if !quoted {
        return Ok(first);
    }

    let mut span = first.span();
    let mut value = first.into_inner();
    while matches!(peek(input), Some(Token::Plus)) {
        input.next_token();
        let (next, quoted) = id_token.parse_next(input).map_err(|_| cut_error("string literal after `+`"))?;
        if !quoted {
            return Err(cut_error("string literal after `+`"));
        }
        span = span.union(next.span());
        value.push_str(next.inner());
    }
    Ok(Spanned::new(value, span))
}

/// Skip an optional port suffix (`:n`, `:p:sw`). Ports carry no meaning here.
fn port<'src>(input: &mut Input<'src>) -> IResult<()> {
    for _ in 0..2 {
        if !matches!(peek(input), Some(Token::Colon)) {
            break;
        }
        input.next_token();
        id.parse_next(input)
            .map_err(|_| cut_error("port after `:`"))?;
    }
    Ok(())
}

fn node_id<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    let node = id.parse_next(input)?;
    port(input)?;
    Ok(node)
}

/// Zero or more `[k=v, k=v; ...]` lists, flattened in order.
fn attribute_lists<'src>(input: &mut Input<'src>) -> IResult<Vec<Attribute>> {
    let mut attributes = Vec::new();
    while matches!(peek(input), Some(Token::LeftBracket)) {
        input.next_token();
        loop {
            if matches!(peek(input), Some(Token::RightBracket)) {
                input.next_token();
                break;
            }
            let key = id
                .parse_next(input)
                .map_err(|_| cut_error("attribute name or `]`"))?;
            punct(Token::Equals, "`=` after attribute name")
                .parse_next(input)
                .map_err(|_| cut_error("`=` after attribute name"))?;
            let value = id
                .parse_next(input)
                .map_err(|_| cut_error("attribute value"))?;
            attributes.push(Attribute { key, value });

            if matches!(peek(input), Some(Token::Comma | Token::Semicolon)) {
                input.next_token();
            }
        }
    }
    Ok(attributes)
}

fn edge_op<'src>(input: &mut Input<'src>) -> IResult<Spanned<EdgeOp>> {
    any.verify_map(|t: &'src PositionedToken<'src>| match t.token {
        Token::DirectedEdge => Some(Spanned::new(EdgeOp::Directed, t.span)),
        Token::UndirectedEdge => Some(Spanned::new(EdgeOp::Undirected, t.span)),
        _ => None,
    })
    .context(Context::Label("edge operator"))
    .parse_next(input)
}

/// `[subgraph [ID]] { statements }`
fn subgraph<'src>(input: &mut Input<'src>) -> IResult<Subgraph> {
    let name = if matches!(peek(input), Some(Token::Subgraph)) {
        punct(Token::Subgraph, "`subgraph`").parse_next(input)?;
        opt(id).parse_next(input)?
    } else {
        None
    };

    punct(Token::LeftBrace, "`{`")
        .parse_next(input)
        .map_err(|_| cut_error("`{` opening the subgraph"))?;
    let statements = statement_list(input)?;
    punct(Token::RightBrace, "`}`")
        .parse_next(input)
        .map_err(|_| cut_error("`}` closing the subgraph"))?;

    Ok(Subgraph { name, statements })
}

fn edge_operand<'src>(input: &mut Input<'src>) -> IResult<EdgeOperand> {
    match peek(input) {
        Some(Token::Subgraph | Token::LeftBrace) => subgraph.map(EdgeOperand::Subgraph).parse_next(input),
        _ => node_id
            .map(EdgeOperand::Node)
            .parse_next(input)
            .map_err(|_| cut_error("node or subgraph after edge operator")),
    }
}

/// Finish an edge statement whose first operand is already parsed.
fn edge_statement<'src>(input: &mut Input<'src>, first: EdgeOperand) -> IResult<Statement> {
    let mut operands = vec![first];
    let mut ops = Vec::new();
    while let Some(op) = opt(edge_op).parse_next(input)? {
        ops.push(op);
        operands.push(edge_operand(input)?);
    }
    let attributes = attribute_lists(input)?;
    Ok(Statement::Edge {
        operands,
        ops,
        attributes,
    })
}

fn is_edge_op(token: Option<&Token<'_>>) -> bool {
    matches!(token, Some(Token::DirectedEdge | Token::UndirectedEdge))
}

fn attribute_statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let target = alt((
        punct(Token::Graph, "`graph`").value(AttributeTarget::Graph),
        punct(Token::Node, "`node`").value(AttributeTarget::Node),
        punct(Token::Edge, "`edge`").value(AttributeTarget::Edge),
    ))
    .parse_next(input)?;

    if !matches!(peek(input), Some(Token::LeftBracket)) {
        return Err(cut_error("`[` after attribute statement keyword"));
    }
    let attributes = attribute_lists(input)?;
    Ok(Statement::Attributes { target, attributes })
}

fn statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    match peek(input) {
        Some(Token::Graph | Token::Node | Token::Edge) => attribute_statement(input),
        Some(Token::Subgraph | Token::LeftBrace) => {
            let subgraph = subgraph(input)?;
            if is_edge_op(peek(input)) {
                edge_statement(input, EdgeOperand::Subgraph(subgraph))
            } else {
                Ok(Statement::Subgraph(subgraph))
            }
        }
        Some(token) if token.is_id() => {
            let first = id(input)?;
            if matches!(peek(input), Some(Token::Equals)) {
                input.next_token();
                let value = id
                    .parse_next(input)
                    .map_err(|_| cut_error("value after `=`"))?;
                return Ok(Statement::Assignment(Attribute { key: first, value }));
            }

            port(input)?;

            if is_edge_op(peek(input)) {
                edge_statement(input, EdgeOperand::Node(first))
            } else {
                let attributes = attribute_lists(input)?;
                Ok(Statement::Node {
                    id: first,
                    attributes,
                })
            }
        }
        _ => Err(cut_error("statement")),
    }
}

/// Statements up to (not including) the closing `}`. Semicolons are optional.
fn statement_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Statement>> {
    let mut statements = Vec::new();
    loop {
        match peek(input) {
            None | Some(Token::RightBrace) => return Ok(statements),
            Some(Token::Semicolon) => {
                input.next_token();
            }
            Some(_) => statements.push(statement(input)?),
        }
    }
}

/// `[strict] (graph | digraph) [ID] { statements }`
///
/// `strict` is accepted and ignored: repeated edges are kept either way.
fn document<'src>(input: &mut Input<'src>) -> IResult<Document> {
    opt(punct(Token::Strict, "`strict`")).parse_next(input)?;
    let directed = alt((
        punct(Token::Graph, "`graph`").value(false),
        punct(Token::Digraph, "`digraph`").value(true),
    ))
    .context(Context::Label("`graph` or `digraph`"))
    .parse_next(input)?;
    let name = opt(id).parse_next(input)?;

    punct(Token::LeftBrace, "`{`")
        .parse_next(input)
        .map_err(|_| cut_error("`{` opening the graph body"))?;
    let statements = statement_list(input)?;
    punct(Token::RightBrace, "`}`")
        .parse_next(input)
        .map_err(|_| cut_error("`}` closing the graph body"))?;

    Ok(Document {
        directed,
        name,
        statements,
    })
}

fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    remaining: usize,
) -> Diagnostic {
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().map(|Context::Label(label)| *label).last(),
        ErrMode::Incomplete(_) => None,
    };
    let index = tokens.len().saturating_sub(remaining);

    match tokens.get(index) {
        Some(found) => {
            let message = match expected {
                Some(expected) => format!("expected {expected}, found {}", found.token),
                None => format!("unexpected {}", found.token),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(found.span, "unexpected token")
        }
        None => {
            let end = tokens.last().map_or(Span::default(), |t| Span::new(t.span.end()..t.span.end()));
            let message = match expected {
                Some(expected) => format!("unexpected end of input, expected {expected}"),
                None => "unexpected end of input".to_string(),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(end, "input ends here")
                .with_help("check for a missing `}`")
        }
    }
}

/// Build a [`Document`] from significant (non-trivia) tokens.
pub fn build_document<'src>(tokens: &'src [PositionedToken<'src>]) -> Result<Document, Diagnostic> {
    let mut slice = TokenSlice::new(tokens);

    match document.parse_next(&mut slice) {
        Ok(document) => match slice.peek_token() {
            Some(extra) => Err(Diagnostic::error(format!(
                "unexpected {} after the end of the graph",
                extra.token
            ))
            .with_code(ErrorCode::E102)
            .with_label(extra.span, "trailing input")
            .with_help("a file holds exactly one graph")),
            None => Ok(document),
        },
        Err(e) => Err(convert_error(e, tokens, slice.eof_offset())),
    }
}
