//! Lexical analyzer for graph description text.
//!
//! [`tokenize`] turns source text into [`PositionedToken`]s, recovering from
//! errors by skipping a character so that every lexical problem in the input
//! is reported in one pass.

use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, cut_err, opt, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, literal, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Piece of a quoted string body.
enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
    /// A backslash followed by a character with no escape meaning; both are kept.
    Verbatim(char),
    /// A backslash before a newline joins the two lines.
    Continuation,
}

fn string_fragment<'a>(input: &mut Input<'a>) -> IResult<Fragment<'a>> {
    alt((
        take_while(1.., |c: char| c != '"' && c != '\\').map(Fragment::Literal),
        preceded('\\', any).map(|c: char| match c {
            '"' => Fragment::Escaped('"'),
            '\\' => Fragment::Escaped('\\'),
            'n' => Fragment::Escaped('\n'),
            '\n' => Fragment::Continuation,
            other => Fragment::Verbatim(other),
        }),
    ))
    .parse_next(input)
}

fn string_body(input: &mut Input<'_>) -> IResult<String> {
    repeat(0.., string_fragment)
        .fold(String::new, |mut acc, fragment| {
            match fragment {
                Fragment::Literal(s) => acc.push_str(s),
                Fragment::Escaped(c) => acc.push(c),
                Fragment::Verbatim(c) => {
                    acc.push('\\');
                    acc.push(c);
                }
                Fragment::Continuation => {}
            }
            acc
        })
        .parse_next(input)
}

/// Parse a double-quoted string. Strings may span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    preceded(
        '"',
        cut_err(terminated(string_body, '"')).context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add a closing `\"`"),
            start,
        }),
    )
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse `//` and `#` comments up to the end of the line.
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded(alt(("//", "#")), take_while(0.., |c: char| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

fn block_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    preceded(
        "/*",
        cut_err(terminated(take_until(0.., "*/"), "*/")).context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "unterminated block comment",
            help: Some("close the comment with `*/`"),
            start,
        }),
    )
    .map(Token::BlockComment)
    .parse_next(input)
}

fn edge_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("->").value(Token::DirectedEdge),
        literal("--").value(Token::UndirectedEdge),
    ))
    .parse_next(input)
}

/// Parse a numeral: `-?(.[0-9]+ | [0-9]+(.[0-9]*)?)`
fn numeral<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        opt('-'),
        alt((
            preceded('.', digit1).void(),
            (digit1, opt(('.', digit0))).void(),
        )),
    )
        .take()
        .map(Token::Numeral)
        .parse_next(input)
}

/// Parse an identifier or keyword.
///
/// Identifiers may contain any non-ASCII character, like the language allows.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || !c.is_ascii())
        .verify(|s: &str| s.chars().next().is_some_and(|c| !c.is_ascii_digit()))
        .map(keyword_or_identifier)
        .parse_next(input)
}

fn keyword_or_identifier(word: &str) -> Token<'_> {
    match word.to_ascii_lowercase().as_str() {
        "strict" => Token::Strict,
        "graph" => Token::Graph,
        "digraph" => Token::Digraph,
        "subgraph" => Token::Subgraph,
        "node" => Token::Node,
        "edge" => Token::Edge,
        _ => Token::Identifier(word),
    }
}

fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '='.value(Token::Equals),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
        ':'.value(Token::Colon),
        '+'.value(Token::Plus),
    ))
    .parse_next(input)
}

/// Parse whitespace other than newlines.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        block_comment,
        string_literal,
        edge_operator, // Must come before numeral, `--1` is not a numeral
        numeral,       // Must come before identifier
        identifier,
        single_char_token,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Falls back to E002 (unexpected character) when the error carries no
    /// [`LexerDiagnostic`] context.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..error_pos), code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(
                Span::new(error_pos..error_pos.saturating_add(1)),
                ErrorCode::E002.description(),
            )
    }
}

/// Tokenize `input`, collecting every lexical error.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per lexical error.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("input should tokenize")
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    fn single(input: &str) -> Token<'_> {
        let mut located = LocatingSlice::new(input);
        positioned_token(&mut located)
            .unwrap_or_else(|_| panic!("failed to lex {input:?}"))
            .token
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(single("digraph"), Token::Digraph);
        assert_eq!(single("DiGraph"), Token::Digraph);
        assert_eq!(single("SUBGRAPH"), Token::Subgraph);
        assert_eq!(single("strict"), Token::Strict);
        assert_eq!(single("node"), Token::Node);
        assert_eq!(single("edge"), Token::Edge);
        assert_eq!(single("graph"), Token::Graph);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(single("nodes"), Token::Identifier("nodes"));
        assert_eq!(single("graph_1"), Token::Identifier("graph_1"));
        assert_eq!(single("cluster_a"), Token::Identifier("cluster_a"));
    }

    #[test]
    fn test_numerals() {
        assert_eq!(single("42"), Token::Numeral("42"));
        assert_eq!(single("-3.5"), Token::Numeral("-3.5"));
        assert_eq!(single(".25"), Token::Numeral(".25"));
        assert_eq!(single("7."), Token::Numeral("7."));
    }

    #[test]
    fn test_edge_operators() {
        assert_eq!(
            significant("a->b--c"),
            vec![
                Token::Identifier("a"),
                Token::DirectedEdge,
                Token::Identifier("b"),
                Token::UndirectedEdge,
                Token::Identifier("c"),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            single(r#""say \"hi\"""#),
            Token::StringLiteral("say \"hi\"".to_string())
        );
        assert_eq!(
            single(r#""a\\b""#),
            Token::StringLiteral("a\\b".to_string())
        );
        assert_eq!(
            single(r#""line\nbreak""#),
            Token::StringLiteral("line\nbreak".to_string())
        );
        // Unknown escapes are kept as written
        assert_eq!(
            single(r#""left\l""#),
            Token::StringLiteral("left\\l".to_string())
        );
        assert_eq!(
            single("\"joined \\\nline\""),
            Token::StringLiteral("joined line".to_string())
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        let tokens = significant("// header\n# preprocessor\na /* inline */ b");
        assert_eq!(tokens, vec![Token::Identifier("a"), Token::Identifier("b")]);
    }

    #[test]
    fn test_attribute_list() {
        assert_eq!(
            significant(r#"[_x="5", _y=2;]"#),
            vec![
                Token::LeftBracket,
                Token::Identifier("_x"),
                Token::Equals,
                Token::StringLiteral("5".to_string()),
                Token::Comma,
                Token::Identifier("_y"),
                Token::Equals,
                Token::Numeral("2"),
                Token::Semicolon,
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("ab  \"cd\"").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..2));
        assert_eq!(tokens[1].span, Span::new(2..4));
        assert_eq!(tokens[2].span, Span::new(4..8));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("a [label=\"oops]").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.primary_span().map(|s| s.start()), Some(9));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("a /* never closed").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_unexpected_characters_all_reported() {
        let err = tokenize("a ! b ?").unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
        assert_eq!(codes, vec![Some(ErrorCode::E002), Some(ErrorCode::E002)]);
    }
}
