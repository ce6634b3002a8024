use std::fmt::Display;

use miette::{Diagnostic, Error, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    Lexer, Mode,
    lex::{Token, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty expression")]
    EmptyInput,
    #[error("unmatched opening parenthesis")]
    UnmatchedParen,
    #[error("closing parenthesis without an opening one")]
    UnexpectedParen,
    #[error("operator is missing an operand")]
    MissingOperand,
    #[error("more than two operands in one expression")]
    ExtraOperand,
    #[error("more than one operator in one expression")]
    ConflictingOperator,
    #[error("two operands without an operator")]
    MissingOperator,
}

#[derive(Error, Debug, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(parse::error))]
pub struct ParseError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    at: SourceSpan,

    #[help]
    help: Option<String>,

    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(i64),
    Binary(BinaryOperation),
}

/// One level of the expression tree. Children are owned outright; `op` stays
/// `None` until an operator is seen at this level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryOperation {
    pub op: Option<Op>,
    pub lhs: Option<Box<Expression>>,
    pub rhs: Option<Box<Expression>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Op {
    fn from_kind(kind: TokenKind) -> Option<Op> {
        match kind {
            TokenKind::Plus => Some(Op::Add),
            TokenKind::Minus => Some(Op::Subtract),
            TokenKind::Star => Some(Op::Multiply),
            TokenKind::Slash => Some(Op::Divide),
            _ => None,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Add => write!(f, "+"),
            Op::Subtract => write!(f, "-"),
            Op::Multiply => write!(f, "*"),
            Op::Divide => write!(f, "/"),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(n) => write!(f, "{n}"),
            Expression::Binary(node) => write!(f, "{node}"),
        }
    }
}

/// S-expression form: `(+ 2 3)`, with `?` for an unset operator and `_` for an
/// absent child, so `7` prints as `(? 7 _)`.
impl Display for BinaryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        match self.op {
            Some(op) => write!(f, "{op}")?,
            None => write!(f, "?")?,
        }
        for child in [&self.lhs, &self.rhs] {
            match child {
                Some(child) => write!(f, " {child}")?,
                None => write!(f, " _")?,
            }
        }
        write!(f, ")")
    }
}

pub struct Parser<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    mode: Mode,
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str, mode: Mode) -> Self {
        Parser {
            filename,
            whole,
            mode,
        }
    }

    pub fn parse(self) -> Result<BinaryOperation, Error> {
        let tokens = Lexer::new(self.filename, self.whole).tokenize()?;
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token<'de>]) -> Result<BinaryOperation, Error> {
        Ok(self.parse_slice(tokens, 0)?)
    }

    /// Parses one level. `at` is where the slice starts in the source and
    /// only labels an empty slice.
    fn parse_slice(
        &self,
        tokens: &[Token<'de>],
        at: usize,
    ) -> Result<BinaryOperation, ParseError> {
        let strict = self.mode == Mode::Strict;

        if tokens.is_empty() && strict {
            return Err(self.error(ParseErrorKind::EmptyInput, SourceSpan::from(at..at)));
        }

        let mut node = BinaryOperation::default();
        let mut operator: Option<Token<'de>> = None;

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            match token.kind {
                TokenKind::Integer(n) => {
                    self.attach(&mut node, Expression::Literal(n), &token, operator.is_some())?;
                }
                TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                    if strict {
                        if let Some(previous) = operator {
                            return Err(self
                                .error(ParseErrorKind::ConflictingOperator, token.span())
                                .with_help(format!(
                                    "`{}` already joins this pair; group one side in parentheses",
                                    previous.literal
                                )));
                        }
                        if node.lhs.is_none() {
                            return Err(self
                                .error(ParseErrorKind::MissingOperand, token.span())
                                .with_help("put an operand in front of this operator"));
                        }
                    }
                    node.op = Op::from_kind(token.kind);
                    operator = Some(token);
                }
                TokenKind::LeftParen => {
                    // The first `)` closes, however many `(` come in between.
                    let Some(close) = tokens[i..]
                        .iter()
                        .position(|t| t.kind == TokenKind::RightParen)
                        .map(|offset| i + offset)
                    else {
                        let error = self.error(ParseErrorKind::UnmatchedParen, token.span());
                        return Err(if token.synthetic {
                            error.with_help(
                                "the lexer groups `*` and `/` with one integer on each side; \
                                 a second `*`/`/` or a parenthesized operand cannot be grouped",
                            )
                        } else {
                            error.with_help("add a `)`; nested parentheses are not supported")
                        });
                    };
                    let sub = self.parse_slice(&tokens[i + 1..close], token.end())?;
                    self.attach(&mut node, Expression::Binary(sub), &token, operator.is_some())?;
                    i = close;
                }
                TokenKind::RightParen => {
                    if strict {
                        return Err(self.error(ParseErrorKind::UnexpectedParen, token.span()));
                    }
                }
            }
            i += 1;
        }

        if strict {
            if let Some(operator) = operator {
                if node.rhs.is_none() {
                    return Err(self
                        .error(ParseErrorKind::MissingOperand, operator.span())
                        .with_help("put an operand after this operator"));
                }
            }
        }

        Ok(node)
    }

    /// Fills the left child, else the right one. A third operand replaces the
    /// right child in faithful mode.
    fn attach(
        &self,
        node: &mut BinaryOperation,
        child: Expression,
        token: &Token<'de>,
        has_operator: bool,
    ) -> Result<(), ParseError> {
        if node.lhs.is_none() {
            node.lhs = Some(Box::new(child));
            return Ok(());
        }
        if self.mode == Mode::Strict {
            if node.rhs.is_some() {
                return Err(self
                    .error(ParseErrorKind::ExtraOperand, token.span())
                    .with_help("only one operator per level; group with parentheses"));
            }
            if !has_operator {
                return Err(self
                    .error(ParseErrorKind::MissingOperator, token.span())
                    .with_help("put `+`, `-`, `*` or `/` between the operands"));
            }
        }
        node.rhs = Some(Box::new(child));
        Ok(())
    }

    fn error(&self, kind: ParseErrorKind, at: SourceSpan) -> ParseError {
        ParseError {
            src: NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string()),
            at,
            help: None,
            kind,
        }
    }
}

impl ParseError {
    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn span(&self) -> SourceSpan {
        self.at
    }
}
