pub mod eval;
pub mod lex;
pub mod parse;

pub use eval::{EvalError, Evaluator, Interpreter};
pub use lex::{Lexer, Token, TokenKind};
pub use parse::{BinaryOperation, Expression, Op, ParseError, ParseErrorKind, Parser};

/// How the parser and evaluator treat the quirks of the flat binary grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Every quirk is reported as an error.
    #[default]
    Strict,
    /// Last operator wins, a third operand replaces the right one, stray `)`
    /// is ignored, an operand-less node evaluates to 0 and a missing operator
    /// defaults to addition.
    Faithful,
}
