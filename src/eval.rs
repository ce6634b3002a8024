use miette::Diagnostic;
use thiserror::Error;

use crate::{
    Mode, Parser,
    parse::{BinaryOperation, Expression, Op},
};

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum EvalError {
    #[error("Division by zero")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero { dividend: i64 },

    #[error("Integer overflow in `{lhs} {op} {rhs}`")]
    #[diagnostic(
        code(eval::overflow),
        help("operands and results must fit in a signed 64-bit integer")
    )]
    Overflow { op: Op, lhs: i64, rhs: i64 },

    #[error("Expression has no left operand")]
    #[diagnostic(code(eval::missing_operand))]
    MissingOperand,

    #[error("Expression has two operands but no operator")]
    #[diagnostic(code(eval::missing_operator))]
    MissingOperator,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    mode: Mode,
}

impl Evaluator {
    pub fn new(mode: Mode) -> Self {
        Evaluator { mode }
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<i64, EvalError> {
        match expr {
            Expression::Literal(value) => Ok(*value),
            Expression::Binary(node) => self.evaluate_binary(node),
        }
    }

    pub fn evaluate_binary(&self, node: &BinaryOperation) -> Result<i64, EvalError> {
        let Some(lhs) = &node.lhs else {
            return match self.mode {
                Mode::Faithful => Ok(0),
                Mode::Strict => Err(EvalError::MissingOperand),
            };
        };
        let Some(rhs) = &node.rhs else {
            return self.evaluate(lhs);
        };
        // A node built without an operator starts out as an addition.
        let op = match (node.op, self.mode) {
            (Some(op), _) => op,
            (None, Mode::Faithful) => Op::Add,
            (None, Mode::Strict) => return Err(EvalError::MissingOperator),
        };

        let lhs = self.evaluate(lhs)?;
        let rhs = self.evaluate(rhs)?;
        let value = match op {
            Op::Add => lhs.checked_add(rhs),
            Op::Subtract => lhs.checked_sub(rhs),
            Op::Multiply => lhs.checked_mul(rhs),
            Op::Divide => {
                if rhs == 0 {
                    return Err(EvalError::DivisionByZero { dividend: lhs });
                }
                lhs.checked_div(rhs)
            }
        };
        value.ok_or(EvalError::Overflow { op, lhs, rhs })
    }
}

/// Runs lex, parse and evaluate over one source string.
pub struct Interpreter<'de> {
    parser: Parser<'de>,
    evaluator: Evaluator,
}

impl<'de> Interpreter<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str, mode: Mode) -> Self {
        Self {
            parser: Parser::new(filename, whole, mode),
            evaluator: Evaluator::new(mode),
        }
    }

    pub fn evaluate(self) -> Result<i64, miette::Error> {
        let tree = self.parser.parse()?;
        Ok(self.evaluator.evaluate_binary(&tree)?)
    }
}
