//! Expression evaluation: a lazy scanner feeding a two-stack
//! (shunting-yard) engine.
//!
//! Every call to [`evaluate`] builds its own stacks, so the engine can be
//! shared freely between threads. The only process-wide data is the
//! read-only [`OPERATORS`] table.

use thiserror::Error;
use tracing::{debug, trace};

/// The closed set of ways an evaluation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CalcError {
    /// Malformed literal, misplaced operator or operand, empty group,
    /// trailing operator, empty input, or a stack that does not reduce
    /// to a single value.
    #[error("invalid expression")]
    InvalidExpression,
    /// A character outside digits, `.`, operators, parentheses and whitespace.
    #[error("invalid character")]
    InvalidCharacter,
    /// A `)` without a matching `(`, or a `(` never closed.
    #[error("mismatched parentheses")]
    MismatchedParens,
    /// An operator symbol with no entry in the operator table.
    #[error("invalid operator")]
    InvalidOperator,
    /// The right operand of `/` was zero (either sign).
    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token {
    Number(f64),
    Op(char),
    LParen,
    RParen,
}

pub struct Step {
    pub operation: String,
    pub result: f64,
}

/// Collects one [`Step`] per operator application when `detailed_mode` is on.
pub struct EvaluationTrace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl EvaluationTrace {
    pub fn new(detailed_mode: bool) -> Self {
        EvaluationTrace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    pub fn add_step(&mut self, operation: String, result: f64) {
        if self.detailed_mode {
            self.steps.push(Step { operation, result });
        }
    }
}

/// A binary operator: its symbol, precedence tier and arithmetic.
pub struct OperatorSpec {
    pub symbol: char,
    pub precedence: u8,
    operation: fn(f64, f64) -> Result<f64, CalcError>,
}

impl OperatorSpec {
    pub fn apply(&self, a: f64, b: f64) -> Result<f64, CalcError> {
        (self.operation)(a, b)
    }
}

fn add(a: f64, b: f64) -> Result<f64, CalcError> {
    Ok(a + b)
}

fn sub(a: f64, b: f64) -> Result<f64, CalcError> {
    Ok(a - b)
}

fn mul(a: f64, b: f64) -> Result<f64, CalcError> {
    Ok(a * b)
}

fn div(a: f64, b: f64) -> Result<f64, CalcError> {
    // -0.0 == 0.0, so both signed zeros are rejected here.
    if b == 0.0 {
        return Err(CalcError::DivisionByZero);
    }
    Ok(a / b)
}

pub static OPERATORS: [OperatorSpec; 4] = [
    OperatorSpec { symbol: '+', precedence: 1, operation: add },
    OperatorSpec { symbol: '-', precedence: 1, operation: sub },
    OperatorSpec { symbol: '*', precedence: 2, operation: mul },
    OperatorSpec { symbol: '/', precedence: 2, operation: div },
];

pub fn lookup_operator(symbol: char) -> Option<&'static OperatorSpec> {
    OPERATORS.iter().find(|op| op.symbol == symbol)
}

pub fn is_operator(c: char) -> bool {
    lookup_operator(c).is_some()
}

/// Whitespace allowed between tokens: ASCII space, tab, and line breaks
/// (including vertical tab and form feed). Unicode spaces such as NBSP
/// are invalid characters.
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Produces tokens on demand, skipping whitespace between them.
///
/// Errors are reported at the position where they occur, so a caller that
/// stops at the first `Err` sees failures in left-to-right order.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// True once the cursor has passed the last byte of the input.
    /// Trailing whitespace counts as input.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Option<Result<Token, CalcError>> {
        loop {
            let c = self.input[self.pos..].chars().next()?;
            match c {
                _ if is_whitespace(c) => {
                    self.pos += 1;
                }
                '0'..='9' | '.' => return Some(self.scan_number()),
                '(' => {
                    self.pos += 1;
                    return Some(Ok(Token::LParen));
                }
                ')' => {
                    self.pos += 1;
                    return Some(Ok(Token::RParen));
                }
                _ if is_operator(c) => {
                    self.pos += 1;
                    return Some(Ok(Token::Op(c)));
                }
                _ => {
                    self.pos += c.len_utf8();
                    return Some(Err(CalcError::InvalidCharacter));
                }
            }
        }
    }

    fn scan_number(&mut self) -> Result<Token, CalcError> {
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        self.pos += len;

        // Literals beyond f64 range parse as inf; treat them as malformed.
        let literal = &rest[..len];
        literal
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Token::Number)
            .ok_or(CalcError::InvalidExpression)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, CalcError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// What the engine accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// A number, `(` or unary minus must follow.
    AwaitingOperand,
    /// A binary operator or `)` must follow.
    AwaitingOperator,
}

struct Calculator<'t> {
    numbers: Vec<f64>,
    operations: Vec<char>,
    trace: &'t mut EvaluationTrace,
}

impl<'t> Calculator<'t> {
    fn new(trace: &'t mut EvaluationTrace) -> Self {
        Calculator {
            numbers: Vec::with_capacity(8),
            operations: Vec::with_capacity(8),
            trace,
        }
    }

    /// Pops the top operator and the top two operands (right operand first)
    /// and pushes the result.
    fn apply(&mut self) -> Result<(), CalcError> {
        if self.numbers.len() < 2 {
            return Err(CalcError::InvalidExpression);
        }
        let symbol = self.operations.pop().ok_or(CalcError::InvalidExpression)?;
        let (b, a) = match (self.numbers.pop(), self.numbers.pop()) {
            (Some(b), Some(a)) => (b, a),
            _ => return Err(CalcError::InvalidExpression),
        };

        let operator = lookup_operator(symbol).ok_or(CalcError::InvalidOperator)?;
        let result = operator.apply(a, b)?;
        trace!(%symbol, a, b, result, "applied operator");

        self.trace.add_step(format!("{} {} {}", a, symbol, b), result);
        self.numbers.push(result);
        Ok(())
    }

    fn push_operator(&mut self, symbol: char) -> Result<(), CalcError> {
        let incoming = lookup_operator(symbol).ok_or(CalcError::InvalidOperator)?;
        while let Some(&top) = self.operations.last() {
            if top == '(' {
                break;
            }
            match lookup_operator(top) {
                Some(pending) if pending.precedence >= incoming.precedence => self.apply()?,
                _ => break,
            }
        }
        self.operations.push(symbol);
        Ok(())
    }

    fn close_group(&mut self) -> Result<(), CalcError> {
        while let Some(&top) = self.operations.last() {
            if top == '(' {
                break;
            }
            self.apply()?;
        }
        // Either the matching '(' or nothing is left on top.
        self.operations
            .pop()
            .map(|_| ())
            .ok_or(CalcError::MismatchedParens)
    }

    fn finish(mut self) -> Result<f64, CalcError> {
        while !self.operations.is_empty() {
            self.apply()?;
        }
        match self.numbers.as_slice() {
            [value] => Ok(*value),
            _ => Err(CalcError::InvalidExpression),
        }
    }
}

/// Evaluates an arithmetic expression over `+ - * /`, parentheses,
/// decimal literals and unary minus.
///
/// ```
/// use exprcalc::{evaluate, CalcError};
///
/// assert_eq!(evaluate("2 + 2 * 2"), Ok(6.0));
/// assert_eq!(evaluate("5 / 0"), Err(CalcError::DivisionByZero));
/// ```
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    evaluate_traced(expression, &mut EvaluationTrace::new(false))
}

/// Same as [`evaluate`], recording every operator application into `trace`.
pub fn evaluate_traced(expression: &str, trace: &mut EvaluationTrace) -> Result<f64, CalcError> {
    let result = run(expression, trace);
    debug!(expression, ?result, "evaluated expression");
    result
}

fn run(expression: &str, trace: &mut EvaluationTrace) -> Result<f64, CalcError> {
    let mut calc = Calculator::new(trace);
    let mut scanner = Scanner::new(expression);
    let mut state = ParserState::AwaitingOperand;

    while let Some(token) = scanner.next_token() {
        state = match (token?, state) {
            (Token::Number(value), _) => {
                calc.numbers.push(value);
                ParserState::AwaitingOperator
            }
            (Token::LParen, _) => {
                calc.operations.push('(');
                ParserState::AwaitingOperand
            }
            (Token::RParen, ParserState::AwaitingOperand) => {
                return Err(CalcError::InvalidExpression);
            }
            (Token::RParen, ParserState::AwaitingOperator) => {
                calc.close_group()?;
                ParserState::AwaitingOperator
            }
            // Unary minus: rewritten as `0 - <operand>`.
            (Token::Op('-'), ParserState::AwaitingOperand) => {
                if scanner.is_at_end() {
                    return Err(CalcError::InvalidExpression);
                }
                calc.numbers.push(0.0);
                calc.operations.push('-');
                ParserState::AwaitingOperand
            }
            (Token::Op(_), ParserState::AwaitingOperand) => {
                return Err(CalcError::InvalidExpression);
            }
            (Token::Op(symbol), ParserState::AwaitingOperator) => {
                calc.push_operator(symbol)?;
                ParserState::AwaitingOperand
            }
        };
    }

    if state == ParserState::AwaitingOperand {
        return Err(CalcError::InvalidExpression);
    }
    if calc.operations.contains(&'(') {
        return Err(CalcError::MismatchedParens);
    }
    calc.finish()
}
