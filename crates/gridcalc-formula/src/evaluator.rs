//! Formula evaluator
//!
//! Evaluates formula ASTs to a number or a computation error. Cell values
//! come from a caller-supplied resolver, so the evaluator never sees the
//! sheet itself.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use gridcalc_core::{CellError, CellValue, Position};

/// Evaluate an expression, resolving each referenced cell through `resolve`
///
/// Operands are evaluated left to right and the first error wins.
pub fn evaluate<F>(expr: &Expr, resolve: &F) -> Result<f64, CellError>
where
    F: Fn(Position) -> CellValue + ?Sized,
{
    match expr {
        Expr::Number(n) => Ok(*n),

        Expr::CellRef(pos) => {
            if !pos.is_valid() {
                return Err(CellError::Ref);
            }
            to_number(resolve(*pos))
        }

        Expr::UnaryOp { op, operand } => {
            let value = evaluate(operand, resolve)?;
            Ok(match op {
                UnaryOperator::Plus => value,
                UnaryOperator::Negate => -value,
            })
        }

        Expr::BinaryOp { op, left, right } => {
            let lhs = evaluate(left, resolve)?;
            let rhs = evaluate(right, resolve)?;
            let result = match op {
                BinaryOperator::Add => lhs + rhs,
                BinaryOperator::Subtract => lhs - rhs,
                BinaryOperator::Multiply => lhs * rhs,
                BinaryOperator::Divide => {
                    if rhs == 0.0 {
                        return Err(CellError::Div0);
                    }
                    lhs / rhs
                }
            };
            if result.is_finite() {
                Ok(result)
            } else {
                Err(CellError::Num)
            }
        }
    }
}

/// Convert a referenced cell's value to a number for arithmetic
///
/// Empty text reads as zero, numeric text as its number, anything else as
/// `#VALUE!`. Errors propagate unchanged.
pub fn to_number(value: CellValue) -> Result<f64, CellError> {
    match value {
        CellValue::Number(n) => Ok(n),
        CellValue::Error(e) => Err(e),
        CellValue::Text(s) if s.is_empty() => Ok(0.0),
        CellValue::Text(s) => parse_numeric_text(&s).ok_or(CellError::Value),
    }
}

/// Strict number parsing for cell text: no whitespace, no `inf`/`nan`
fn parse_numeric_text(s: &str) -> Option<f64> {
    let plausible = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plausible {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
