//! # gridcalc-formula
//!
//! Arithmetic formula engine for gridcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST + cell resolver → number or [`CellError`])
//! - Canonical rendering (AST → text with minimal parentheses)
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellValue, Position};
//! use gridcalc_formula::Formula;
//!
//! let formula = Formula::parse("(A1 + 3)").unwrap();
//! assert_eq!(formula.expression(), "A1+3");
//! assert_eq!(formula.referenced_cells(), vec![Position::new(0, 0)]);
//!
//! let value = formula.evaluate(|_| CellValue::Number(5.0));
//! assert_eq!(value, Ok(8.0));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::evaluate;
pub use parser::{parse_expression, MAX_HEIGHT, MAX_NESTING};

use gridcalc_core::{CellError, CellValue, Position};
use std::fmt;

/// A parsed formula body (the text after `=`)
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    ast: Expr,
}

impl Formula {
    /// Parse formula text without its leading `=`
    pub fn parse(text: &str) -> FormulaResult<Self> {
        Ok(Self {
            ast: parse_expression(text)?,
        })
    }

    /// Evaluate against a cell resolver
    pub fn evaluate<F>(&self, resolve: F) -> Result<f64, CellError>
    where
        F: Fn(Position) -> CellValue,
    {
        evaluate(&self.ast, &resolve)
    }

    /// Canonical expression text, without the leading `=`
    pub fn expression(&self) -> String {
        self.ast.to_string()
    }

    /// Cells the formula reads, sorted and deduplicated
    ///
    /// Out-of-range positions are included so the caller can reject them.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        self.ast.for_each_reference(&mut |pos| cells.push(pos));
        cells.sort();
        cells.dedup();
        cells
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}
