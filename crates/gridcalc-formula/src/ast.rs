//! Formula Abstract Syntax Tree types

use gridcalc_core::Position;
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Single cell reference; may name a position outside the sheet
    CellRef(Position),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

// Binding strength used by the canonical printer
const PREC_ADDITIVE: u8 = 1;
const PREC_MULTIPLICATIVE: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

impl BinaryOperator {
    fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => PREC_ADDITIVE,
            BinaryOperator::Multiply | BinaryOperator::Divide => PREC_MULTIPLICATIVE,
        }
    }

    /// `a - (b - c)` and `a / (b / c)` keep their parentheses
    fn is_left_associative_only(&self) -> bool {
        matches!(self, BinaryOperator::Subtract | BinaryOperator::Divide)
    }
}

impl UnaryOperator {
    fn symbol(&self) -> char {
        match self {
            UnaryOperator::Plus => '+',
            UnaryOperator::Negate => '-',
        }
    }
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::CellRef(_) => PREC_ATOM,
            Expr::UnaryOp { .. } => PREC_UNARY,
            Expr::BinaryOp { op, .. } => op.precedence(),
        }
    }

    /// Visit every cell reference in left-to-right order, duplicates included
    pub fn for_each_reference(&self, f: &mut impl FnMut(Position)) {
        match self {
            Expr::Number(_) => {}
            Expr::CellRef(pos) => f(*pos),
            Expr::BinaryOp { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            Expr::UnaryOp { operand, .. } => operand.for_each_reference(f),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Canonical text: no whitespace and only the parentheses the precedence
/// rules require.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::CellRef(pos) => write!(f, "{}", pos),
            Expr::UnaryOp { op, operand } => {
                write!(f, "{}", op.symbol())?;
                operand.fmt_operand(f, operand.precedence() < PREC_UNARY)
            }
            Expr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                left.fmt_operand(f, left.precedence() < prec)?;
                write!(f, "{}", op.symbol())?;
                let right_prec = right.precedence();
                right.fmt_operand(
                    f,
                    right_prec < prec || (right_prec == prec && op.is_left_associative_only()),
                )
            }
        }
    }
}
