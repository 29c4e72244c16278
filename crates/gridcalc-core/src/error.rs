//! Error types for gridcalc-core

use crate::Position;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors: a mutation that fails with one of these leaves the
/// sheet exactly as it was.
///
/// Computation errors such as division by zero are not represented here;
/// they are values ([`crate::CellError`]) a cell can hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed A1-style address text
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Coordinate outside the sheet
    #[error("Invalid position ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    /// A formula names a cell outside the sheet
    #[error("Invalid reference in formula: {0}")]
    InvalidReference(String),

    /// Committing the formula would close a reference cycle
    #[error("Circular dependency detected involving cell {0}")]
    CircularDependency(Position),

    /// Malformed formula text
    #[error("Formula syntax error: {0}")]
    FormulaSyntax(String),
}
