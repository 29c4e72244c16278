//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing a formula
///
/// Evaluation never fails with one of these: computation problems are
/// reported as [`gridcalc_core::CellError`] values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Character that cannot start any token
    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),
}

impl From<FormulaError> for gridcalc_core::Error {
    fn from(err: FormulaError) -> Self {
        gridcalc_core::Error::FormulaSyntax(err.to_string())
    }
}
