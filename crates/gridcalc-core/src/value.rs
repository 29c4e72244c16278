//! Cell value types

use std::fmt;

/// What a cell evaluates to
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Numeric value (formulas only ever produce numbers or errors)
    Number(f64),

    /// Text value; empty cells evaluate to the empty string
    Text(String),

    /// Computation error (#DIV/0!, #VALUE!, etc.)
    Error(CellError),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// The value of an empty cell
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

impl From<Result<f64, CellError>> for CellValue {
    fn from(result: Result<f64, CellError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

/// Computation errors a formula can evaluate to
///
/// These are data, not failures: they are returned by value queries and
/// propagate through every formula that reads an erroring cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #REF! - Reference to a position outside the sheet
    Ref,
    /// #VALUE! - Text that is not a number used in arithmetic
    Value,
    /// #DIV/0! - Division by zero
    Div0,
    /// #NUM! - Arithmetic result is not a finite number
    Num,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Ref => "#REF!",
            CellError::Value => "#VALUE!",
            CellError::Div0 => "#DIV/0!",
            CellError::Num => "#NUM!",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
