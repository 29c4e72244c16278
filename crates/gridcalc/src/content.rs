//! Cell content variants

use gridcalc_core::{CellValue, Position, Result};
use gridcalc_formula::Formula;

/// Prefix that turns cell text into a formula
pub const FORMULA_SIGN: char = '=';

/// Prefix that forces the rest of the text to be taken literally
pub const ESCAPE_SIGN: char = '\'';

/// What a cell holds
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Nothing; evaluates to the empty string
    Empty,
    /// Literal text exactly as typed
    Text(String),
    /// Parsed formula
    Formula(Formula),
}

impl Content {
    /// Classify raw cell text
    ///
    /// `""` is empty, `=` followed by at least one character is a formula,
    /// anything else (including a lone `=`) is text. Classification only
    /// parses; it never touches a sheet.
    ///
    /// # Example
    /// ```rust
    /// use gridcalc::Content;
    ///
    /// assert_eq!(Content::classify("").unwrap(), Content::Empty);
    /// assert_eq!(Content::classify("=").unwrap(), Content::Text("=".into()));
    /// assert!(matches!(Content::classify("=1+2").unwrap(), Content::Formula(_)));
    /// assert!(Content::classify("=1+").is_err());
    /// ```
    pub fn classify(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Content::Empty);
        }

        match text.strip_prefix(FORMULA_SIGN) {
            Some(body) if !body.is_empty() => Ok(Content::Formula(Formula::parse(body)?)),
            _ => Ok(Content::Text(text.to_string())),
        }
    }

    /// The text a user would see when editing the cell
    pub fn text(&self) -> String {
        match self {
            Content::Empty => String::new(),
            Content::Text(raw) => raw.clone(),
            Content::Formula(formula) => format!("{}{}", FORMULA_SIGN, formula.expression()),
        }
    }

    /// Compute the value, resolving formula references through `resolve`
    pub fn value<F>(&self, resolve: F) -> CellValue
    where
        F: Fn(Position) -> CellValue,
    {
        match self {
            Content::Empty => CellValue::empty(),
            Content::Text(raw) => {
                CellValue::text(raw.strip_prefix(ESCAPE_SIGN).unwrap_or(raw))
            }
            Content::Formula(formula) => formula.evaluate(resolve).into(),
        }
    }

    /// Cells a formula reads; empty for text and empty content
    pub fn referenced_cells(&self) -> Vec<Position> {
        match self {
            Content::Formula(formula) => formula.referenced_cells(),
            _ => Vec::new(),
        }
    }

    /// Check if this is empty content
    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, Content::Formula(_))
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Empty
    }
}
