//! # gridcalc
//!
//! An in-memory spreadsheet sheet with a dependency graph and incremental
//! evaluation.
//!
//! ## Features
//!
//! - Sparse storage addressed by A1-style positions
//! - Arithmetic formulas over numbers and cell references
//! - Circular references rejected before any change is applied
//! - Numeric results memoized and invalidated only along dependents
//! - Tab-separated dumps of values and texts
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! let a1: Position = "A1".parse().unwrap();
//! let b1: Position = "B1".parse().unwrap();
//!
//! sheet.set_cell(a1, "21").unwrap();
//! sheet.set_cell(b1, "=A1*2").unwrap();
//!
//! let value = sheet.get_cell(b1).unwrap().unwrap().value();
//! assert_eq!(value, CellValue::Number(42.0));
//! assert_eq!(sheet.printable_size(), Size::new(1, 2));
//! ```

mod cell;
pub mod content;
mod dependency;
pub mod options;
pub mod prelude;
mod print;
pub mod sheet;

pub use content::{Content, ESCAPE_SIGN, FORMULA_SIGN};
pub use options::{EvaluationStats, SheetOptions};
pub use sheet::{CellView, Sheet};

// Re-export core types
pub use gridcalc_core::{CellError, CellValue, Error, Position, Result, Size, MAX_COLS, MAX_ROWS};

// Re-export formula types
pub use gridcalc_formula::{Formula, FormulaError};
