//! # gridcalc-core
//!
//! Core value types shared by the gridcalc crates:
//! - [`Position`] and [`Size`] - Cell coordinates and the printable area
//! - [`CellValue`] and [`CellError`] - What a cell evaluates to
//! - [`Error`] - Structural errors raised by sheet mutations
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::Position;
//!
//! let pos = Position::parse("B3").unwrap();
//! assert_eq!(pos, Position::new(2, 1));
//! assert_eq!(pos.to_string(), "B3");
//! assert!(pos.is_valid());
//! ```

pub mod error;
pub mod position;
pub mod value;

pub use error::{Error, Result};
pub use position::{Position, Size};
pub use value::{CellError, CellValue};

/// Maximum number of rows in a sheet
pub const MAX_ROWS: i32 = 16_384;

/// Maximum number of columns in a sheet
pub const MAX_COLS: i32 = 16_384;
