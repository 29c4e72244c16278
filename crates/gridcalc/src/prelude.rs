//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellError,
    CellValue,
    CellView,
    Content,

    // Error types
    Error,
    Result,

    // Addressing
    Position,
    Size,

    // Main types
    EvaluationStats,
    Sheet,
    SheetOptions,

    // Constants
    MAX_COLS,
    MAX_ROWS,
};
