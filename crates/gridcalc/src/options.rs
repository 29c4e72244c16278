//! Sheet configuration and evaluation statistics

use gridcalc_core::{MAX_COLS, MAX_ROWS};

/// Options for a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SheetOptions {
    /// Number of addressable rows (clamped to [`MAX_ROWS`])
    pub max_rows: i32,
    /// Number of addressable columns (clamped to [`MAX_COLS`])
    pub max_cols: i32,
    /// Memoize numeric formula results until an upstream cell changes
    pub cache_values: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            max_cols: MAX_COLS,
            cache_values: true,
        }
    }
}

impl SheetOptions {
    /// Bring the bounds into the range every position type supports
    pub(crate) fn normalized(mut self) -> Self {
        self.max_rows = self.max_rows.clamp(0, MAX_ROWS);
        self.max_cols = self.max_cols.clamp(0, MAX_COLS);
        self
    }
}

/// Counters describing how values were produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Number of times a formula was handed to the evaluator
    pub formula_evaluations: u64,
    /// Number of value queries answered from a memoized result
    pub cache_hits: u64,
}
