//! The sheet: cell ownership, the commit protocol and value queries

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use log::{debug, trace};

use crate::cell::Cell;
use crate::content::Content;
use crate::options::{EvaluationStats, SheetOptions};
use gridcalc_core::{CellError, CellValue, Error, Position, Result, Size};

/// A sparse grid of cells with dependency tracking
///
/// Storage is row-major: `BTreeMap<row, BTreeMap<col, Cell>>`. A slot exists
/// once it has been set, or once a formula referenced it (it is then
/// materialized as an empty cell). Cells are mutated in place, so the
/// dependents recorded on a cell survive every change to its content.
///
/// # Example
///
/// ```rust
/// use gridcalc::{CellValue, Position, Sheet};
///
/// let mut sheet = Sheet::new();
/// let a1 = Position::parse("A1").unwrap();
/// let a2 = Position::parse("A2").unwrap();
///
/// sheet.set_cell(a1, "5").unwrap();
/// sheet.set_cell(a2, "=A1+3").unwrap();
/// assert_eq!(sheet.get_cell(a2).unwrap().unwrap().value(), CellValue::Number(8.0));
///
/// // A1 -> A2 -> A1 would be a cycle; nothing changes
/// assert!(sheet.set_cell(a1, "=A2").is_err());
/// assert_eq!(sheet.get_cell(a1).unwrap().unwrap().text(), "5");
/// ```
#[derive(Debug)]
pub struct Sheet {
    cells: BTreeMap<i32, BTreeMap<i32, Cell>>,
    print_bound: Size,
    options: SheetOptions,
    stats: std::cell::Cell<EvaluationStats>,
}

impl Sheet {
    /// Create an empty sheet with default options
    pub fn new() -> Self {
        Self::with_options(SheetOptions::default())
    }

    /// Create an empty sheet with the given options
    pub fn with_options(options: SheetOptions) -> Self {
        Self {
            cells: BTreeMap::new(),
            print_bound: Size::default(),
            options: options.normalized(),
            stats: std::cell::Cell::new(EvaluationStats::default()),
        }
    }

    /// Check whether a position is addressable in this sheet
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.is_valid() && pos.row < self.options.max_rows && pos.col < self.options.max_cols
    }

    // ==================== Mutation ====================

    /// Set the text of a cell
    ///
    /// Fails without changing anything if the position is outside the sheet,
    /// the formula is malformed, references a cell outside the sheet, or
    /// would make some cell depend on itself.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        self.check_position(pos)?;

        let content = Content::classify(text).map_err(|e| {
            debug!("rejected {:?} at {}: {}", text, pos, e);
            e
        })?;

        let references: BTreeSet<Position> = content.referenced_cells().into_iter().collect();
        if let Some(bad) = references.iter().find(|p| !self.is_in_bounds(**p)) {
            debug!("rejected {:?} at {}: reference out of bounds", text, pos);
            return Err(Error::InvalidReference(format!(
                "{} refers to row {}, column {} outside the sheet",
                pos, bad.row, bad.col
            )));
        }

        self.check_circular(pos, &references).map_err(|e| {
            debug!("rejected {:?} at {}: {}", text, pos, e);
            e
        })?;

        self.commit(pos, content, references);
        Ok(())
    }

    /// Remove a cell's content and release it
    ///
    /// If other formulas still read the cell, an empty placeholder keeps the
    /// slot (and its list of dependents) alive; they now read an empty value.
    /// Clearing an absent cell does nothing.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        self.check_position(pos)?;

        let (was_empty, old_forward, keep) = match self.cell_mut(pos) {
            Some(cell) => {
                let was_empty = cell.content().is_empty();
                let old_forward = cell.replace(Content::Empty, BTreeSet::new());
                (was_empty, old_forward, cell.has_dependents())
            }
            None => return Ok(()),
        };

        self.rewire(pos, &old_forward, &BTreeSet::new());
        self.invalidate_dependents(pos);

        if !keep {
            self.remove(pos);
        }
        if !was_empty {
            self.recompute_print_bound();
        }

        debug!(
            "cleared {}{}",
            pos,
            if keep { " (kept as placeholder)" } else { "" }
        );
        Ok(())
    }

    /// Replace content and edges of the cell at `pos`; all checks passed
    fn commit(&mut self, pos: Position, content: Content, references: BTreeSet<Position>) {
        let now_empty = content.is_empty();
        let cell = self.cell_entry(pos);
        let was_empty = cell.content().is_empty();
        let old_forward = cell.replace(content, references.clone());

        self.rewire(pos, &old_forward, &references);
        self.invalidate_dependents(pos);

        if !now_empty {
            self.print_bound = self.print_bound.extend_to(pos);
        } else if !was_empty {
            self.recompute_print_bound();
        }

        debug!("set {} ({} precedents)", pos, references.len());
    }

    /// Bring the backward sets of `pos`'s old and new targets in line with
    /// its forward set
    fn rewire(&mut self, pos: Position, old: &BTreeSet<Position>, new: &BTreeSet<Position>) {
        for &target in old.difference(new) {
            if let Some(cell) = self.cell_mut(target) {
                cell.remove_dependent(pos);
            }
        }
        for &target in new.difference(old) {
            self.cell_entry(target).add_dependent(pos);
        }
    }

    fn check_position(&self, pos: Position) -> Result<()> {
        if self.is_in_bounds(pos) {
            Ok(())
        } else {
            Err(Error::InvalidPosition(pos))
        }
    }

    // ==================== Storage ====================

    pub(crate) fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(&pos.row).and_then(|r| r.get(&pos.col))
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.cells.get_mut(&pos.row).and_then(|r| r.get_mut(&pos.col))
    }

    /// Get the cell at `pos`, materializing an empty one if absent
    fn cell_entry(&mut self, pos: Position) -> &mut Cell {
        self.cells
            .entry(pos.row)
            .or_default()
            .entry(pos.col)
            .or_insert_with(|| {
                trace!("materialized {}", pos);
                Cell::new()
            })
    }

    fn remove(&mut self, pos: Position) -> Option<Cell> {
        let result = self.cells.get_mut(&pos.row).and_then(|r| r.remove(&pos.col));

        // Clean up empty rows
        if self.cells.get(&pos.row).map_or(false, |r| r.is_empty()) {
            self.cells.remove(&pos.row);
        }

        result
    }

    /// Rescan every row for its last non-empty cell
    fn recompute_print_bound(&mut self) {
        let mut bound = Size::default();
        for (&row, cols) in &self.cells {
            if let Some((&col, _)) = cols.iter().rev().find(|(_, c)| !c.content().is_empty()) {
                bound = bound.extend_to(Position::new(row, col));
            }
        }
        self.print_bound = bound;
    }

    // ==================== Queries ====================

    /// Get a read-only view of the cell at `pos`
    ///
    /// Returns `Ok(None)` for a slot that was never set or referenced.
    pub fn get_cell(&self, pos: Position) -> Result<Option<CellView<'_>>> {
        self.check_position(pos)?;
        Ok(self.cell(pos).map(|cell| CellView {
            sheet: self,
            pos,
            cell,
        }))
    }

    /// Smallest area anchored at A1 covering every non-empty cell
    pub fn printable_size(&self) -> Size {
        self.print_bound
    }

    /// Number of cell slots in use, placeholders included
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(|r| r.len()).sum()
    }

    /// Check if the sheet holds no cells at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Positions of every existing cell, in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .flat_map(|(&row, cols)| cols.keys().map(move |&col| Position::new(row, col)))
    }

    /// Counters for formula evaluations and cache hits since the last reset
    pub fn stats(&self) -> EvaluationStats {
        self.stats.get()
    }

    /// Reset the evaluation counters
    pub fn reset_stats(&self) {
        self.stats.set(EvaluationStats::default());
    }

    /// Compute a cell's value, answering from and filling the memo
    ///
    /// An uncached formula is not evaluated recursively through its
    /// references. Its uncached precedents are first put in dependency order
    /// and evaluated bottom-up, so each formula only ever reads values that
    /// are already known.
    fn evaluate(&self, pos: Position, cell: &Cell) -> CellValue {
        if let Some(n) = cell.cached() {
            self.record(|s| s.cache_hits += 1);
            return CellValue::Number(n);
        }
        if !cell.content().is_formula() {
            // Text and empty content never read other cells
            return cell.content().value(|_| CellValue::empty());
        }

        let mut computed: AHashMap<Position, CellValue> = AHashMap::new();
        for current in self.evaluation_order(pos) {
            let Some(target) = self.cell(current) else {
                continue;
            };
            self.record(|s| s.formula_evaluations += 1);
            let value = target.content().value(|p| self.lookup(p, &computed));

            if let CellValue::Number(n) = value {
                if self.options.cache_values {
                    trace!("cached {} = {}", current, n);
                    target.remember(n);
                }
            }
            computed.insert(current, value);
        }

        computed.remove(&pos).unwrap_or_else(CellValue::empty)
    }

    /// Value of a referenced cell as seen by a formula
    fn lookup(&self, pos: Position, computed: &AHashMap<Position, CellValue>) -> CellValue {
        if !self.is_in_bounds(pos) {
            return CellValue::Error(CellError::Ref);
        }
        if let Some(value) = computed.get(&pos) {
            return value.clone();
        }
        match self.cell(pos) {
            // Text, empty and cached cells answer without recursing
            Some(cell) => self.evaluate(pos, cell),
            None => CellValue::empty(),
        }
    }

    fn record(&self, update: impl FnOnce(&mut EvaluationStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of one cell
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    sheet: &'a Sheet,
    pos: Position,
    cell: &'a Cell,
}

impl<'a> CellView<'a> {
    /// Where the cell lives
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Current value: a number, text, or a computation error
    ///
    /// Numeric results are memoized until something the cell depends on
    /// changes.
    pub fn value(&self) -> CellValue {
        self.sheet.evaluate(self.pos, self.cell)
    }

    /// Text as the user would edit it; formulas come back in canonical form
    pub fn text(&self) -> String {
        self.cell.content().text()
    }

    /// The cell's content
    pub fn content(&self) -> &'a Content {
        self.cell.content()
    }

    /// Cells this cell's formula reads, in row-major order
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.forward().iter().copied().collect()
    }

    /// Cells whose formulas read this cell, in row-major order
    pub fn dependent_cells(&self) -> Vec<Position> {
        self.cell.backward().iter().copied().collect()
    }

    /// Check if a memoized value is currently held
    pub fn is_cached(&self) -> bool {
        self.cell.cached().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::CellError;
    use pretty_assertions::assert_eq;

    fn pos(a1: &str) -> Position {
        Position::parse(a1).unwrap()
    }

    fn value(sheet: &Sheet, a1: &str) -> CellValue {
        sheet.get_cell(pos(a1)).unwrap().unwrap().value()
    }

    #[test]
    fn test_set_and_get() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B2"), "hello").unwrap();

        let cell = sheet.get_cell(pos("B2")).unwrap().unwrap();
        assert_eq!(cell.text(), "hello");
        assert_eq!(cell.value(), CellValue::text("hello"));
        assert_eq!(cell.position(), pos("B2"));

        assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_position() {
        let mut sheet = Sheet::new();
        let bad = Position::new(-1, 0);

        assert_eq!(sheet.set_cell(bad, "x"), Err(Error::InvalidPosition(bad)));
        assert_eq!(sheet.clear_cell(bad), Err(Error::InvalidPosition(bad)));
        assert!(matches!(sheet.get_cell(bad), Err(Error::InvalidPosition(_))));
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_configured_bounds() {
        let mut sheet = Sheet::with_options(SheetOptions {
            max_rows: 10,
            max_cols: 2,
            ..SheetOptions::default()
        });

        assert!(sheet.set_cell(pos("B10"), "ok").is_ok());
        assert!(matches!(
            sheet.set_cell(pos("C1"), "x"),
            Err(Error::InvalidPosition(_))
        ));
        assert!(matches!(
            sheet.set_cell(pos("A1"), "=A11"),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_formula_with_references() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "5").unwrap();
        sheet.set_cell(pos("A2"), "=A1+3").unwrap();

        assert_eq!(value(&sheet, "A2"), CellValue::Number(8.0));
        assert_eq!(sheet.get_cell(pos("A2")).unwrap().unwrap().text(), "=A1+3");
    }

    #[test]
    fn test_reference_materializes_empty_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=C3*2").unwrap();

        let target = sheet.get_cell(pos("C3")).unwrap().unwrap();
        assert_eq!(target.text(), "");
        assert_eq!(target.dependent_cells(), vec![pos("A1")]);
        assert_eq!(value(&sheet, "A1"), CellValue::Number(0.0));

        // Materialized cells do not widen the printable area
        assert_eq!(sheet.printable_size(), Size::new(1, 1));
    }

    #[test]
    fn test_invalid_reference_leaves_sheet_untouched() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();

        let err = sheet.set_cell(pos("A1"), "=A0+1").unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));

        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.text(), "=B1");
        assert_eq!(a1.referenced_cells(), vec![pos("B1")]);
    }

    #[test]
    fn test_syntax_error_leaves_sheet_untouched() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "7").unwrap();

        let err = sheet.set_cell(pos("A1"), "=1+").unwrap_err();
        assert!(matches!(err, Error::FormulaSyntax(_)));
        assert_eq!(value(&sheet, "A1"), CellValue::text("7"));
    }

    #[test]
    fn test_self_reference() {
        let mut sheet = Sheet::new();
        assert_eq!(
            sheet.set_cell(pos("A1"), "=A1"),
            Err(Error::CircularDependency(pos("A1")))
        );
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_replacing_formula_rewires_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("C1"), "=A1+B1").unwrap();
        sheet.set_cell(pos("C1"), "=B1+D1").unwrap();

        let deps = |a1: &str| sheet.get_cell(pos(a1)).unwrap().unwrap().dependent_cells();
        assert!(deps("A1").is_empty());
        assert_eq!(deps("B1"), vec![pos("C1")]);
        assert_eq!(deps("D1"), vec![pos("C1")]);
    }

    #[test]
    fn test_overwrite_preserves_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1*10").unwrap();
        assert_eq!(value(&sheet, "B1"), CellValue::Number(10.0));

        sheet.set_cell(pos("A1"), "2").unwrap();
        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.dependent_cells(), vec![pos("B1")]);
        assert_eq!(value(&sheet, "B1"), CellValue::Number(20.0));
    }

    #[test]
    fn test_clear_cell_without_dependents_releases_slot() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.clear_cell(pos("A1")).unwrap();

        assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
        let b1 = sheet.get_cell(pos("B1")).unwrap().unwrap();
        assert!(b1.dependent_cells().is_empty());
    }

    #[test]
    fn test_clear_cell_with_dependents_keeps_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "4").unwrap();
        sheet.set_cell(pos("A2"), "=A1+1").unwrap();
        assert_eq!(value(&sheet, "A2"), CellValue::Number(5.0));

        sheet.clear_cell(pos("A1")).unwrap();

        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.text(), "");
        assert_eq!(a1.dependent_cells(), vec![pos("A2")]);
        assert_eq!(value(&sheet, "A2"), CellValue::Number(1.0));
    }

    #[test]
    fn test_clear_absent_cell_is_noop() {
        let mut sheet = Sheet::new();
        sheet.clear_cell(pos("Z9")).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_text_reference_conversions() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "'12").unwrap();
        sheet.set_cell(pos("A2"), "abc").unwrap();
        sheet.set_cell(pos("B1"), "=A1*2").unwrap();
        sheet.set_cell(pos("B2"), "=A2*2").unwrap();

        assert_eq!(value(&sheet, "B1"), CellValue::Number(24.0));
        assert_eq!(value(&sheet, "B2"), CellValue::Error(CellError::Value));
    }

    #[test]
    fn test_cache_hit_skips_evaluator() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=2*3").unwrap();

        assert_eq!(value(&sheet, "A1"), CellValue::Number(6.0));
        assert_eq!(value(&sheet, "A1"), CellValue::Number(6.0));

        let stats = sheet.stats();
        assert_eq!(stats.formula_evaluations, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1/0").unwrap();

        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.value(), CellValue::Error(CellError::Div0));
        assert!(!a1.is_cached());
        assert_eq!(a1.value(), CellValue::Error(CellError::Div0));
        assert_eq!(sheet.stats().formula_evaluations, 2);
    }

    #[test]
    fn test_cache_disabled() {
        let mut sheet = Sheet::with_options(SheetOptions {
            cache_values: false,
            ..SheetOptions::default()
        });
        sheet.set_cell(pos("A1"), "=1+1").unwrap();

        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.value(), CellValue::Number(2.0));
        assert!(!a1.is_cached());
        assert_eq!(a1.value(), CellValue::Number(2.0));
        assert_eq!(sheet.stats().formula_evaluations, 2);
        assert_eq!(sheet.stats().cache_hits, 0);
    }

    #[test]
    fn test_printable_size_grows_and_shrinks() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.printable_size(), Size::new(0, 0));

        sheet.set_cell(pos("B2"), "x").unwrap();
        assert_eq!(sheet.printable_size(), Size::new(2, 2));

        sheet.set_cell(pos("D1"), "y").unwrap();
        assert_eq!(sheet.printable_size(), Size::new(2, 4));

        sheet.clear_cell(pos("D1")).unwrap();
        assert_eq!(sheet.printable_size(), Size::new(2, 2));

        sheet.set_cell(pos("B2"), "").unwrap();
        assert_eq!(sheet.printable_size(), Size::new(0, 0));
        assert!(sheet.get_cell(pos("B2")).unwrap().is_some());
    }
}
