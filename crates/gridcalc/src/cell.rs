//! Cell storage record
//!
//! A [`Cell`] is owned by its [`crate::Sheet`] slot and never moves while the
//! slot exists. Edges are plain positions; resolving them always goes back
//! through the sheet.

use std::cell::OnceCell;
use std::collections::BTreeSet;

use crate::content::Content;
use gridcalc_core::Position;

#[derive(Debug, Default)]
pub(crate) struct Cell {
    content: Content,
    /// Cells this cell's formula reads
    forward: BTreeSet<Position>,
    /// Cells whose formulas read this cell
    backward: BTreeSet<Position>,
    /// Memoized numeric result; populated lazily from `&self`
    cache: OnceCell<f64>,
}

impl Cell {
    /// An empty cell with no edges
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn content(&self) -> &Content {
        &self.content
    }

    pub(crate) fn forward(&self) -> &BTreeSet<Position> {
        &self.forward
    }

    pub(crate) fn backward(&self) -> &BTreeSet<Position> {
        &self.backward
    }

    /// Swap in new content and forward edges, returning the old forward set
    ///
    /// The backward set is untouched: dependents keep pointing at this slot
    /// no matter what it holds.
    pub(crate) fn replace(
        &mut self,
        content: Content,
        forward: BTreeSet<Position>,
    ) -> BTreeSet<Position> {
        self.content = content;
        self.cache.take();
        std::mem::replace(&mut self.forward, forward)
    }

    pub(crate) fn add_dependent(&mut self, pos: Position) {
        self.backward.insert(pos);
    }

    pub(crate) fn remove_dependent(&mut self, pos: Position) {
        self.backward.remove(&pos);
    }

    pub(crate) fn has_dependents(&self) -> bool {
        !self.backward.is_empty()
    }

    pub(crate) fn cached(&self) -> Option<f64> {
        self.cache.get().copied()
    }

    pub(crate) fn remember(&self, value: f64) {
        // Already set means a nested evaluation got there first with the
        // same inputs, so the value is identical.
        let _ = self.cache.set(value);
    }

    /// Drop the memoized value; returns whether one was present
    pub(crate) fn invalidate(&mut self) -> bool {
        self.cache.take().is_some()
    }
}
