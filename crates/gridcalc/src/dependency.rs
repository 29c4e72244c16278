//! Dependency graph walks
//!
//! Every cell records two edge sets: the cells its formula reads (forward)
//! and the cells whose formulas read it (backward). The walks here never
//! recurse; they keep an explicit stack or queue and a visited set so that
//! long chains and diamond-shaped graphs are handled in linear time.

use std::collections::{BTreeSet, VecDeque};

use ahash::AHashSet;
use log::trace;

use crate::sheet::Sheet;
use gridcalc_core::{Error, Position, Result};

impl Sheet {
    /// Check that giving `pos` the forward edges `references` keeps the graph
    /// acyclic
    ///
    /// Starting from the new references, follows existing forward edges. If
    /// `pos` is reachable the change would close a cycle. Targets with no
    /// cell yet have no forward edges and end the path.
    pub(crate) fn check_circular(&self, pos: Position, references: &BTreeSet<Position>) -> Result<()> {
        if references.contains(&pos) {
            return Err(Error::CircularDependency(pos));
        }

        let mut visited: AHashSet<Position> = AHashSet::new();
        let mut stack: Vec<Position> = references.iter().copied().collect();

        while let Some(current) = stack.pop() {
            if current == pos {
                return Err(Error::CircularDependency(pos));
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cell(current) {
                stack.extend(cell.forward().iter().copied().filter(|p| !visited.contains(p)));
            }
        }

        Ok(())
    }

    /// Drop memoized values of every transitive dependent of `pos`
    ///
    /// The cell at `pos` itself has already been reset by the caller. Each
    /// dependent is visited at most once.
    pub(crate) fn invalidate_dependents(&mut self, pos: Position) {
        let mut visited: AHashSet<Position> = AHashSet::new();
        visited.insert(pos);

        let mut queue: VecDeque<Position> = VecDeque::new();
        if let Some(cell) = self.cell(pos) {
            queue.extend(cell.backward().iter().copied());
        }

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cell_mut(current) {
                if cell.invalidate() {
                    trace!("invalidated {}", current);
                }
                queue.extend(cell.backward().iter().copied().filter(|p| !visited.contains(p)));
            }
        }
    }

    /// Cells that must be recomputed after `pos` changes, in an order where
    /// every cell comes after all of its precedents
    ///
    /// `pos` itself is not included. An empty vector means nothing reads the
    /// cell, directly or indirectly.
    pub fn dependents_in_order(&self, pos: Position) -> Result<Vec<Position>> {
        if !self.is_in_bounds(pos) {
            return Err(Error::InvalidPosition(pos));
        }

        let mut visited: AHashSet<Position> = AHashSet::new();
        let mut finished: Vec<Position> = Vec::new();
        // (cell, children pushed?)
        let mut stack: Vec<(Position, bool)> = vec![(pos, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                finished.push(current);
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            if let Some(cell) = self.cell(current) {
                for &dependent in cell.backward().iter().rev() {
                    if !visited.contains(&dependent) {
                        stack.push((dependent, false));
                    }
                }
            }
        }

        // Post-order puts every cell after its dependents; reverse it and
        // drop `pos`, which finishes last.
        finished.pop();
        finished.reverse();
        Ok(finished)
    }

    /// Formula cells that must be evaluated to produce the value of `pos`,
    /// precedents first and `pos` last
    ///
    /// Only uncached formulas are included; a cached, text or empty cell
    /// answers directly and ends the walk.
    pub(crate) fn evaluation_order(&self, pos: Position) -> Vec<Position> {
        let needs_evaluation = |p: Position| {
            self.cell(p)
                .map_or(false, |c| c.content().is_formula() && c.cached().is_none())
        };

        let mut visited: AHashSet<Position> = AHashSet::new();
        let mut order: Vec<Position> = Vec::new();
        let mut stack: Vec<(Position, bool)> = vec![(pos, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            if let Some(cell) = self.cell(current) {
                for &precedent in cell.forward().iter().rev() {
                    if !visited.contains(&precedent) && needs_evaluation(precedent) {
                        stack.push((precedent, false));
                    }
                }
            }
        }

        order
    }
}
