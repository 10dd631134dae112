//! Merging two simultaneous plays into one grid.
//!
//! Both inputs are board-sized stamps in the same facing. Where both sides
//! ink the same cell at the same tier, neither wins and the cell locks into
//! a wall.

use super::cell::Cell;
use super::grid::Grid;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Coordinates where both grids are filled with same-tier values.
///
/// Symmetric in its arguments.
pub fn wall_set(a: &Grid<Cell>, b: &Grid<Cell>) -> BTreeSet<(i32, i32)> {
    a.cells()
        .filter(|(_, _, va)| !va.is_empty())
        .filter_map(|(x, y, va)| match b.get(x, y) {
            Some(vb) if !vb.is_empty() && Cell::same_tier(va, vb) => Some((x, y)),
            _ => None,
        })
        .collect()
}

/// Copies every non-empty cell of `top` onto `base`.
///
/// Writes that would leave `base`, or land on one of its out-of-bounds
/// cells, are dropped.
pub fn overlay(base: &Grid<Cell>, top: &Grid<Cell>) -> Grid<Cell> {
    let mut merged = base.clone();
    for (x, y, value) in top.cells() {
        if value.is_empty() {
            continue;
        }
        if merged.is_off_board(x, y) {
            debug!(x, y, "Overlay off grid");
            continue;
        }
        merged.set(x, y, value);
    }
    merged
}

/// Merges two plays. Same-tier overlaps become walls, stamped last.
#[instrument(skip_all, fields(width = a.width(), height = a.height()))]
pub fn combine(a: &Grid<Cell>, b: &Grid<Cell>) -> Grid<Cell> {
    let walls = wall_set(a, b);
    let empty = Grid::new(a.width(), a.height());
    let mut merged = overlay(&overlay(&empty, a), b);
    for &(x, y) in &walls {
        merged.set(x, y, Cell::Wall);
    }
    debug!(walls = walls.len(), "Plays combined");
    merged
}
