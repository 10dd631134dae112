//! The accumulated board of a running match.
//!
//! The board is stored once, in the anchor's facing and with absolute team
//! ownership. Each recipient gets a projection (rotated into their facing,
//! cells encoded relative to them) only when a message is built.

use super::cell::{Cell, Team};
use super::combine::combine;
use super::grid::Grid;
use crate::config::BoardConfig;
use tracing::{debug, instrument, warn};

/// Canonical board state for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid<Cell>,
}

impl Board {
    /// Builds the opening board: blocked cells out of bounds, one special
    /// starting cell per team, the challenger's mirrored through the centre.
    #[instrument(skip(config))]
    pub fn new(config: &BoardConfig) -> Self {
        let mut grid = Grid::new(*config.width(), *config.height());
        for &[x, y] in config.blocked() {
            if !grid.set(x, y, Cell::OutOfBounds) {
                warn!(x, y, "Blocked cell outside board");
            }
        }

        let [sx, sy] = config.start_cell();
        let (mx, my) = mirror(&grid, sx, sy);
        if !grid.set(sx, sy, Cell::Special(Team::Anchor))
            || !grid.set(mx, my, Cell::Special(Team::Challenger))
        {
            warn!(sx, sy, "Start cell outside board");
        }
        Self { grid }
    }

    /// Wraps an existing canonical grid.
    pub fn from_grid(grid: Grid<Cell>) -> Self {
        Self { grid }
    }

    /// The canonical grid (anchor's facing).
    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    /// Board width.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Board height.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// The grid rotated into `team`'s facing. Ownership stays absolute.
    pub fn view_for(&self, team: Team) -> Grid<Cell> {
        to_facing(&self.grid, team)
    }

    /// Wire rows for `team`: its own facing, its own cells as "local".
    pub fn project(&self, team: Team) -> Vec<Vec<u8>> {
        self.view_for(team).map(|cell| cell.wire_code(team)).to_rows()
    }

    /// Combines both teams' stamps (each in its owner's facing) and folds the
    /// result into the board. Returns the merged turn grid, canonical facing.
    #[instrument(skip_all)]
    pub fn resolve_turn(&mut self, anchor: &Grid<Cell>, challenger: &Grid<Cell>) -> Grid<Cell> {
        let challenger = to_facing(challenger, Team::Challenger);
        let merged = combine(anchor, &challenger);
        self.apply(&merged);
        merged
    }

    /// Writes every filled cell of `merged` onto the board. Walls and
    /// out-of-bounds cells already on the board are never overwritten.
    pub fn apply(&mut self, merged: &Grid<Cell>) {
        for (x, y, value) in merged.cells() {
            if value.is_empty() {
                continue;
            }
            match self.grid.get(x, y) {
                Some(Cell::Wall) | Some(Cell::OutOfBounds) | None => continue,
                Some(_) => {
                    self.grid.set(x, y, value);
                }
            }
        }
        self.activate_surrounded();
    }

    /// Promotes special cells with no empty neighbour to activated.
    fn activate_surrounded(&mut self) {
        let enclosed: Vec<(i32, i32, Team)> = self
            .grid
            .cells()
            .filter_map(|(x, y, cell)| match cell {
                Cell::Special(team) if !self.grid.any_neighbor(x, y, Cell::is_empty) => {
                    Some((x, y, team))
                }
                _ => None,
            })
            .collect();
        for &(x, y, team) in &enclosed {
            self.grid.set(x, y, Cell::Activated(team));
        }
        if !enclosed.is_empty() {
            debug!(count = enclosed.len(), "Special cells activated");
        }
    }

    /// Number of cells owned by `team`.
    pub fn owned_by(&self, team: Team) -> usize {
        self.grid.cells().filter(|(_, _, c)| c.is_owned(team)).count()
    }
}

/// Rotates a grid between the canonical facing and `team`'s facing.
/// A half turn is its own inverse, so this works in both directions.
pub fn to_facing(grid: &Grid<Cell>, team: Team) -> Grid<Cell> {
    match team {
        Team::Anchor => grid.clone(),
        Team::Challenger => grid.rotate_180(),
    }
}

fn mirror(grid: &Grid<Cell>, x: i32, y: i32) -> (i32, i32) {
    (grid.width() as i32 - 1 - x, grid.height() as i32 - 1 - y)
}
