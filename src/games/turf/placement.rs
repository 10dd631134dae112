//! Plays and the legality rules for placing them.
//!
//! A play is always expressed in the submitting player's own facing. The
//! validator therefore runs against the board as that player sees it, and
//! adjacency only ever counts the placing team's own cells.

use super::card::{Card, CardCell};
use super::cell::{Cell, Team};
use super::grid::Grid;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// What a player does with their card this turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Stamp the card onto the board.
    #[default]
    #[serde(alias = "place")]
    Play,
    /// Discard the card without inking anything.
    Pass,
}

/// One player's action for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Play {
    /// Catalog name of the card.
    pub card: String,
    /// Place or pass.
    #[serde(default)]
    pub action: ActionKind,
    /// Column of the rotated card's top-left corner.
    #[serde(default)]
    pub x: i32,
    /// Row of the rotated card's top-left corner.
    #[serde(default)]
    pub y: i32,
    /// Clockwise quarter turns applied to the card.
    #[serde(default)]
    pub turns: i32,
    /// Whether the special boost is used.
    #[serde(default)]
    pub special: bool,
}

impl Play {
    /// A pass with the given card.
    pub fn pass(card: impl Into<String>) -> Self {
        Self::new(card.into(), ActionKind::Pass, 0, 0, 0, false)
    }

    /// True for passes.
    pub fn is_pass(&self) -> bool {
        self.action == ActionKind::Pass
    }

    /// Renders the play as a board-sized grid of `team`'s cells.
    ///
    /// Cells that would land outside the grid are dropped.
    #[instrument(skip(self, card), fields(card_name = %self.card))]
    pub fn stamp(&self, card: &Card, team: Team, width: usize, height: usize) -> Grid<Cell> {
        let mut grid = Grid::new(width, height);
        if self.is_pass() {
            return grid;
        }
        for (cx, cy, value) in card.rotated(self.turns).cells() {
            let cell = match value {
                CardCell::Empty => continue,
                CardCell::Regular => Cell::Normal(team),
                CardCell::Special => Cell::Special(team),
            };
            let Some((x, y)) = offset(cx, cy, self.x, self.y) else {
                debug!(cx, cy, "Stamped off grid");
                continue;
            };
            if !grid.set(x, y, cell) {
                debug!(x, y, "Stamped off grid");
            }
        }
        grid
    }

    /// The same play as seen from the opposite seat of a `width` x `height` board.
    pub fn rotated_180(&self, card: &Card, width: usize, height: usize) -> Self {
        if self.is_pass() {
            return self.clone();
        }
        let rotated = card.rotated(self.turns);
        Self {
            x: (width as i32)
                .saturating_sub(self.x)
                .saturating_sub(rotated.width() as i32),
            y: (height as i32)
                .saturating_sub(self.y)
                .saturating_sub(rotated.height() as i32),
            turns: (self.turns.rem_euclid(4) + 2) % 4,
            ..self.clone()
        }
    }
}

/// Why a placement was refused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    /// An inked cell lands outside the map.
    #[display("Placement is off the target board")]
    OffBoard,
    /// An inked cell lands on a locked wall.
    #[display("Placement is over a wall")]
    WallConflict,
    /// A special placement covers a special cell.
    #[display("Special placement is over a special square")]
    SpecialConflict,
    /// A normal placement covers a claimed cell.
    #[display("Placement is over a claimed square")]
    Conflict,
    /// A special placement touches none of the player's special cells.
    #[display("Special placement is not next to a special square")]
    TooFarFromSpecial,
    /// A normal placement touches none of the player's cells.
    #[display("Placement is not next to an owned square")]
    TooFarFromOwned,
    /// The named card is not in the catalog.
    #[display("Unknown card")]
    UnknownCard,
}

impl Rejection {
    /// Stable machine-readable reason.
    pub fn reason(self) -> &'static str {
        self.into()
    }
}

impl std::error::Error for Rejection {}

/// Checks whether `card_grid` (already rotated) may be stamped at
/// `(offset_x, offset_y)` by `team`.
#[instrument(skip(board, card_grid))]
pub fn validate(
    board: &Grid<Cell>,
    card_grid: &Grid<CardCell>,
    offset_x: i32,
    offset_y: i32,
    special: bool,
    team: Team,
) -> Result<(), Rejection> {
    // Coordinates that overflow are as off the board as any other.
    let covered: Vec<(i32, i32)> = card_grid
        .cells()
        .filter(|(_, _, value)| *value != CardCell::Empty)
        .map(|(x, y, _)| offset(x, y, offset_x, offset_y).ok_or(Rejection::OffBoard))
        .collect::<Result<_, _>>()?;

    if covered.iter().any(|&(x, y)| board.is_off_board(x, y)) {
        return Err(Rejection::OffBoard);
    }

    let mut anchored = false;
    for &(x, y) in &covered {
        let target = board.get(x, y).unwrap_or(Cell::OutOfBounds);
        if target.is_wall() {
            return Err(Rejection::WallConflict);
        }
        if special {
            if target.is_special() {
                return Err(Rejection::SpecialConflict);
            }
            anchored |= board.any_neighbor(x, y, |n| n.is_owned(team) && n.is_special());
        } else {
            if !target.is_empty() {
                return Err(Rejection::Conflict);
            }
            anchored |= board.any_neighbor(x, y, |n| n.is_owned(team));
        }
    }

    match (anchored, special) {
        (true, _) => Ok(()),
        (false, true) => Err(Rejection::TooFarFromSpecial),
        (false, false) => Err(Rejection::TooFarFromOwned),
    }
}

fn offset(x: i32, y: i32, dx: i32, dy: i32) -> Option<(i32, i32)> {
    Some((x.checked_add(dx)?, y.checked_add(dy)?))
}
