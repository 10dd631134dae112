//! Board cell values and the classification predicates over them.
//!
//! Cells are stored with absolute team ownership. The "local"/"opponent"
//! view that clients see exists only on the wire, see [`Cell::wire_code`].

use serde::{Deserialize, Serialize};

/// One side of a match.
///
/// The anchor is the session's first-acting player (the original requester);
/// the canonical board is kept in the anchor's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// The requester, whose facing the canonical board uses.
    Anchor,
    /// The accepting player, who sees the board rotated 180 degrees.
    Challenger,
}

impl Team {
    /// Returns the opposing team.
    pub fn opponent(self) -> Self {
        match self {
            Team::Anchor => Team::Challenger,
            Team::Challenger => Team::Anchor,
        }
    }
}

/// A single board cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Unclaimed.
    #[default]
    Empty,
    /// Claimed by a regular card cell.
    Normal(Team),
    /// Claimed by a special card cell.
    Special(Team),
    /// A special cell that has been fully surrounded.
    Activated(Team),
    /// Permanent obstacle produced by a same-tier collision.
    Wall,
    /// Not part of the playable map.
    OutOfBounds,
}

impl Cell {
    /// True for unclaimed cells.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// True for locked walls.
    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }

    /// True for special and activated cells of either team.
    pub fn is_special(self) -> bool {
        matches!(self, Cell::Special(_) | Cell::Activated(_))
    }

    /// True only for the normal, special or activated cell of `team`.
    pub fn is_owned(self, team: Team) -> bool {
        self.owner() == Some(team)
    }

    /// Returns the owning team, if any.
    pub fn owner(self) -> Option<Team> {
        match self {
            Cell::Normal(t) | Cell::Special(t) | Cell::Activated(t) => Some(t),
            Cell::Empty | Cell::Wall | Cell::OutOfBounds => None,
        }
    }

    /// True when both cells are normal, or both are special, regardless of team.
    ///
    /// Only used to classify collisions; activated cells belong to no tier.
    pub fn same_tier(a: Cell, b: Cell) -> bool {
        matches!(
            (a, b),
            (Cell::Normal(_), Cell::Normal(_)) | (Cell::Special(_), Cell::Special(_))
        )
    }

    /// Encodes the cell as seen by `viewer`.
    ///
    /// 0 blank, 1-3 viewer's normal/special/activated, 4-6 the opponent's,
    /// 7 locked wall, 8 out of bounds.
    pub fn wire_code(self, viewer: Team) -> u8 {
        let side = |team: Team| if team == viewer { 0 } else { 3 };
        match self {
            Cell::Empty => 0,
            Cell::Normal(t) => 1 + side(t),
            Cell::Special(t) => 2 + side(t),
            Cell::Activated(t) => 3 + side(t),
            Cell::Wall => 7,
            Cell::OutOfBounds => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_owned_is_exact_per_team() {
        for team in Team::iter() {
            for cell in [Cell::Normal(team), Cell::Special(team), Cell::Activated(team)] {
                assert!(cell.is_owned(team));
                assert!(!cell.is_owned(team.opponent()));
                assert_eq!(cell.owner(), Some(team));
            }
            assert!(!Cell::Wall.is_owned(team));
            assert!(!Cell::Empty.is_owned(team));
        }
    }

    #[test]
    fn test_tiers_ignore_team_but_not_activation() {
        assert!(Cell::same_tier(Cell::Normal(Team::Anchor), Cell::Normal(Team::Challenger)));
        assert!(Cell::same_tier(Cell::Special(Team::Anchor), Cell::Special(Team::Challenger)));
        assert!(!Cell::same_tier(Cell::Normal(Team::Anchor), Cell::Special(Team::Challenger)));
        assert!(!Cell::same_tier(Cell::Activated(Team::Anchor), Cell::Special(Team::Anchor)));
    }

    #[test]
    fn test_wire_codes_are_perspective_relative() {
        let cell = Cell::Special(Team::Challenger);
        assert_eq!(cell.wire_code(Team::Challenger), 2);
        assert_eq!(cell.wire_code(Team::Anchor), 5);
        assert_eq!(Cell::Wall.wire_code(Team::Anchor), 7);
        assert_eq!(Cell::OutOfBounds.wire_code(Team::Challenger), 8);
    }
}
