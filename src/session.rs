//! Game sessions and the per-turn rendezvous between their two players.
//!
//! Both players act simultaneously. The first play to arrive in a turn is
//! held in a single buffer slot; the second one resolves the turn, and only
//! then do both players hear about each other's play.

use crate::config::BoardConfig;
use crate::games::turf::{Board, Card, CardCatalog, Play, Rejection, Team, validate};
use crate::protocol::{ErrorReason, PlayerId, ServerMessage, SessionId};
use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};

/// The turn buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// Nobody has played this turn.
    Waiting,
    /// One player has played and is waiting for the other.
    Buffered {
        /// Who played.
        player: PlayerId,
        /// Their play, in their own facing.
        play: Play,
        /// The card the play names.
        card: Card,
    },
}

/// Messages produced by a resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TurnResolution {
    /// The turn that resolved.
    turn: u32,
    /// One `results` message per participant.
    deliveries: Vec<(PlayerId, ServerMessage)>,
}

impl TurnResolution {
    /// Consumes the resolution, yielding its messages.
    pub fn into_deliveries(self) -> Vec<(PlayerId, ServerMessage)> {
        self.deliveries
    }
}

/// What happened to a submitted play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The sender is not part of this session; nothing changed.
    Ignored(ErrorReason),
    /// The play is illegal; nothing changed.
    Rejected(Rejection),
    /// The play was buffered and waits for the peer.
    Buffered {
        /// Current turn number.
        turn: u32,
    },
    /// The sender replaced their own buffered play.
    Overwritten {
        /// Current turn number.
        turn: u32,
    },
    /// Both plays are in and the turn resolved.
    Resolved(TurnResolution),
}

/// A running match between two players.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    anchor: PlayerId,
    challenger: PlayerId,
    board: Board,
    turn: u32,
    state: TurnState,
}

impl GameSession {
    /// Creates a session. `first` acts first and owns the canonical facing.
    #[instrument(skip(board_config))]
    pub fn new(
        id: SessionId,
        first: PlayerId,
        second: PlayerId,
        board_config: &BoardConfig,
    ) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            anchor: first,
            challenger: second,
            board: Board::new(board_config),
            turn: 1,
            state: TurnState::Waiting,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The first-acting player.
    pub fn first(&self) -> PlayerId {
        self.anchor
    }

    /// Both participants, first-acting player first.
    pub fn players(&self) -> [PlayerId; 2] {
        [self.anchor, self.challenger]
    }

    /// True if `player` takes part in this session.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.team_of(player).is_some()
    }

    /// The participant that is not `player`.
    pub fn other(&self, player: PlayerId) -> Option<PlayerId> {
        match self.team_of(player)? {
            Team::Anchor => Some(self.challenger),
            Team::Challenger => Some(self.anchor),
        }
    }

    /// The side `player` plays for.
    pub fn team_of(&self, player: PlayerId) -> Option<Team> {
        if player == self.anchor {
            Some(Team::Anchor)
        } else if player == self.challenger {
            Some(Team::Challenger)
        } else {
            None
        }
    }

    /// The accumulated board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of the turn currently being played.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Current turn buffer.
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// True while `turn` is still the current turn and a play is buffered.
    pub fn is_stalled_on(&self, turn: u32) -> bool {
        self.turn == turn && matches!(self.state, TurnState::Buffered { .. })
    }

    /// `start` messages for both players, each with their own view of the board.
    pub fn start_messages(&self) -> Vec<(PlayerId, ServerMessage)> {
        [(self.anchor, Team::Anchor), (self.challenger, Team::Challenger)]
            .into_iter()
            .map(|(player, team)| {
                let msg = ServerMessage::Start {
                    id: self.id,
                    first: self.anchor,
                    board: self.board.project(team),
                };
                (player, msg)
            })
            .collect()
    }

    /// Takes a play from `player`.
    ///
    /// Illegal plays are refused before they reach the buffer. A second play
    /// from the same player before the peer acts replaces the first.
    #[instrument(skip(self, play, catalog), fields(session_id = %self.id, turn = self.turn, card = %play.card))]
    pub fn submit(&mut self, player: PlayerId, play: Play, catalog: &CardCatalog) -> TurnOutcome {
        let Some(team) = self.team_of(player) else {
            warn!(%player, "Play from non-participant ignored");
            return TurnOutcome::Ignored(ErrorReason::NotParticipant);
        };

        let Some(card) = catalog.get(&play.card) else {
            debug!(%player, "Play names an unknown card");
            return TurnOutcome::Rejected(Rejection::UnknownCard);
        };

        if !play.is_pass() {
            let view = self.board.view_for(team);
            if let Err(rejection) =
                validate(&view, &card.rotated(play.turns), play.x, play.y, play.special, team)
            {
                debug!(%player, reason = rejection.reason(), "Play rejected");
                return TurnOutcome::Rejected(rejection);
            }
        }

        let card = card.clone();
        match std::mem::replace(&mut self.state, TurnState::Waiting) {
            TurnState::Waiting => {
                debug!(%player, "First play of turn buffered");
                self.state = TurnState::Buffered { player, play, card };
                TurnOutcome::Buffered { turn: self.turn }
            }
            TurnState::Buffered { player: held, .. } if held == player => {
                debug!(%player, "Buffered play replaced");
                self.state = TurnState::Buffered { player, play, card };
                TurnOutcome::Overwritten { turn: self.turn }
            }
            TurnState::Buffered {
                player: held,
                play: held_play,
                card: held_card,
            } => {
                let (anchor, challenger) = match team {
                    Team::Anchor => ((play, card), (held_play, held_card)),
                    Team::Challenger => ((held_play, held_card), (play, card)),
                };
                debug!(first = %held, second = %player, "Second play arrived");
                TurnOutcome::Resolved(self.resolve(anchor, challenger))
            }
        }
    }

    fn resolve(
        &mut self,
        (anchor_play, anchor_card): (Play, Card),
        (challenger_play, challenger_card): (Play, Card),
    ) -> TurnResolution {
        let (width, height) = (self.board.width(), self.board.height());
        let anchor_stamp = anchor_play.stamp(&anchor_card, Team::Anchor, width, height);
        let challenger_stamp =
            challenger_play.stamp(&challenger_card, Team::Challenger, width, height);
        self.board.resolve_turn(&anchor_stamp, &challenger_stamp);

        // Each recipient sees the opponent's play from across the table.
        let for_anchor = challenger_play.rotated_180(&challenger_card, width, height);
        let for_challenger = anchor_play.rotated_180(&anchor_card, width, height);

        let turn = self.turn;
        let deliveries = vec![
            (
                self.anchor,
                ServerMessage::Results {
                    play: for_anchor,
                    board: self.board.project(Team::Anchor),
                    turn,
                },
            ),
            (
                self.challenger,
                ServerMessage::Results {
                    play: for_challenger,
                    board: self.board.project(Team::Challenger),
                    turn,
                },
            ),
        ];

        info!(
            session_id = %self.id,
            turn,
            anchor_cells = self.board.owned_by(Team::Anchor),
            challenger_cells = self.board.owned_by(Team::Challenger),
            "Turn resolved"
        );

        self.turn += 1;
        self.state = TurnState::Waiting;
        TurnResolution { turn, deliveries }
    }
}
