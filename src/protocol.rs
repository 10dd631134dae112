//! JSON wire messages exchanged over the WebSocket.
//!
//! Every message is an object tagged by `type`. Boards travel as rows of
//! perspective-relative cell codes, see [`Cell::wire_code`](crate::Cell::wire_code).

use crate::games::turf::Play;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of a live connection.
pub type PlayerId = Uuid;

/// Identity of a game session.
pub type SessionId = Uuid;

/// Board rows as sent to one recipient.
pub type WireBoard = Vec<Vec<u8>>;

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Ask to play against `id`.
    Request {
        /// Target player.
        id: PlayerId,
    },
    /// Accept a pending request from `id`.
    Accept {
        /// Original requester.
        id: PlayerId,
    },
    /// Submit this turn's play.
    Action {
        /// Session the play belongs to.
        #[serde(rename = "gameId")]
        game_id: SessionId,
        /// The play itself, flattened into the message.
        #[serde(flatten)]
        play: Play,
    },
    /// Liveness acknowledgement.
    Pong,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Assigns the connection's identity.
    Id {
        /// The new identity.
        id: PlayerId,
    },
    /// Someone wants to play.
    Request {
        /// The requester.
        id: PlayerId,
    },
    /// A session has begun.
    Start {
        /// Session id, used in `action` messages.
        id: SessionId,
        /// The first-acting player.
        first: PlayerId,
        /// Opening board in the recipient's perspective.
        board: WireBoard,
    },
    /// A turn resolved.
    Results {
        /// The opponent's play, in the recipient's facing.
        play: Play,
        /// Accumulated board in the recipient's perspective.
        board: WireBoard,
        /// Number of the turn that just resolved.
        turn: u32,
    },
    /// The submitted play was refused; the turn is still open.
    Rejected {
        /// Machine-readable reason.
        reason: String,
        /// Human-readable message.
        message: String,
    },
    /// The session ended early.
    Aborted {
        /// The session that ended.
        id: SessionId,
        /// Why it ended.
        reason: AbortReason,
    },
    /// A request could not be routed.
    Error {
        /// Machine-readable reason.
        reason: ErrorReason,
        /// Human-readable message.
        message: String,
    },
    /// Liveness check; clients answer with `pong`.
    Ping,
    /// Final scores. Reserved: the server does not score matches.
    End {
        /// Score per player.
        results: HashMap<PlayerId, u32>,
    },
}

impl ServerMessage {
    /// Builds an `error` message from its reason.
    pub fn error(reason: ErrorReason) -> Self {
        ServerMessage::Error {
            reason,
            message: reason.to_string(),
        }
    }
}

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// A participant disconnected.
    #[display("disconnect")]
    Disconnect,
    /// A buffered play waited past the turn deadline.
    #[display("timeout")]
    Timeout,
}

/// Why a routing or protocol request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// The message could not be parsed.
    #[display("Malformed message")]
    Malformed,
    /// The target id is not connected.
    #[display("Player is not connected")]
    UnknownPlayer,
    /// A player cannot challenge themselves.
    #[display("Cannot request a game with yourself")]
    SelfRequest,
    /// No matching request is pending.
    #[display("No pending request from that player")]
    NoSuchRequest,
    /// One of the players is already in a session.
    #[display("Player is already in a game")]
    Busy,
    /// The session does not exist.
    #[display("Unknown game")]
    UnknownSession,
    /// The sender is not part of the session.
    #[display("Not a participant of that game")]
    NotParticipant,
}
