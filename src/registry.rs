//! Live connections, pending match requests and running sessions.
//!
//! [`SessionRegistry`] is built once at startup and handed to the gateway.
//! All three tables sit behind one lock, so each operation is a single atomic
//! transition. Operations never await while holding the lock; outbound
//! messages go through unbounded channels and cannot block.

use crate::config::BoardConfig;
use crate::games::turf::{CardCatalog, Play};
use crate::protocol::{AbortReason, ErrorReason, PlayerId, ServerMessage, SessionId};
use crate::session::{GameSession, TurnOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Sending half of a connection's outbound queue.
pub type Outbox = UnboundedSender<ServerMessage>;

/// Result of opening a match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The target was notified.
    Sent {
        /// Earlier target whose request this one replaced.
        superseded: Option<PlayerId>,
    },
    /// The request was refused.
    Refused(ErrorReason),
}

/// Result of accepting a match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// A session started.
    Started(SessionId),
    /// The accept was refused.
    Refused(ErrorReason),
}

/// What a disconnect tore down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    /// Requests made by or aimed at the departed player.
    pub purged_requests: usize,
    /// Sessions aborted because the player was in them.
    pub aborted_sessions: Vec<SessionId>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<PlayerId, Outbox>,
    /// Keyed by requester; value is the target.
    requests: HashMap<PlayerId, PlayerId>,
    sessions: HashMap<SessionId, GameSession>,
}

impl RegistryState {
    fn send(&self, to: PlayerId, msg: ServerMessage) {
        match self.connections.get(&to) {
            Some(outbox) => {
                if outbox.send(msg).is_err() {
                    debug!(player_id = %to, "Outbox closed, message dropped");
                }
            }
            None => debug!(player_id = %to, "No connection, message dropped"),
        }
    }

    fn in_session(&self, player: PlayerId) -> bool {
        self.sessions.values().any(|s| s.contains(player))
    }

    fn abort(&mut self, session_id: SessionId, reason: AbortReason) -> Option<GameSession> {
        let session = self.sessions.remove(&session_id)?;
        for player in session.players() {
            self.send(
                player,
                ServerMessage::Aborted {
                    id: session_id,
                    reason,
                },
            );
        }
        info!(%session_id, %reason, "Session aborted");
        Some(session)
    }
}

/// Shared handle to all server-side state.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
    catalog: Arc<CardCatalog>,
    board: Arc<BoardConfig>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument(skip_all, fields(cards = catalog.len()))]
    pub fn new(catalog: CardCatalog, board: BoardConfig) -> Self {
        info!("Creating session registry");
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            catalog: Arc::new(catalog),
            board: Arc::new(board),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The card catalog plays are checked against.
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Assigns a fresh id to a new connection and announces it.
    pub fn connect(&self, outbox: Outbox) -> PlayerId {
        let id = Uuid::new_v4();
        self.register(id, outbox);
        id
    }

    /// Records a connection under `id` and sends it its identity.
    #[instrument(skip(self, outbox))]
    pub fn register(&self, id: PlayerId, outbox: Outbox) {
        let mut state = self.lock();
        if state.connections.insert(id, outbox).is_some() {
            warn!(player_id = %id, "Connection id re-registered");
        }
        state.send(id, ServerMessage::Id { id });
        info!(player_id = %id, connections = state.connections.len(), "Connection registered");
    }

    /// Removes a connection with everything that depends on it.
    ///
    /// Requests by or for the player are dropped. Every session they were in
    /// is aborted and the remaining participant is told.
    #[instrument(skip(self))]
    pub fn unregister(&self, id: PlayerId) -> Departure {
        let mut state = self.lock();
        state.connections.remove(&id);

        let before = state.requests.len();
        state.requests.retain(|from, to| *from != id && *to != id);
        let purged_requests = before - state.requests.len();

        let doomed: Vec<SessionId> = state
            .sessions
            .values()
            .filter(|s| s.contains(id))
            .map(GameSession::id)
            .collect();
        for session_id in &doomed {
            state.abort(*session_id, AbortReason::Disconnect);
        }

        info!(
            player_id = %id,
            purged_requests,
            aborted = doomed.len(),
            "Connection unregistered"
        );
        Departure {
            purged_requests,
            aborted_sessions: doomed,
        }
    }

    /// Records `from`'s request to play `to` and notifies `to`.
    ///
    /// A requester has at most one outstanding request; a new one replaces it.
    #[instrument(skip(self))]
    pub fn open_request(&self, from: PlayerId, to: PlayerId) -> RequestOutcome {
        let mut state = self.lock();
        if from == to {
            debug!("Self request refused");
            return RequestOutcome::Refused(ErrorReason::SelfRequest);
        }
        if !state.connections.contains_key(&to) {
            debug!("Request target offline");
            return RequestOutcome::Refused(ErrorReason::UnknownPlayer);
        }

        let superseded = state.requests.insert(from, to).filter(|prev| *prev != to);
        state.send(to, ServerMessage::Request { id: from });
        info!(?superseded, "Match request sent");
        RequestOutcome::Sent { superseded }
    }

    /// `accepter` takes up the pending request made by `requester`.
    ///
    /// On success the request is consumed, a session starts with the
    /// requester acting first, and both players get `start`.
    #[instrument(skip(self))]
    pub fn accept_request(&self, accepter: PlayerId, requester: PlayerId) -> AcceptOutcome {
        let mut state = self.lock();
        if state.requests.get(&requester) != Some(&accepter) {
            debug!("No matching request");
            return AcceptOutcome::Refused(ErrorReason::NoSuchRequest);
        }
        if state.in_session(accepter) || state.in_session(requester) {
            debug!("Player already in a session");
            return AcceptOutcome::Refused(ErrorReason::Busy);
        }

        state.requests.remove(&requester);
        let session = GameSession::new(Uuid::new_v4(), requester, accepter, &self.board);
        let session_id = session.id();
        for (player, msg) in session.start_messages() {
            state.send(player, msg);
        }
        state.sessions.insert(session_id, session);

        info!(%session_id, sessions = state.sessions.len(), "Session started");
        AcceptOutcome::Started(session_id)
    }

    /// Routes a play into its session's turn buffer.
    ///
    /// On resolution both players receive `results`; every other outcome is
    /// returned for the caller to report.
    #[instrument(skip(self, play))]
    pub fn submit(&self, player: PlayerId, session_id: SessionId, play: Play) -> TurnOutcome {
        let mut state = self.lock();
        let Some(session) = state.sessions.get_mut(&session_id) else {
            debug!("Play for unknown session");
            return TurnOutcome::Ignored(ErrorReason::UnknownSession);
        };

        let outcome = session.submit(player, play, &self.catalog);
        if let TurnOutcome::Resolved(resolution) = &outcome {
            for (to, msg) in resolution.deliveries() {
                state.send(*to, msg.clone());
            }
        }
        outcome
    }

    /// Aborts `session_id` if it is still buffered on `turn`.
    ///
    /// Returns true if the session was aborted.
    #[instrument(skip(self))]
    pub fn expire_turn(&self, session_id: SessionId, turn: u32) -> bool {
        let mut state = self.lock();
        let stalled = state
            .sessions
            .get(&session_id)
            .is_some_and(|s| s.is_stalled_on(turn));
        if !stalled {
            return false;
        }
        warn!(%session_id, turn, "Turn deadline passed");
        state.abort(session_id, AbortReason::Timeout).is_some()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Number of running sessions.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// The target of `requester`'s outstanding request.
    pub fn pending_request(&self, requester: PlayerId) -> Option<PlayerId> {
        self.lock().requests.get(&requester).copied()
    }

    /// A snapshot of a session.
    pub fn session(&self, id: SessionId) -> Option<GameSession> {
        self.lock().sessions.get(&id).cloned()
    }

    /// The session `player` is in, if any.
    pub fn session_of(&self, player: PlayerId) -> Option<SessionId> {
        self.lock()
            .sessions
            .values()
            .find(|s| s.contains(player))
            .map(GameSession::id)
    }
}
