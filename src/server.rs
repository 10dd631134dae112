//! WebSocket gateway.
//!
//! Each connection gets a fresh id, an outbound queue drained by a writer
//! task, and a reader loop that turns inbound frames into registry calls.
//! This is the only module that knows about the transport.

use crate::config::{ConfigError, ServerConfig};
use crate::games::turf::CardCatalog;
use crate::protocol::{ClientMessage, PlayerId, ServerMessage, SessionId};
use crate::registry::{AcceptOutcome, RequestOutcome, SessionRegistry};
use crate::session::TurnOutcome;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};

/// The game server: registry plus transport settings.
#[derive(Debug, Clone)]
pub struct GameServer {
    registry: SessionRegistry,
    turn_timeout: Option<Duration>,
    ping_interval: Duration,
}

impl GameServer {
    /// Creates a server around an existing registry.
    #[instrument(skip(registry))]
    pub fn with_registry(
        registry: SessionRegistry,
        turn_timeout: Option<Duration>,
        ping_interval: Duration,
    ) -> Self {
        info!("Creating game server with shared registry");
        Self {
            registry,
            turn_timeout,
            ping_interval,
        }
    }

    /// Builds the catalog and registry described by `config`.
    #[instrument(skip(config))]
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        config.board().validate()?;
        let catalog = match config.cards() {
            Some(path) => CardCatalog::from_toml_file(path)
                .map_err(|e| ConfigError::new(e.to_string()))?,
            None => CardCatalog::builtin(),
        };
        if catalog.is_empty() {
            return Err(ConfigError::new("Card catalog is empty".to_string()));
        }
        let registry = SessionRegistry::new(catalog, config.board().clone());
        Ok(Self::with_registry(
            registry,
            config.turn_timeout(),
            config.ping_interval(),
        ))
    }

    /// The shared registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// HTTP routes. The WebSocket is served on both `/` and `/ws`.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(ws_handler))
            .route("/ws", get(ws_handler))
            .with_state(self)
    }

    /// Serves until the listener fails.
    #[instrument(skip_all)]
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "Accepting WebSocket connections");
        }
        axum::serve(listener, self.router()).await
    }

    /// Handles one decoded client message.
    ///
    /// Returns the direct reply to the sender, if any. Notifications to other
    /// players are sent by the registry.
    #[instrument(skip(self, msg))]
    pub fn dispatch(&self, player: PlayerId, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Pong => {
                trace!("Pong");
                None
            }
            ClientMessage::Request { id } => match self.registry.open_request(player, id) {
                RequestOutcome::Sent { .. } => None,
                RequestOutcome::Refused(reason) => {
                    debug!(target_id = %id, %reason, "Request refused");
                    Some(ServerMessage::error(reason))
                }
            },
            ClientMessage::Accept { id } => match self.registry.accept_request(player, id) {
                AcceptOutcome::Started(session_id) => {
                    debug!(%session_id, "Accept started a session");
                    None
                }
                AcceptOutcome::Refused(reason) => {
                    debug!(requester = %id, %reason, "Accept refused");
                    Some(ServerMessage::error(reason))
                }
            },
            ClientMessage::Action { game_id, play } => {
                match self.registry.submit(player, game_id, play) {
                    TurnOutcome::Ignored(reason) => {
                        debug!(%game_id, %reason, "Action ignored");
                        Some(ServerMessage::error(reason))
                    }
                    TurnOutcome::Rejected(rejection) => Some(ServerMessage::Rejected {
                        reason: rejection.reason().to_string(),
                        message: rejection.to_string(),
                    }),
                    TurnOutcome::Buffered { turn } => {
                        self.arm_turn_deadline(game_id, turn);
                        None
                    }
                    TurnOutcome::Overwritten { .. } | TurnOutcome::Resolved(_) => None,
                }
            }
        }
    }

    /// Decodes a text frame and dispatches it. Undecodable frames are dropped.
    pub fn dispatch_text(&self, player: PlayerId, text: &str) -> Option<ServerMessage> {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.dispatch(player, msg),
            Err(e) => {
                debug!(player_id = %player, error = %e, "Dropping undecodable message");
                None
            }
        }
    }

    fn arm_turn_deadline(&self, session_id: SessionId, turn: u32) {
        let Some(timeout) = self.turn_timeout else {
            return;
        };
        let registry = self.registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if registry.expire_turn(session_id, turn) {
                info!(%session_id, turn, "Session aborted on turn deadline");
            }
        });
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(server): State<GameServer>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(server, socket))
}

#[instrument(skip_all)]
async fn handle_socket(server: GameServer, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let player = server.registry.connect(tx.clone());

    let ping_interval = server.ping_interval;
    let writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        ping.tick().await;
        loop {
            let msg = tokio::select! {
                next = rx.recv() => match next {
                    Some(msg) => msg,
                    None => break,
                },
                _ = ping.tick() => ServerMessage::Ping,
            };
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to encode message");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                trace!(player_id = %player, text = %text.as_str(), "recv");
                if let Some(reply) = server.dispatch_text(player, text.as_str())
                    && tx.send(reply).is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(player_id = %player, error = %e, "WebSocket error");
                break;
            }
        }
    }

    server.registry.unregister(player);
    writer.abort();
    info!(player_id = %player, "Connection closed");
}
