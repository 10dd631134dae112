//! Turf Duel library - pairing server and grid engine
//!
//! Two players connect over WebSocket, pair up through match requests, and
//! then play simultaneous turns placing rotated card shapes on a shared
//! board.
//!
//! # Architecture
//!
//! - **Games**: pure grid engine (rotation, placement rules, combining plays)
//! - **Session**: per-match turn buffer that pairs both players' plays
//! - **Registry**: connections, match requests and sessions behind one lock
//! - **Server**: axum WebSocket gateway
//!
//! # Example
//!
//! ```no_run
//! use turf_duel::{GameServer, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let server = GameServer::from_config(&config)?;
//! let listener = tokio::net::TcpListener::bind(("127.0.0.1", *config.port())).await?;
//! server.serve(listener).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
mod config;
mod games;
mod protocol;
mod registry;
mod server;
mod session;

// Crate-level exports - Configuration
pub use config::{BoardConfig, ConfigError, MAX_BOARD_DIMENSION, PORT_ENV, ServerConfig};

// Crate-level exports - Grid engine
pub use games::turf::{
    ActionKind, Board, Card, CardCatalog, CardCell, CatalogError, Cell, DEFAULT_HEIGHT,
    DEFAULT_WIDTH, Grid, Play, Rejection, Team, combine, create_grid, overlay, to_facing,
    validate, wall_set,
};

// Crate-level exports - Wire protocol
pub use protocol::{
    AbortReason, ClientMessage, ErrorReason, PlayerId, ServerMessage, SessionId, WireBoard,
};

// Crate-level exports - Session management
pub use registry::{AcceptOutcome, Departure, Outbox, RequestOutcome, SessionRegistry};
pub use session::{GameSession, TurnOutcome, TurnResolution, TurnState};

// Crate-level exports - Server
pub use server::GameServer;
