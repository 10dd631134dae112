//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, the `TURF_DUEL_PORT` environment variable, and CLI flags.

use crate::games::turf::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable that overrides the listening port.
pub const PORT_ENV: &str = "TURF_DUEL_PORT";

/// Largest accepted board width or height.
pub const MAX_BOARD_DIMENSION: usize = 256;

/// Board shape for new sessions.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct BoardConfig {
    /// Columns.
    width: usize,
    /// Rows.
    height: usize,
    /// Cells removed from the map, as `[x, y]` in the anchor's facing.
    blocked: Vec<[i32; 2]>,
    /// The anchor's starting special cell. Defaults to bottom centre.
    #[setters(strip_option)]
    start: Option<[i32; 2]>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            blocked: Vec::new(),
            start: None,
        }
    }
}

impl BoardConfig {
    /// The anchor's starting cell; the challenger starts at its mirror image.
    pub fn start_cell(&self) -> [i32; 2] {
        self.start
            .unwrap_or([(self.width / 2) as i32, self.height as i32 - 2])
    }

    /// Rejects boards that cannot host a match.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::new(format!(
                "Board must be at least 2x2, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_BOARD_DIMENSION || self.height > MAX_BOARD_DIMENSION {
            return Err(ConfigError::new(format!(
                "Board may be at most {}x{}, got {}x{}",
                MAX_BOARD_DIMENSION, MAX_BOARD_DIMENSION, self.width, self.height
            )));
        }
        let [x, y] = self.start_cell();
        let inside = |x: i32, y: i32| {
            x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
        };
        if !inside(x, y) {
            return Err(ConfigError::new(format!("Start cell ({}, {}) is off the board", x, y)));
        }
        let mirror = [self.width as i32 - 1 - x, self.height as i32 - 1 - y];
        if mirror == [x, y] {
            return Err(ConfigError::new("Start cell cannot be the board centre".to_string()));
        }
        if self.blocked.iter().any(|b| *b == [x, y] || *b == mirror) {
            return Err(ConfigError::new("Start cell is blocked".to_string()));
        }
        Ok(())
    }
}

/// Top-level server settings.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    host: String,
    /// Bind port.
    port: u16,
    /// Board shape.
    board: BoardConfig,
    /// Seconds a buffered play waits for the peer before the session aborts.
    /// `None` waits forever.
    turn_timeout_secs: Option<u64>,
    /// Seconds between server pings on each connection.
    ping_interval_secs: u64,
    /// Optional card file replacing the built-in catalog.
    #[setters(strip_option)]
    cards: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            board: BoardConfig::default(),
            turn_timeout_secs: Some(120),
            ping_interval_secs: 30,
            cards: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies `TURF_DUEL_PORT` if it is set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            self.port = raw
                .parse()
                .map_err(|_| ConfigError::new(format!("{} is not a valid port: {}", PORT_ENV, raw)))?;
            debug!(port = self.port, "Port taken from environment");
        }
        Ok(self)
    }

    /// The per-turn deadline, if any. Zero disables it.
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Interval between pings, at least one second.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
