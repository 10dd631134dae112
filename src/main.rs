//! Turf Duel - server entry point.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use turf_duel::cli::{Cli, Command};
use turf_duel::{CardCatalog, GameServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            host,
            width,
            height,
            turn_timeout,
            cards,
        } => {
            let overrides = Overrides {
                port,
                host,
                width,
                height,
                turn_timeout,
                cards,
            };
            run_server(config, overrides).await
        }
        Command::Cards { file } => list_cards(file),
    }
}

/// CLI values that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    port: Option<u16>,
    host: Option<String>,
    width: Option<usize>,
    height: Option<usize>,
    turn_timeout: Option<u64>,
    cards: Option<PathBuf>,
}

#[instrument(skip(overrides))]
fn load_config(path: Option<PathBuf>, overrides: Overrides) -> Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    }
    .with_env_overrides()?;

    if let Some(port) = overrides.port {
        config = config.with_port(port);
    }
    if let Some(host) = overrides.host {
        config = config.with_host(host);
    }
    if let Some(width) = overrides.width {
        let board = config.board().clone().with_width(width);
        config = config.with_board(board);
    }
    if let Some(height) = overrides.height {
        let board = config.board().clone().with_height(height);
        config = config.with_board(board);
    }
    if let Some(secs) = overrides.turn_timeout {
        config = config.with_turn_timeout_secs(Some(secs));
    }
    if let Some(cards) = overrides.cards {
        config = config.with_cards(cards);
    }
    Ok(config)
}

/// Run the WebSocket game server
async fn run_server(path: Option<PathBuf>, overrides: Overrides) -> Result<()> {
    let config = load_config(path, overrides)?;
    info!(
        host = %config.host(),
        port = config.port(),
        width = config.board().width(),
        height = config.board().height(),
        turn_timeout = ?config.turn_timeout(),
        "Starting Turf Duel server"
    );

    let server = GameServer::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at ws://{}:{}/", config.host(), config.port());

    server.serve(listener).await?;
    Ok(())
}

/// Print the cards of a catalog
fn list_cards(file: Option<PathBuf>) -> Result<()> {
    let catalog = match file {
        Some(path) => CardCatalog::from_toml_file(path)?,
        None => CardCatalog::builtin(),
    };
    let mut names: Vec<_> = catalog.names().collect();
    names.sort();
    for name in names {
        if let Some(card) = catalog.get(name) {
            println!(
                "{:<12} cost {}  {}x{}",
                name,
                card.special_cost(),
                card.grid().width(),
                card.grid().height()
            );
        }
    }
    Ok(())
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,turf_duel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
