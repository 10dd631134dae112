//! Tests for configuration files and the card catalog.

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use turf_duel::{BoardConfig, CardCatalog, CardCell, MAX_BOARD_DIMENSION, ServerConfig};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 8090);
    assert_eq!(config.turn_timeout(), Some(Duration::from_secs(120)));
    assert_eq!(config.ping_interval(), Duration::from_secs(30));
    assert_eq!(config.board().start_cell(), [4, 6]);
    assert!(config.board().validate().is_ok());
}

#[test]
fn test_load_from_file() {
    let file = write_temp(
        r#"
port = 9000
turn_timeout_secs = 30

[board]
width = 10
height = 6
blocked = [[0, 0], [9, 5]]
"#,
    );
    let config = ServerConfig::from_file(file.path()).expect("valid config");
    assert_eq!(*config.port(), 9000);
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.turn_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(*config.board().width(), 10);
    assert_eq!(*config.board().height(), 6);
    assert_eq!(config.board().blocked(), &vec![[0, 0], [9, 5]]);
}

#[test]
fn test_missing_or_bad_file_errors() {
    assert!(ServerConfig::from_file("/definitely/not/here.toml").is_err());
    let file = write_temp("port = \"eighty\"");
    let err = ServerConfig::from_file(file.path()).expect_err("bad port type");
    assert!(err.message.contains("parse"));
}

#[test]
fn test_zero_timeout_disables_deadline() {
    let config = ServerConfig::default().with_turn_timeout_secs(Some(0));
    assert_eq!(config.turn_timeout(), None);
    let config = ServerConfig::default().with_turn_timeout_secs(None);
    assert_eq!(config.turn_timeout(), None);
}

#[test]
fn test_board_validation() {
    assert!(BoardConfig::default().with_height(1).validate().is_err());
    let widest = BoardConfig::default().with_width(MAX_BOARD_DIMENSION);
    assert!(widest.validate().is_ok());
    assert!(
        BoardConfig::default()
            .with_width(MAX_BOARD_DIMENSION + 1)
            .validate()
            .is_err()
    );
    assert!(
        BoardConfig::default()
            .with_height(usize::MAX)
            .validate()
            .is_err()
    );
    assert!(BoardConfig::default().with_start([9, 0]).validate().is_err());
    // Centre of a 3x3 board mirrors onto itself.
    assert!(
        BoardConfig::default()
            .with_width(3)
            .with_height(3)
            .with_start([1, 1])
            .validate()
            .is_err()
    );
    assert!(
        BoardConfig::default()
            .with_blocked(vec![[3, 1]])
            .validate()
            .is_err()
    );
}

#[test]
fn test_builtin_catalog() {
    let catalog = CardCatalog::builtin();
    assert!(catalog.len() >= 10);
    let tee = catalog.get("tee").expect("builtin tee");
    assert_eq!(tee.grid().width(), 3);
    assert_eq!(tee.grid().get(1, 1), Some(CardCell::Special));
    assert!(catalog.names().any(|name| name == "hook"));
}

#[test]
fn test_catalog_from_toml() {
    let catalog = CardCatalog::from_toml_str(
        r###"
[[card]]
name = "stair"
special_cost = 2
rows = ["#..", "##.", ".#*"]

[[card]]
name = "single"
rows = ["#"]
"###,
    )
    .expect("valid cards");
    assert_eq!(catalog.len(), 2);
    let stair = catalog.get("stair").expect("stair");
    assert_eq!(*stair.special_cost(), 2);
    assert_eq!(stair.rotated(1).width(), 3);
    assert_eq!(*catalog.get("single").expect("single").special_cost(), 0);
}

#[test]
fn test_catalog_rejects_bad_cards() {
    let duplicate = r###"
[[card]]
name = "x"
rows = ["#"]

[[card]]
name = "x"
rows = ["##"]
"###;
    assert!(CardCatalog::from_toml_str(duplicate).is_err());

    let bad_symbol = r###"
[[card]]
name = "x"
rows = ["#?"]
"###;
    assert!(CardCatalog::from_toml_str(bad_symbol).is_err());

    let ragged = r###"
[[card]]
name = "x"
rows = ["##", "#"]
"###;
    assert!(CardCatalog::from_toml_str(ragged).is_err());
}

#[test]
fn test_catalog_from_file() {
    let file = write_temp("[[card]]\nname = \"dash\"\nrows = [\"##\"]\n");
    let catalog = CardCatalog::from_toml_file(file.path()).expect("valid card file");
    assert!(catalog.get("dash").is_some());
    assert!(catalog.get("dot").is_none());
}
