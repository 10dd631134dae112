//! Card templates and the catalog they are looked up in.

use super::grid::Grid;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// A cell of a card template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CardCell {
    /// Not inked.
    #[default]
    Empty,
    /// Inks a normal cell.
    Regular,
    /// Inks a special cell.
    Special,
}

impl CardCell {
    /// Parses the row notation used in card files: `.` empty, `#` regular, `*` special.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(CardCell::Empty),
            '#' => Some(CardCell::Regular),
            '*' => Some(CardCell::Special),
            _ => None,
        }
    }
}

/// A named shape that players stamp onto the board.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Card {
    /// Catalog name, used on the wire.
    name: String,
    /// Template grid, unrotated.
    grid: Grid<CardCell>,
    /// Special points needed to play the card with its special boost.
    special_cost: u32,
}

impl Card {
    /// Builds a card from row notation.
    pub fn from_rows(
        name: impl Into<String>,
        special_cost: u32,
        rows: &[&str],
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let cells = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| {
                        CardCell::from_symbol(c).ok_or_else(|| {
                            CatalogError::new(format!("Card '{}' has unknown symbol '{}'", name, c))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let grid = Grid::from_rows(cells)
            .ok_or_else(|| CatalogError::new(format!("Card '{}' has ragged rows", name)))?;
        if grid.width() == 0 || grid.height() == 0 {
            return Err(CatalogError::new(format!("Card '{}' is empty", name)));
        }

        Ok(Self {
            name,
            grid,
            special_cost,
        })
    }

    /// The card grid after `turns` clockwise quarter turns.
    pub fn rotated(&self, turns: i32) -> Grid<CardCell> {
        self.grid.rotate(turns)
    }
}

#[derive(Debug, Deserialize)]
struct CardFile {
    #[serde(rename = "card", default)]
    cards: Vec<CardEntry>,
}

#[derive(Debug, Deserialize)]
struct CardEntry {
    name: String,
    #[serde(default)]
    special_cost: u32,
    rows: Vec<String>,
}

const BUILTIN: &[(&str, u32, &[&str])] = &[
    ("dot", 0, &["#"]),
    ("pair", 1, &["##"]),
    ("spark", 1, &["*"]),
    ("corner", 2, &["##", "#."]),
    ("bar", 2, &["####"]),
    ("tee", 3, &["###", ".*."]),
    ("zigzag", 3, &["##.", ".##"]),
    ("block", 3, &["##", "##"]),
    ("cross", 4, &[".#.", "#*#", ".#."]),
    ("hook", 4, &["#..", "#..", "##*"]),
];

/// Lookup table of cards by name.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<String, Card>,
}

impl CardCatalog {
    /// The catalog compiled into the server.
    #[instrument]
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (name, cost, rows) in BUILTIN {
            match Card::from_rows(*name, *cost, rows) {
                Ok(card) => catalog.insert(card),
                Err(e) => warn!(error = %e, "Skipping malformed builtin card"),
            }
        }
        debug!(count = catalog.cards.len(), "Built-in catalog ready");
        catalog
    }

    /// Loads cards from a TOML file of `[[card]]` tables.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CatalogError::new(format!("Failed to read card file: {}", e)))?;
        let catalog = Self::from_toml_str(&content)?;
        info!(count = catalog.cards.len(), "Card file loaded");
        Ok(catalog)
    }

    /// Parses cards from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CardFile = toml::from_str(content)
            .map_err(|e| CatalogError::new(format!("Failed to parse card file: {}", e)))?;

        let mut catalog = Self::default();
        for entry in file.cards {
            let rows: Vec<&str> = entry.rows.iter().map(String::as_str).collect();
            let card = Card::from_rows(entry.name, entry.special_cost, &rows)?;
            if catalog.cards.contains_key(card.name()) {
                return Err(CatalogError::new(format!("Duplicate card '{}'", card.name())));
            }
            catalog.insert(card);
        }
        Ok(catalog)
    }

    /// Adds or replaces a card.
    pub fn insert(&mut self, card: Card) {
        self.cards.insert(card.name.clone(), card);
    }

    /// Finds a card by name.
    pub fn get(&self, name: &str) -> Option<&Card> {
        self.cards.get(name)
    }

    /// Card names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// True when no cards are loaded.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Card catalog error.
#[derive(Debug, Clone, Display, Error)]
#[display("Catalog error: {} at {}:{}", message, file, line)]
pub struct CatalogError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CatalogError {
    /// Creates a new catalog error.
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
