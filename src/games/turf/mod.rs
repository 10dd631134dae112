mod board;
mod card;
mod cell;
mod combine;
mod grid;
mod placement;

pub use board::{Board, to_facing};
pub use card::{Card, CardCatalog, CardCell, CatalogError};
pub use cell::{Cell, Team};
pub use combine::{combine, overlay, wall_set};
pub use grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Grid, create_grid};
pub use placement::{ActionKind, Play, Rejection, validate};
