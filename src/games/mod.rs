//! Game rules. Everything here is pure: no I/O, no shared state.

pub mod turf;
