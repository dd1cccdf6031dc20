//! Database and deck loaders
//!
//! Parsers for the Oracle card database (.xml) and plain-text deck lists

pub mod database;
pub mod deck;
pub mod resolve;

pub use database::CardDatabase;
pub use deck::{DeckLine, DeckLoader};
pub use resolve::{load_deck, resolve_name, Deck, DeckEntry, Resolved};
