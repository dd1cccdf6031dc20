//! Core card types and records

pub mod card;
pub mod types;

pub use card::{CardImage, CardRecord, CardType};
pub use types::{CardId, CardName};
