//! Error types for the L5R card tools

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Malformed database: {0}")]
    MalformedDatabase(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Split card '{0}' has a first half but no second half")]
    MissingSecondHalf(String),

    #[error("Unknown card type '{card_type}' for card '{name}'")]
    UnknownCardType { name: String, card_type: String },

    #[error("Stronghold name does not match '<name> (<n>)': {0}")]
    MalformedStrongholdName(String),

    #[error("Cannot tell whether '{0}' is unique; add it to the print overrides")]
    UnresolvedClassification(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid print overrides: {0}")]
    InvalidOverrides(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CardError>;
