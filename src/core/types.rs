//! Strongly-typed wrappers for card identity
//!
//! Card ids and card names are both plain strings in the Oracle database.
//! Wrapping them keeps lookups by name and output by id from being mixed up.

use std::fmt;

/// Oracle card id (e.g., "AD092", or "CoB003b" for a stronghold back)
///
/// Preserved verbatim from the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(String);

impl CardId {
    pub fn new(s: impl Into<String>) -> Self {
        CardId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id with the back-side "b" suffix removed, if present
    pub fn strip_back_suffix(&self) -> Option<&str> {
        self.0.strip_suffix('b')
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        CardId(s)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        CardId(s.to_string())
    }
}

/// Card name (distinct from other string types)
///
/// Split strongholds carry a " (1)" / " (2)" suffix on each half.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}
