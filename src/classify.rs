//! Card classification for print runs
//!
//! Decides how many copies of a card get printed, which deck it belongs to,
//! and which side of a stronghold an image shows.

use crate::core::{CardRecord, CardType};
use crate::{CardError, Result};
use log::debug;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// "<base> (<digit>)", the naming of each stronghold half
static STRONGHOLD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<base>.+) \((?P<half>\d)\)$").expect("valid regex"));

const UNIQUE: &str = "Unique";
const BOLD_CLOSE: &str = "</b>";

/// Deck a card is shuffled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Dynasty,
    Fate,
    Stronghold,
}

impl Category {
    /// Category for a card type, if the type has one
    pub fn for_type(card_type: &CardType) -> Option<Self> {
        match card_type {
            CardType::Event
            | CardType::Holding
            | CardType::Personality
            | CardType::Celestial
            | CardType::Region
            | CardType::Wind => Some(Category::Dynasty),
            CardType::Spell
            | CardType::Strategy
            | CardType::Ancestor
            | CardType::Ring
            | CardType::Sensei
            | CardType::Follower
            | CardType::Item => Some(Category::Fate),
            CardType::Stronghold => Some(Category::Stronghold),
            CardType::Other(_) => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Dynasty => write!(f, "dynasty"),
            Category::Fate => write!(f, "fate"),
            Category::Stronghold => write!(f, "stronghold"),
        }
    }
}

/// Number of physical copies printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PrintCount {
    One,
    Three,
}

impl PrintCount {
    pub fn count(self) -> u32 {
        match self {
            PrintCount::One => 1,
            PrintCount::Three => 3,
        }
    }
}

impl TryFrom<u8> for PrintCount {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(PrintCount::One),
            3 => Ok(PrintCount::Three),
            _ => Err(format!("print count must be 1 or 3, got {value}")),
        }
    }
}

impl From<PrintCount> for u8 {
    fn from(count: PrintCount) -> Self {
        count.count() as u8
    }
}

impl fmt::Display for PrintCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Side of a physical card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Face,
    Back,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Face => write!(f, "face"),
            Orientation::Back => write!(f, "back"),
        }
    }
}

/// How a single card image gets printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub print_count: PrintCount,
    pub orientation: Orientation,
    /// Effective id ("b" suffix stripped on stronghold backs)
    pub id: String,
    /// Display name (stronghold "(n)" suffix stripped)
    pub name: String,
}

impl Classification {
    /// Whether this image adds to the per-category print total
    pub fn counts_toward_total(&self) -> bool {
        self.orientation == Orientation::Face
    }
}

/// Caller-supplied print counts for cards whose text is ambiguous
///
/// Loaded from a JSON object mapping card name to 1 or 3:
///
/// ```json
/// { "Kaiu Shihobu": 1, "Bayushi Kachiko": 3 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrintOverrides(FxHashMap<String, PrintCount>);

impl PrintOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(CardError::IoError)?;
        serde_json::from_str(&content)
            .map_err(|e| CardError::InvalidOverrides(format!("{}: {e}", path.display())))
    }

    /// Parse overrides from JSON text
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| CardError::InvalidOverrides(e.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, count: PrintCount) {
        self.0.insert(name.into(), count);
    }

    pub fn get(&self, name: &str) -> Option<PrintCount> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Classifies card records into print runs
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    overrides: PrintOverrides,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: PrintOverrides) -> Self {
        Classifier { overrides }
    }

    /// Classify a card
    pub fn classify(&self, card: &CardRecord) -> Result<Classification> {
        let category =
            Category::for_type(&card.card_type).ok_or_else(|| CardError::UnknownCardType {
                name: card.name.to_string(),
                card_type: card.card_type.to_string(),
            })?;

        let print_count = self.print_count(card)?;

        if category != Category::Stronghold {
            return Ok(Classification {
                category,
                print_count,
                orientation: Orientation::Face,
                id: card.id.to_string(),
                name: card.name.to_string(),
            });
        }

        let captures = STRONGHOLD_NAME
            .captures(card.name.as_str())
            .ok_or_else(|| CardError::MalformedStrongholdName(card.name.to_string()))?;
        let name = captures["base"].to_string();

        let (orientation, id) = match card.id.strip_back_suffix() {
            Some(id) => (Orientation::Back, id.to_string()),
            None => (Orientation::Face, card.id.to_string()),
        };

        Ok(Classification {
            category,
            print_count,
            orientation,
            id,
            name,
        })
    }

    /// Number of copies to print for a card
    pub fn print_count(&self, card: &CardRecord) -> Result<PrintCount> {
        if card.card_type.is_always_unique() {
            return Ok(PrintCount::One);
        }

        if let Some(count) = self.overrides.get(card.name.as_str()) {
            debug!("Using print override {count} for '{}'", card.name);
            return Ok(count);
        }

        if has_bold_unique(&card.text) {
            return Ok(PrintCount::One);
        }

        if card.text.contains(UNIQUE) {
            return Err(CardError::UnresolvedClassification(card.name.to_string()));
        }

        Ok(PrintCount::Three)
    }
}

/// True if the text contains "Unique" closed by a bold tag (`</b>` or `</B>`)
fn has_bold_unique(text: &str) -> bool {
    text.match_indices(UNIQUE).any(|(start, _)| {
        text[start + UNIQUE.len()..]
            .get(..BOLD_CLOSE.len())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(BOLD_CLOSE))
    })
}
