//! Card types and records

use crate::core::{CardId, CardName};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Card types in L5R
///
/// Values the tool does not know about are kept as `Other` so the database
/// still loads; classification rejects them later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CardType {
    Event,
    Holding,
    Personality,
    Celestial,
    Region,
    Wind,
    Spell,
    Strategy,
    Ancestor,
    Ring,
    Sensei,
    Follower,
    Item,
    Stronghold,
    Other(String),
}

impl CardType {
    /// Parse the `type` attribute of a database record
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "event" => CardType::Event,
            "holding" => CardType::Holding,
            "personality" => CardType::Personality,
            "celestial" => CardType::Celestial,
            "region" => CardType::Region,
            "wind" => CardType::Wind,
            "spell" => CardType::Spell,
            "strategy" => CardType::Strategy,
            "ancestor" => CardType::Ancestor,
            "ring" => CardType::Ring,
            "sensei" => CardType::Sensei,
            "follower" => CardType::Follower,
            "item" => CardType::Item,
            "stronghold" => CardType::Stronghold,
            _ => CardType::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CardType::Event => "event",
            CardType::Holding => "holding",
            CardType::Personality => "personality",
            CardType::Celestial => "celestial",
            CardType::Region => "region",
            CardType::Wind => "wind",
            CardType::Spell => "spell",
            CardType::Strategy => "strategy",
            CardType::Ancestor => "ancestor",
            CardType::Ring => "ring",
            CardType::Sensei => "sensei",
            CardType::Follower => "follower",
            CardType::Item => "item",
            CardType::Stronghold => "stronghold",
            CardType::Other(s) => s,
        }
    }

    /// Types that are always printed exactly once
    pub fn is_always_unique(&self) -> bool {
        matches!(
            self,
            CardType::Event | CardType::Stronghold | CardType::Wind | CardType::Sensei
        )
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `<image edition="..">path</image>` entry of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub edition: Option<String>,
    pub path: String,
}

impl CardImage {
    /// File name of the image without its extension ("images/cards/AD/AD092.jpg" -> "AD092")
    pub fn stem(&self) -> Option<&str> {
        Path::new(&self.path).file_stem().and_then(|s| s.to_str())
    }
}

/// A card as stored in the Oracle database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    /// Globally unique id
    pub id: CardId,

    /// Card name (e.g., "A Chance Meeting")
    pub name: CardName,

    pub card_type: CardType,

    pub rarity: Option<String>,

    /// Every edition the card was printed in, in file order
    pub editions: Vec<String>,

    /// Edition -> image path associations
    pub images: Vec<CardImage>,

    /// Legality tags (e.g., "open", "jade")
    pub legal: BTreeSet<String>,

    /// Rules text, including the database's embedded `<b>`/`<i>` markup
    pub text: String,

    pub cost: Option<String>,
    pub focus: Option<String>,
}

impl CardRecord {
    /// Minimal record with no optional metadata
    pub fn new(id: impl Into<CardId>, name: impl Into<CardName>, card_type: CardType) -> Self {
        CardRecord {
            id: id.into(),
            name: name.into(),
            card_type,
            rarity: None,
            editions: Vec::new(),
            images: Vec::new(),
            legal: BTreeSet::new(),
            text: String::new(),
            cost: None,
            focus: None,
        }
    }

    /// Image file stems this record can be matched by
    pub fn image_stems(&self) -> impl Iterator<Item = &str> {
        self.images.iter().filter_map(CardImage::stem)
    }
}
