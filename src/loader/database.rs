//! Card database for looking up card records
//!
//! Loads the Oracle XML export and provides lookup of card records by name.
//!
//! ```xml
//! <cards version="2023/12/26 Onyx Oracle Edition">
//!     <card id="AD092" type="strategy">
//!         <name>A Chance Meeting</name>
//!         <rarity>u</rarity>
//!         <edition>AD</edition><image edition="AD">images/cards/AD/AD092.jpg</image>
//!         <legal>open</legal>
//!         <text><![CDATA[<b>Battle:</b> One of your Personalities ...]]></text>
//!         <cost>0</cost>
//!         <focus>3</focus>
//!     </card>
//! </cards>
//! ```

use crate::core::{CardImage, CardRecord, CardType};
use crate::{CardError, Result};
use log::{debug, info, warn};
use roxmltree::{Document, Node, ParsingOptions};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;

/// Database of card records keyed by exact card name
///
/// Built once from the XML file and read-only afterward.
#[derive(Debug, Default)]
pub struct CardDatabase {
    cards: FxHashMap<String, CardRecord>,
    version: Option<String>,
}

impl CardDatabase {
    /// Load the database from an Oracle XML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(CardError::IoError)?;
        let db = Self::parse(&content)?;
        info!(
            "Loaded {} cards from {} (version: {})",
            db.len(),
            path.display(),
            db.version().unwrap_or("unknown")
        );
        Ok(db)
    }

    /// Parse the database from its XML text
    pub fn parse(content: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(content, options)
            .map_err(|e| CardError::MalformedDatabase(e.to_string()))?;

        let root = doc.root_element();
        let version = root.attribute("version").map(str::to_string);

        let mut cards = FxHashMap::default();
        for (index, node) in root
            .children()
            .filter(|n| n.has_tag_name("card"))
            .enumerate()
        {
            let card = parse_card(node, index)?;
            let name = card.name.as_str().to_string();
            if let Some(previous) = cards.insert(name, card) {
                warn!(
                    "Duplicate card name '{}' (id {} replaced)",
                    previous.name, previous.id
                );
            }
        }

        Ok(CardDatabase { cards, version })
    }

    /// Build a database from records already in memory
    pub fn from_records(records: impl IntoIterator<Item = CardRecord>) -> Self {
        let cards = records
            .into_iter()
            .map(|card| (card.name.as_str().to_string(), card))
            .collect();
        CardDatabase {
            cards,
            version: None,
        }
    }

    /// Look up a card by its exact name
    pub fn get(&self, name: &str) -> Option<&CardRecord> {
        self.cards.get(name)
    }

    /// Check if a card exists in the database
    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(name)
    }

    /// All records, in no particular order
    pub fn records(&self) -> impl Iterator<Item = &CardRecord> {
        self.cards.values()
    }

    /// Version string from the `<cards version="..">` root, if present
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Total number of cards in database
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Read one `<card>` element into a record
fn parse_card(node: Node<'_, '_>, index: usize) -> Result<CardRecord> {
    let id = node
        .attribute("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CardError::MalformedDatabase(format!("card #{} has no id", index + 1)))?;

    let name = child_text(node, "name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CardError::MalformedDatabase(format!("card {id} has no name")))?;

    let card_type = node
        .attribute("type")
        .map(CardType::parse)
        .ok_or_else(|| CardError::MalformedDatabase(format!("card {id} has no type")))?;

    let mut card = CardRecord::new(id, name, card_type);

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "rarity" => card.rarity = Some(element_text(child)),
            "edition" => card.editions.push(element_text(child)),
            "image" => card.images.push(CardImage {
                edition: child.attribute("edition").map(str::to_string),
                path: element_text(child),
            }),
            "legal" => {
                card.legal.insert(element_text(child));
            }
            "text" => card.text = element_text(child),
            "cost" => card.cost = Some(element_text(child)),
            "focus" => card.focus = Some(element_text(child)),
            "name" => {}
            other => debug!("Ignoring <{other}> on card {id}"),
        }
    }

    Ok(card)
}

/// Trimmed text of the first child element with the given tag
fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .map(element_text)
}

/// All text (including CDATA) inside an element, trimmed
fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cards version="2023/12/26 Onyx Oracle Edition">
    <card id="AD092" type="strategy">
        <name>A Chance Meeting</name>
        <rarity>u</rarity>
        <edition>AD</edition><image edition="AD">images/cards/AD/AD092.jpg</image>
        <legal>open</legal>
        <text><![CDATA[<b>Battle:</b> One of your Personalities in this battle challenges an opposing Personality.]]></text>
        <cost>0</cost>
        <focus>3</focus>
    </card>
    <card id="AD081" type="region">
        <name>Akodo Fields</name>
        <rarity>u</rarity>
        <edition>AD</edition><image edition="AD">images/cards/AD/AD081.jpg</image>
        <edition>EE</edition><image edition="EE">images/cards/EE/EE012.jpg</image>
        <legal>open</legal>
        <legal>jade</legal>
        <text><![CDATA[<B>Limited:</B> Target one of your Followers in play.]]></text>
    </card>
</cards>
"#;

    #[test]
    fn test_empty_database() {
        let db = CardDatabase::parse("<cards/>").unwrap();
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
        assert!(db.get("A Chance Meeting").is_none());
        assert_eq!(db.version(), None);
    }

    #[test]
    fn test_parse_sample() {
        let db = CardDatabase::parse(SAMPLE).unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.version(), Some("2023/12/26 Onyx Oracle Edition"));

        let meeting = db.get("A Chance Meeting").unwrap();
        assert_eq!(meeting.id.as_str(), "AD092");
        assert_eq!(meeting.card_type, CardType::Strategy);
        assert_eq!(meeting.rarity.as_deref(), Some("u"));
        assert_eq!(meeting.editions, vec!["AD".to_string()]);
        assert_eq!(meeting.images.len(), 1);
        assert_eq!(meeting.images[0].edition.as_deref(), Some("AD"));
        assert_eq!(meeting.images[0].path, "images/cards/AD/AD092.jpg");
        assert!(meeting.text.starts_with("<b>Battle:</b> One of your"));
        assert_eq!(meeting.cost.as_deref(), Some("0"));
        assert_eq!(meeting.focus.as_deref(), Some("3"));

        let fields = db.get("Akodo Fields").unwrap();
        assert_eq!(fields.card_type, CardType::Region);
        assert_eq!(fields.editions.len(), 2);
        assert_eq!(fields.image_stems().collect::<Vec<_>>(), vec!["AD081", "EE012"]);
        assert!(fields.legal.contains("open"));
        assert!(fields.legal.contains("jade"));
        assert_eq!(fields.cost, None);
    }

    #[test]
    fn test_keys_are_record_names() {
        let db = CardDatabase::parse(SAMPLE).unwrap();
        let mut names: Vec<&str> = db.records().map(|card| card.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["A Chance Meeting", "Akodo Fields"]);
        for card in db.records() {
            assert!(db.contains(card.name.as_str()));
        }
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let xml = r#"<cards><card id="X1" type="item"><rarity>c</rarity></card></cards>"#;
        let err = CardDatabase::parse(xml).unwrap_err();
        assert!(matches!(err, CardError::MalformedDatabase(msg) if msg.contains("X1")));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let xml = r#"<cards><card type="item"><name>Nameless</name></card></cards>"#;
        let err = CardDatabase::parse(xml).unwrap_err();
        assert!(matches!(err, CardError::MalformedDatabase(_)));
    }

    #[test]
    fn test_id_is_kept_verbatim() {
        let xml = r#"<cards><card id=" AD092" type="strategy"><name>A Chance Meeting</name></card></cards>"#;
        let db = CardDatabase::parse(xml).unwrap();
        assert_eq!(db.get("A Chance Meeting").unwrap().id.as_str(), " AD092");

        let blank = r#"<cards><card id="   " type="item"><name>Blank</name></card></cards>"#;
        let db = CardDatabase::parse(blank).unwrap();
        assert_eq!(db.get("Blank").unwrap().id.as_str(), "   ");
    }

    #[test]
    fn test_empty_id_is_malformed() {
        let xml = r#"<cards><card id="" type="item"><name>Nameless</name></card></cards>"#;
        let err = CardDatabase::parse(xml).unwrap_err();
        assert!(matches!(err, CardError::MalformedDatabase(_)));
    }

    #[test]
    fn test_unparsable_xml_is_malformed() {
        let err = CardDatabase::parse("<cards><card id=\"X1\"></cards>").unwrap_err();
        assert!(matches!(err, CardError::MalformedDatabase(_)));
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let xml = r#"<cards><card id="P1" type="proxy"><name>Proxy</name></card></cards>"#;
        let db = CardDatabase::parse(xml).unwrap();
        assert_eq!(
            db.get("Proxy").unwrap().card_type,
            CardType::Other("proxy".to_string())
        );
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let xml = r#"<cards>
            <card id="A1" type="item"><name>Twin</name></card>
            <card id="A2" type="item"><name>Twin</name></card>
        </cards>"#;
        let db = CardDatabase::parse(xml).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("Twin").unwrap().id.as_str(), "A2");
    }

    #[test]
    fn test_from_records() {
        let db = CardDatabase::from_records(vec![CardRecord::new(
            "AD092",
            "A Chance Meeting",
            CardType::Strategy,
        )]);
        assert_eq!(db.len(), 1);
        assert!(db.contains("A Chance Meeting"));
        assert!(!db.contains("a chance meeting"));
    }
}
