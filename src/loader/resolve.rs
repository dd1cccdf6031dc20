//! Name resolution against the card database
//!
//! Deck lists name split strongholds by their base name ("Hidden School"),
//! while the database stores the two halves as "Hidden School (1)" and
//! "Hidden School (2)".

use crate::core::CardRecord;
use crate::loader::{CardDatabase, DeckLine};
use crate::{CardError, Result};
use log::{info, warn};

/// Result of resolving one deck-list name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'db> {
    /// Exact name match
    Single(&'db CardRecord),
    /// Both halves of a split card
    Split(&'db CardRecord, &'db CardRecord),
}

impl<'db> Resolved<'db> {
    /// The records this name stands for
    pub fn records(&self) -> Vec<&'db CardRecord> {
        match *self {
            Resolved::Single(card) => vec![card],
            Resolved::Split(first, second) => vec![first, second],
        }
    }
}

/// Resolve a trimmed card name to its database record(s)
pub fn resolve_name<'db>(db: &'db CardDatabase, name: &str) -> Result<Resolved<'db>> {
    if let Some(card) = db.get(name) {
        return Ok(Resolved::Single(card));
    }

    if let Some(first) = db.get(&format!("{name} (1)")) {
        let second = db
            .get(&format!("{name} (2)"))
            .ok_or_else(|| CardError::MissingSecondHalf(name.to_string()))?;
        return Ok(Resolved::Split(first, second));
    }

    Err(CardError::CardNotFound(name.to_string()))
}

/// A resolved deck entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckEntry<'db> {
    pub count: u32,
    pub card: &'db CardRecord,
}

/// A fully resolved deck, in deck-list order
#[derive(Debug, Clone, Default)]
pub struct Deck<'db> {
    pub entries: Vec<DeckEntry<'db>>,
}

impl<'db> Deck<'db> {
    /// Resolve parsed deck lines against the database
    ///
    /// Fails on the first name that cannot be resolved; no partial deck is returned.
    pub fn resolve(lines: &[DeckLine], db: &'db CardDatabase) -> Result<Self> {
        let mut entries = Vec::with_capacity(lines.len());

        for line in lines {
            match resolve_name(db, &line.card_name)? {
                Resolved::Single(card) => entries.push(DeckEntry {
                    count: line.count,
                    card,
                }),
                Resolved::Split(first, second) => {
                    // Halves are added once each whatever the requested count
                    if line.count > 1 {
                        warn!(
                            "Split card '{}' requested {} times, adding each half once",
                            line.card_name, line.count
                        );
                    }
                    entries.push(DeckEntry {
                        count: 1,
                        card: first,
                    });
                    entries.push(DeckEntry {
                        count: 1,
                        card: second,
                    });
                }
            }
        }

        Ok(Deck { entries })
    }

    /// One record per physical copy, in deck-list order
    pub fn cards(&self) -> impl Iterator<Item = &'db CardRecord> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| std::iter::repeat(entry.card).take(entry.count as usize))
    }

    /// Card ids of every copy, lexicographically sorted
    pub fn sorted_ids(&self) -> Vec<&'db str> {
        let mut ids: Vec<&'db str> = self.cards().map(|card| card.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Deck-mode output: sorted ids joined by newlines
    pub fn render_ids(&self) -> String {
        self.sorted_ids().join("\n")
    }

    /// Total cards in the deck
    pub fn total_cards(&self) -> usize {
        self.entries.iter().map(|e| e.count as usize).sum()
    }

    /// Log every copy as "<id> - <name>"
    pub fn log_cards(&self) {
        for card in self.cards() {
            info!("{} - {}", card.id, card.name);
        }
    }
}

/// Parse and resolve a deck list in one step
pub fn load_deck<'db>(content: &str, db: &'db CardDatabase) -> Result<Deck<'db>> {
    let lines = crate::loader::DeckLoader::parse(content);
    Deck::resolve(&lines, db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    fn test_db() -> CardDatabase {
        CardDatabase::from_records(vec![
            CardRecord::new("AD092", "A Chance Meeting", CardType::Strategy),
            CardRecord::new("AD081", "Akodo Fields", CardType::Region),
            CardRecord::new("HS001", "Hidden School (1)", CardType::Stronghold),
            CardRecord::new("HS002", "Hidden School (2)", CardType::Stronghold),
            CardRecord::new("LH001", "Lonely Half (1)", CardType::Stronghold),
        ])
    }

    #[test]
    fn test_exact_match() {
        let db = test_db();
        let resolved = resolve_name(&db, "A Chance Meeting").unwrap();
        let records = resolved.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_str(), "A Chance Meeting");
    }

    #[test]
    fn test_split_card() {
        let db = test_db();
        let resolved = resolve_name(&db, "Hidden School").unwrap();
        let ids: Vec<&str> = resolved.records().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["HS001", "HS002"]);
    }

    #[test]
    fn test_exact_half_wins_over_split_rule() {
        let db = test_db();
        let resolved = resolve_name(&db, "Hidden School (1)").unwrap();
        assert!(matches!(resolved, Resolved::Single(card) if card.id.as_str() == "HS001"));
    }

    #[test]
    fn test_missing_second_half() {
        let db = test_db();
        let err = resolve_name(&db, "Lonely Half").unwrap_err();
        assert!(matches!(err, CardError::MissingSecondHalf(name) if name == "Lonely Half"));
    }

    #[test]
    fn test_card_not_found() {
        let db = test_db();
        let err = resolve_name(&db, "Nonexistent Card").unwrap_err();
        assert!(matches!(err, CardError::CardNotFound(name) if name == "Nonexistent Card"));
    }

    #[test]
    fn test_repeated_copies() {
        let db = test_db();
        let deck = load_deck("2 A Chance Meeting\n", &db).unwrap();
        assert_eq!(deck.total_cards(), 2);
        assert_eq!(deck.sorted_ids(), vec!["AD092", "AD092"]);
    }

    #[test]
    fn test_split_card_count_is_ignored() {
        let db = test_db();
        let deck = load_deck("3 Hidden School\n", &db).unwrap();
        assert_eq!(deck.sorted_ids(), vec!["HS001", "HS002"]);
    }

    #[test]
    fn test_unresolved_name_aborts_deck() {
        let db = test_db();
        let result = load_deck("1 A Chance Meeting\n1 Missing Card\n1 Akodo Fields\n", &db);
        assert!(matches!(result, Err(CardError::CardNotFound(_))));
    }

    #[test]
    fn test_render_ids_sorted() {
        let db = test_db();
        let deck = load_deck("Hidden School\n1 Akodo Fields\n2 A Chance Meeting\n", &db).unwrap();
        assert_eq!(deck.render_ids(), "AD081\nAD092\nAD092\nHS001\nHS002");

        let order: Vec<&str> = deck.cards().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["HS001", "HS002", "AD081", "AD092", "AD092"]);
    }
}
