//! Deck list loader (Oracle plain-text export)
//!
//! ```text
//! Legality: Onyx
//! The Dark Capital of the Spider
//!
//! 1 Mishime Sensei
//!
//! 1 Imperial Gift
//! 3 Repairing the Ruins
//! ```

use crate::{CardError, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Header lines that carry deck metadata rather than cards
const METADATA_PREFIXES: &[&str] = &["Legality:"];

/// Deck loader for plain-text deck lists
pub struct DeckLoader;

impl DeckLoader {
    /// Load a deck list from a text file
    pub fn load_from_file(path: &Path) -> Result<Vec<DeckLine>> {
        let content = fs::read_to_string(path).map_err(CardError::IoError)?;
        Ok(Self::parse(&content))
    }

    /// Parse a deck list from its text content
    ///
    /// Malformed count lines are logged and skipped; parsing itself never fails.
    pub fn parse(content: &str) -> Vec<DeckLine> {
        let mut lines = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if METADATA_PREFIXES
                .iter()
                .any(|prefix| line.starts_with(prefix))
            {
                continue;
            }

            if !line.starts_with(|c: char| c.is_ascii_digit()) {
                // Stronghold line and the like: one copy, whole line is the name
                lines.push(DeckLine::new(1, line));
                continue;
            }

            // Format: "3 Card Name"
            let Some((count_str, name)) = line.split_once(char::is_whitespace) else {
                warn!("Invalid line {}: {}", number + 1, line);
                continue;
            };

            match count_str.parse::<u32>() {
                Ok(count) if count > 0 => lines.push(DeckLine::new(count, name.trim())),
                _ => warn!("Invalid card count on line {}: {}", number + 1, line),
            }
        }

        lines
    }

    /// Where deck-mode output goes: "decks/spider.txt" -> "decks/spider_output.txt"
    pub fn output_path(path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match path.extension() {
            Some(ext) => format!("{stem}_output.{}", ext.to_string_lossy()),
            None => format!("{stem}_output"),
        };
        path.with_file_name(file_name)
    }
}

/// One raw (count, name) pair from a deck list, not yet resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLine {
    pub count: u32,
    pub card_name: String,
}

impl DeckLine {
    pub fn new(count: u32, card_name: impl Into<String>) -> Self {
        DeckLine {
            count,
            card_name: card_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_deck() {
        let content = r#"
Legality: Onyx
The Dark Capital of the Spider

1 Mishime Sensei

1 Imperial Gift
3 Repairing the Ruins
"#;

        let lines = DeckLoader::parse(content);
        assert_eq!(
            lines,
            vec![
                DeckLine::new(1, "The Dark Capital of the Spider"),
                DeckLine::new(1, "Mishime Sensei"),
                DeckLine::new(1, "Imperial Gift"),
                DeckLine::new(3, "Repairing the Ruins"),
            ]
        );
    }

    #[test]
    fn test_names_are_trimmed() {
        let lines = DeckLoader::parse("2   A Chance Meeting  \r\n\tAkodo Fields \n");
        assert_eq!(lines[0], DeckLine::new(2, "A Chance Meeting"));
        assert_eq!(lines[1], DeckLine::new(1, "Akodo Fields"));
    }

    #[test]
    fn test_count_without_name_is_skipped() {
        let lines = DeckLoader::parse("3\n1 Imperial Gift\n");
        assert_eq!(lines, vec![DeckLine::new(1, "Imperial Gift")]);
    }

    #[test]
    fn test_bad_count_is_skipped() {
        let lines = DeckLoader::parse("0 Imperial Gift\n2x Akodo Fields\n2\tAkodo Fields\n");
        assert_eq!(lines, vec![DeckLine::new(2, "Akodo Fields")]);
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            DeckLoader::output_path(Path::new("decks/spider.txt")),
            PathBuf::from("decks/spider_output.txt")
        );
        assert_eq!(
            DeckLoader::output_path(Path::new("spider")),
            PathBuf::from("spider_output")
        );
    }

    #[test]
    fn test_empty_deck() {
        assert!(DeckLoader::parse("").is_empty());
        assert!(DeckLoader::parse("Legality: Onyx\n\n").is_empty());
    }
}
