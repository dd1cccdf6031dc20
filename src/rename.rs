//! Card image renaming for print runs
//!
//! Walks a directory of scanned or upscaled card images, matches each file to
//! its database record through the image paths stored in the database, and
//! plans copies named after the card's classification:
//!
//! ```text
//! AD092_upscaled.jpg -> AD092 - A Chance Meeting[face,3].jpg
//! fate_back.jpg      -> AD092 - A Chance Meeting[back,3].jpg
//! ```

use crate::classify::{Category, Classifier, Orientation, PrintCount};
use crate::core::CardRecord;
use crate::loader::CardDatabase;
use crate::{CardError, Result};
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions treated as card images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Suffixes upscalers append to the original file stem
pub const UPSCALE_SUFFIXES: &[&str] = &["_upscaled"];

/// Characters that are not allowed in file names on some filesystems
const UNSAFE_CHARS: &[char] = &[':', '/', '"', '?', '*', '<', '>', '|', '\\'];

/// Card back images copied alongside every non-stronghold card
#[derive(Debug, Clone)]
pub struct BackTemplates {
    pub dynasty: PathBuf,
    pub fate: PathBuf,
}

impl BackTemplates {
    /// Back image for a category; strongholds carry their own back
    pub fn for_category(&self, category: Category) -> Option<&Path> {
        match category {
            Category::Dynasty => Some(&self.dynasty),
            Category::Fate => Some(&self.fate),
            Category::Stronghold => None,
        }
    }
}

/// Copies to print, summed per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintTotals {
    pub dynasty: u32,
    pub fate: u32,
    pub stronghold: u32,
}

impl PrintTotals {
    pub fn add(&mut self, category: Category, count: PrintCount) {
        match category {
            Category::Dynasty => self.dynasty += count.count(),
            Category::Fate => self.fate += count.count(),
            Category::Stronghold => self.stronghold += count.count(),
        }
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Dynasty => self.dynasty,
            Category::Fate => self.fate,
            Category::Stronghold => self.stronghold,
        }
    }

    pub fn total(&self) -> u32 {
        self.dynasty + self.fate + self.stronghold
    }
}

impl fmt::Display for PrintTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let categories = [Category::Dynasty, Category::Fate, Category::Stronghold];
        for (i, category) in categories.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{category}: {}", self.get(category))?;
        }
        Ok(())
    }
}

/// A single file to copy into the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    pub source: PathBuf,
    pub file_name: String,
}

/// Everything a rename run would do, computed without touching the filesystem
#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    /// Copies sorted by destination file name
    pub copies: Vec<PlannedCopy>,
    /// Image files that matched no card
    pub skipped: Vec<PathBuf>,
    /// Names of matched cards whose print count needs an override, sorted
    pub unresolved: Vec<String>,
    pub totals: PrintTotals,
}

impl RenamePlan {
    /// Perform the planned copies into `output_dir`, creating it if needed
    ///
    /// Returns the number of files written.
    pub fn execute(&self, output_dir: &Path) -> Result<usize> {
        // Nothing is written unless every source is there
        if let Some(missing) = self.copies.iter().find(|c| !c.source.is_file()) {
            return Err(CardError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Source image not found: {}", missing.source.display()),
            )));
        }

        fs::create_dir_all(output_dir).map_err(CardError::IoError)?;

        for copy in &self.copies {
            let destination = output_dir.join(&copy.file_name);
            debug!("{} -> {}", copy.source.display(), destination.display());
            fs::copy(&copy.source, &destination).map_err(|e| {
                CardError::IoError(std::io::Error::new(
                    e.kind(),
                    format!(
                        "copying {} to {}: {e}",
                        copy.source.display(),
                        destination.display()
                    ),
                ))
            })?;
        }

        info!(
            "Wrote {} files to {}",
            self.copies.len(),
            output_dir.display()
        );
        Ok(self.copies.len())
    }

    /// Fail with every card name that still needs a print override
    pub fn ensure_resolved(&self) -> Result<()> {
        if self.unresolved.is_empty() {
            return Ok(());
        }
        Err(CardError::UnresolvedClassification(self.unresolved.join(", ")))
    }
}

/// Matches image files to cards and plans their renamed copies
pub struct ImageRenamer<'a> {
    classifier: &'a Classifier,
    backs: BackTemplates,
    /// Image file stem -> card
    index: FxHashMap<&'a str, &'a CardRecord>,
}

impl<'a> ImageRenamer<'a> {
    /// Build the image-stem index over every record in the database
    pub fn new(db: &'a CardDatabase, classifier: &'a Classifier, backs: BackTemplates) -> Self {
        let mut records: Vec<&CardRecord> = db.records().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = FxHashMap::default();
        for card in records {
            for stem in card.image_stems() {
                if let Some(existing) = index.insert(stem, card) {
                    if existing.id != card.id {
                        warn!(
                            "Image {stem} is shared by {} and {}, using {}",
                            existing.id, card.id, card.id
                        );
                    }
                }
            }
        }

        ImageRenamer {
            classifier,
            backs,
            index,
        }
    }

    /// Card whose database image matches this file, if any
    pub fn lookup(&self, path: &Path) -> Option<&'a CardRecord> {
        image_key(path).and_then(|key| self.index.get(key).copied())
    }

    /// Plan the renamed copies for every image under `input_dir`
    ///
    /// Images that match no card are logged and skipped. Cards whose print
    /// count is ambiguous are skipped and collected in `unresolved`; any other
    /// classification failure aborts the run.
    pub fn plan(&self, input_dir: &Path) -> Result<RenamePlan> {
        let mut plan = RenamePlan::default();
        let mut planned = FxHashSet::default();

        for path in discover_images(input_dir)? {
            let Some(card) = self.lookup(&path) else {
                warn!("No card matches image {}", path.display());
                plan.skipped.push(path);
                continue;
            };

            let class = match self.classifier.classify(card) {
                Ok(class) => class,
                Err(CardError::UnresolvedClassification(name)) => {
                    warn!("Cannot tell whether '{name}' is unique, skipping {}", path.display());
                    if !plan.unresolved.contains(&name) {
                        plan.unresolved.push(name);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };
            let file_name = target_file_name(
                &class.id,
                &class.name,
                class.orientation,
                class.print_count,
            );

            if !planned.insert(file_name.clone()) {
                warn!(
                    "Skipping {}: {} is already planned",
                    path.display(),
                    file_name
                );
                continue;
            }

            debug!(
                "{} -> {} ({})",
                path.display(),
                file_name,
                class.category
            );

            if class.counts_toward_total() {
                plan.totals.add(class.category, class.print_count);
            }

            plan.copies.push(PlannedCopy {
                source: path,
                file_name,
            });

            if let Some(back) = self.backs.for_category(class.category) {
                plan.copies.push(PlannedCopy {
                    source: back.to_path_buf(),
                    file_name: target_file_name(
                        &class.id,
                        &class.name,
                        Orientation::Back,
                        class.print_count,
                    ),
                });
            }
        }

        plan.copies.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        plan.unresolved.sort();

        info!(
            "Planned {} files, skipped {} unmatched and {} ambiguous images ({})",
            plan.copies.len(),
            plan.skipped.len(),
            plan.unresolved.len(),
            plan.totals
        );
        Ok(plan)
    }
}

/// Recursively list image files under a directory, in sorted order
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CardError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Image directory not found: {}", dir.display()),
        )));
    }

    let mut images = Vec::new();
    for entry in jwalk::WalkDir::new(dir).sort(true) {
        let entry = entry.map_err(|e| CardError::IoError(std::io::Error::other(e.to_string())))?;
        let path = entry.path();
        if entry.file_type().is_file() && is_image(&path) {
            images.push(path);
        }
    }

    Ok(images)
}

/// Whether the path has a recognized image extension
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Lookup key for an image file: its stem without any upscaler suffix
///
/// "scans/AD092_upscaled.jpg" -> "AD092"
pub fn image_key(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    Some(
        UPSCALE_SUFFIXES
            .iter()
            .find_map(|suffix| stem.strip_suffix(suffix))
            .unwrap_or(stem),
    )
}

/// Replace characters that are unsafe in file names with '-'
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// "<id> - <name>[<orientation>,<print count>].jpg", sanitized
pub fn target_file_name(
    id: &str,
    name: &str,
    orientation: Orientation,
    print_count: PrintCount,
) -> String {
    sanitize_file_name(&format!("{id} - {name}[{orientation},{print_count}].jpg"))
}

/// Output directory for a rename run: "scans" -> "scans_output", next to the input
pub fn output_dir_for(input_dir: &Path) -> Result<PathBuf> {
    let input_dir = input_dir.canonicalize().map_err(CardError::IoError)?;
    let stem = input_dir
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_string());
    Ok(input_dir.with_file_name(format!("{stem}_output")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_key_strips_upscale_suffix() {
        assert_eq!(image_key(Path::new("scans/AD092_upscaled.jpg")), Some("AD092"));
        assert_eq!(image_key(Path::new("AD092.png")), Some("AD092"));
        assert_eq!(image_key(Path::new("HS001b_upscaled.JPG")), Some("HS001b"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/AD092.jpg")));
        assert!(is_image(Path::new("AD092.JPEG")));
        assert!(is_image(Path::new("AD092.webp")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("AD092")));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name(r#"Who? What: "Why" <a|b> c*d/e\f"#),
            "Who- What- -Why- -a-b- c-d-e-f"
        );
    }

    #[test]
    fn test_target_file_name() {
        assert_eq!(
            target_file_name("AD092", "A Chance Meeting", Orientation::Face, PrintCount::Three),
            "AD092 - A Chance Meeting[face,3].jpg"
        );
        assert_eq!(
            target_file_name("XX1", "Kaiu: Wall", Orientation::Back, PrintCount::One),
            "XX1 - Kaiu- Wall[back,1].jpg"
        );
    }

    #[test]
    fn test_print_totals() {
        let mut totals = PrintTotals::default();
        totals.add(Category::Fate, PrintCount::Three);
        totals.add(Category::Fate, PrintCount::One);
        totals.add(Category::Stronghold, PrintCount::One);
        assert_eq!(totals.get(Category::Fate), 4);
        assert_eq!(totals.get(Category::Dynasty), 0);
        assert_eq!(totals.total(), 5);
        assert_eq!(totals.to_string(), "dynasty: 0, fate: 4, stronghold: 1");
    }

    #[test]
    fn test_ensure_resolved_lists_every_name() {
        let mut plan = RenamePlan::default();
        assert!(plan.ensure_resolved().is_ok());

        plan.unresolved = vec!["Blade of Doubt".to_string(), "Mask of Doubt".to_string()];
        let err = plan.ensure_resolved().unwrap_err();
        assert!(matches!(
            err,
            CardError::UnresolvedClassification(ref names) if names == "Blade of Doubt, Mask of Doubt"
        ));
    }

    #[test]
    fn test_execute_checks_sources_first() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("AD092.jpg");
        fs::write(&present, "meeting").unwrap();

        let plan = RenamePlan {
            copies: vec![
                PlannedCopy {
                    source: present,
                    file_name: "AD092 - A Chance Meeting[face,3].jpg".to_string(),
                },
                PlannedCopy {
                    source: dir.path().join("missing_fate.jpg"),
                    file_name: "AD092 - A Chance Meeting[back,3].jpg".to_string(),
                },
            ],
            ..RenamePlan::default()
        };

        let output_dir = dir.path().join("out");
        let err = plan.execute(&output_dir).unwrap_err();
        assert!(err.to_string().contains("missing_fate.jpg"));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_back_templates() {
        let backs = BackTemplates {
            dynasty: PathBuf::from("dynasty.jpg"),
            fate: PathBuf::from("fate.jpg"),
        };
        assert_eq!(backs.for_category(Category::Dynasty), Some(Path::new("dynasty.jpg")));
        assert_eq!(backs.for_category(Category::Fate), Some(Path::new("fate.jpg")));
        assert_eq!(backs.for_category(Category::Stronghold), None);
    }
}
