//! L5R Cards - Main Binary
//!
//! Turns an Oracle deck list into a sorted id list, or renames a directory of
//! card images for printing.

use anyhow::{Context, Result};
use clap::Parser;
use l5r_cards::{
    classify::{Classifier, PrintOverrides},
    loader::{CardDatabase, Deck, DeckLoader},
    rename::{output_dir_for, BackTemplates, ImageRenamer},
    CardError,
};
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "l5r-cards")]
#[command(about = "L5R Oracle deck and card image tools", long_about = None)]
struct Cli {
    /// Deck file, or image directory with --rename
    path: PathBuf,

    /// Oracle card database
    #[arg(long, short = 'd', default_value = "database.xml")]
    database: PathBuf,

    /// Rename the card images in PATH instead of reading a deck
    #[arg(long, short = 'r')]
    rename: bool,

    /// Dynasty card back image (required with --rename)
    #[arg(long, value_name = "IMAGE")]
    back_dynasty: Option<PathBuf>,

    /// Fate card back image (required with --rename)
    #[arg(long, value_name = "IMAGE")]
    back_fate: Option<PathBuf>,

    /// JSON file mapping card names to a print count of 1 or 3
    #[arg(long, value_name = "JSON")]
    overrides: Option<PathBuf>,

    /// Plan and report the rename without copying any files
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Settings for a rename run, validated from the command line
struct RenameOptions {
    backs: BackTemplates,
    overrides: Option<PathBuf>,
    dry_run: bool,
}

impl RenameOptions {
    fn from_cli(cli: &Cli) -> l5r_cards::Result<Self> {
        let (Some(dynasty), Some(fate)) = (&cli.back_dynasty, &cli.back_fate) else {
            return Err(CardError::MissingConfiguration(
                "--back-dynasty and --back-fate are required with --rename".to_string(),
            ));
        };

        for template in [dynasty, fate] {
            if !template.is_file() {
                return Err(CardError::MissingConfiguration(format!(
                    "back template {} is not a file",
                    template.display()
                )));
            }
        }

        Ok(RenameOptions {
            backs: BackTemplates {
                dynasty: dynasty.clone(),
                fate: fate.clone(),
            },
            overrides: cli.overrides.clone(),
            dry_run: cli.dry_run,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Check configuration before the (slow) database load
    let rename = if cli.rename {
        Some(RenameOptions::from_cli(&cli)?)
    } else {
        None
    };

    let db = CardDatabase::load_from_file(&cli.database)
        .with_context(|| format!("failed to load database {}", cli.database.display()))?;

    match rename {
        Some(options) => run_rename(&db, &cli.path, options),
        None => run_deck(&db, &cli.path),
    }
}

fn run_deck(db: &CardDatabase, deck_path: &Path) -> Result<()> {
    let lines = DeckLoader::load_from_file(deck_path)
        .with_context(|| format!("failed to read deck {}", deck_path.display()))?;
    let deck = Deck::resolve(&lines, db)
        .with_context(|| format!("failed to resolve deck {}", deck_path.display()))?;

    let output = DeckLoader::output_path(deck_path);
    fs::write(&output, deck.render_ids())
        .with_context(|| format!("failed to write {}", output.display()))?;

    deck.log_cards();
    info!("Wrote {} cards to {}", deck.total_cards(), output.display());
    Ok(())
}

fn run_rename(db: &CardDatabase, input_dir: &Path, options: RenameOptions) -> Result<()> {
    let overrides = match &options.overrides {
        Some(path) => PrintOverrides::load_from_file(path)?,
        None => PrintOverrides::new(),
    };
    if !overrides.is_empty() {
        info!("Loaded {} print overrides", overrides.len());
    }

    let classifier = Classifier::with_overrides(overrides);
    let renamer = ImageRenamer::new(db, &classifier, options.backs);
    let plan = renamer
        .plan(input_dir)
        .with_context(|| format!("failed to rename images in {}", input_dir.display()))?;

    if !plan.unresolved.is_empty() {
        info!(
            "Print totals without ambiguous cards: {} (total {})",
            plan.totals,
            plan.totals.total()
        );
        plan.ensure_resolved()?;
    }

    if options.dry_run {
        for copy in &plan.copies {
            info!("{} -> {}", copy.source.display(), copy.file_name);
        }
        info!("Dry run, no files written");
    } else {
        let output_dir = output_dir_for(input_dir)?;
        plan.execute(&output_dir)
            .with_context(|| format!("failed to write {}", output_dir.display()))?;
    }

    info!(
        "Print totals: {} (total {})",
        plan.totals,
        plan.totals.total()
    );
    Ok(())
}
