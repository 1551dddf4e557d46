use clap::Parser;
use log::{info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

mod builder;
mod fill;
mod grid;
mod input;
mod lexicon;
mod number;
mod placer;
mod render;
mod slots;
mod template;

use builder::{BuildError, BuildOptions};
use grid::Grid;
use input::InputError;
use lexicon::{Lexicon, LexiconError};
use number::{assign_numbers, clue_lists, ClueEntry, Numbering};
use placer::{PlacementError, PlacerOptions};
use render::PuzzlePage;

const DEFAULT_GRID_SIZE: usize = 15;
const MIN_SLOT_LEN: usize = 3;
const MAX_WORD_LEN: usize = 21;
const BLACK_MIN_PERCENT: usize = 15;
const BLACK_MAX_PERCENT: usize = 20;
const DEFAULT_RETRIES: usize = 20;
const SYMMETRY_RETRIES: usize = 30;
const MIN_PLACED_WORDS: usize = 30;
const MIN_LEXICON_ENTRIES: usize = 200;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Generates print-ready American crossword puzzles, either from the
/// built-in word bank or by placing a user-supplied word list.
struct Cli {
    /// Parsed word-list input; omit to generate from the built-in bank
    input: Option<PathBuf>,
    /// Where to write the rendered page
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Generate a puzzle from the built-in word bank
    #[arg(long)]
    generate: bool,
    /// Grid edge length
    #[arg(long)]
    grid_size: Option<usize>,
    /// Puzzle title
    #[arg(long, default_value = "CROSSWORD")]
    title: String,
    /// RNG seed; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Retry budget for template and placement attempts
    #[arg(long)]
    retries: Option<usize>,
    /// Enforce 180-degree symmetry when placing a word list
    #[arg(long)]
    symmetry: bool,
    /// Word bank file (word TAB clue); defaults to the embedded bank
    #[arg(long)]
    bank: Option<PathBuf>,
    /// Bulk dictionary file; defaults to the embedded list
    #[arg(long)]
    dictionary: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("Unable to write '{path}': {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },
}

impl Error {
    fn exit_code(&self) -> u8 {
        match self {
            Error::Input(_) => 1,
            Error::Lexicon(_) => 2,
            Error::Build(BuildError::Template(_)) => 3,
            Error::Build(BuildError::Fill(_)) => 4,
            Error::Placement(_) => 5,
            Error::Output { .. } => 6,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    match &cli.input {
        Some(path) if !cli.generate => run_word_list(cli, path, seed),
        Some(_) => {
            warn!("--generate given along with an input file; the input is ignored");
            run_generate(cli, seed)
        }
        None => run_generate(cli, seed),
    }
}

fn run_generate(cli: &Cli, seed: u64) -> Result<(), Error> {
    let size = cli.grid_size.unwrap_or(DEFAULT_GRID_SIZE);
    let retries = cli.retries.unwrap_or(DEFAULT_RETRIES);
    let lexicon = Lexicon::from_sources(
        cli.bank.as_deref(),
        cli.dictionary.as_deref(),
        None,
        MIN_LEXICON_ENTRIES,
    )?;
    info!("Generating a {}x{} puzzle with seed {}", size, size, seed);
    let grid = builder::generate(&lexicon, size, &BuildOptions::new(seed, retries))?;
    let numbering = assign_numbers(&grid);
    let (across, down) = clue_lists(&numbering, |item| lexicon.clue_for(&item.answer));
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("crossword.pdf"));
    write_output(&cli.title, &grid, &numbering, &across, &down, &output)
}

fn run_word_list(cli: &Cli, path: &Path, seed: u64) -> Result<(), Error> {
    let rows = input::read_rows(path)?;
    let entries = input::entries_from_rows(&rows, cli.grid_size)?;
    let size = cli
        .grid_size
        .unwrap_or_else(|| input::derive_grid_size(&entries));
    let retries = cli.retries.unwrap_or(if cli.symmetry {
        SYMMETRY_RETRIES
    } else {
        DEFAULT_RETRIES
    });
    info!(
        "Placing {} words on a {}x{} grid with seed {}",
        entries.len(),
        size,
        size,
        seed
    );
    let result = placer::place_all(
        &entries,
        &PlacerOptions {
            size,
            seed,
            retries,
            symmetry: cli.symmetry,
            min_placed: MIN_PLACED_WORDS,
        },
    )?;
    let numbering = assign_numbers(&result.grid);
    let clue_at: HashMap<(usize, usize, grid::Direction), &str> = result
        .placed
        .iter()
        .map(|p| ((p.row, p.col, p.direction), p.clue.as_str()))
        .collect();
    let (across, down) = clue_lists(&numbering, |item| {
        clue_at
            .get(&(item.row, item.col, item.direction))
            .map(|clue| clue.to_string())
    });
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| path.with_extension("pdf"));
    write_output(&cli.title, &result.grid, &numbering, &across, &down, &output)
}

fn write_output(
    title: &str,
    grid: &Grid,
    numbering: &Numbering,
    across: &[ClueEntry],
    down: &[ClueEntry],
    path: &Path,
) -> Result<(), Error> {
    let page = PuzzlePage {
        title,
        grid,
        numbers: &numbering.numbers,
        across,
        down,
    };
    render::write_page(&page, path).map_err(|source| Error::Output {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote {}", path.display());
    Ok(())
}
