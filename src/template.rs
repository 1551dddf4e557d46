use log::debug;
use rand::{rngs::StdRng, Rng};
use thiserror::Error;

use crate::grid::{Cell, Grid};
use crate::{BLACK_MAX_PERCENT, BLACK_MIN_PERCENT, MIN_SLOT_LEN};

/// Fresh construction attempts per invocation before giving up.
const CONSTRUCTION_ATTEMPTS: usize = 50;

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("Template generation exhausted its budget after {attempts} attempts")]
    Exhausted { attempts: usize },
}

/// Anything that can hand the retry controller a candidate template: the
/// randomized generator, or a library of stock skeletons.
pub trait TemplateSource {
    fn next_template(&mut self, rng: &mut StdRng) -> Result<Grid, TemplateError>;
}

/// Randomized construction with repair: start all-white, keep committing
/// symmetric black pairs that preserve connectivity and minimum run length,
/// stop inside the black-cell band.
pub struct RandomTemplate {
    size: usize,
}

impl RandomTemplate {
    pub fn new(size: usize) -> Self {
        RandomTemplate { size }
    }
}

impl TemplateSource for RandomTemplate {
    fn next_template(&mut self, rng: &mut StdRng) -> Result<Grid, TemplateError> {
        generate_template(self.size, rng)
    }
}

/// A library of pre-made skeletons. Candidates failing validation are
/// discarded up front.
pub struct StockTemplates {
    templates: Vec<Grid>,
}

impl StockTemplates {
    pub fn new(candidates: Vec<Grid>) -> Self {
        let templates: Vec<Grid> = candidates
            .into_iter()
            .filter(is_valid_template)
            .collect();
        StockTemplates { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }
}

impl TemplateSource for StockTemplates {
    fn next_template(&mut self, rng: &mut StdRng) -> Result<Grid, TemplateError> {
        if self.templates.is_empty() {
            return Err(TemplateError::Exhausted { attempts: 0 });
        }
        let pick = rng.gen_range(0..self.templates.len());
        Ok(self.templates[pick].clone())
    }
}

/// The inclusive black-cell count band for a grid of the given size.
pub fn black_band(size: usize) -> (usize, usize) {
    let cells = size * size;
    let min = (cells * BLACK_MIN_PERCENT + 99) / 100;
    let max = cells * BLACK_MAX_PERCENT / 100;
    (min, max)
}

/// A template is legal when it is symmetric, its white cells form one
/// 4-connected component, every maximal white run holds at least
/// `MIN_SLOT_LEN` letters and the black count sits inside the band.
pub fn is_valid_template(grid: &Grid) -> bool {
    let (min_black, max_black) = black_band(grid.size());
    grid.is_symmetric()
        && grid.white_connected()
        && grid.shortest_run().map_or(false, |len| len >= MIN_SLOT_LEN)
        && (min_black..=max_black).contains(&grid.black_count())
}

pub fn generate_template(size: usize, rng: &mut StdRng) -> Result<Grid, TemplateError> {
    let (min_black, max_black) = black_band(size);
    let mut attempts = 0;
    for _ in 0..CONSTRUCTION_ATTEMPTS {
        attempts += 1;
        if let Some(grid) = construct(size, min_black, max_black, rng) {
            debug!(
                "Template accepted after {} construction attempts ({} black cells)",
                attempts,
                grid.black_count()
            );
            return Ok(grid);
        }
    }
    Err(TemplateError::Exhausted { attempts })
}

fn construct(size: usize, min_black: usize, max_black: usize, rng: &mut StdRng) -> Option<Grid> {
    if min_black > max_black {
        return None;
    }
    let mut grid = Grid::new(size);
    let target = rng.gen_range(min_black..=max_black);
    let mut tries = 0;
    while grid.black_count() < target && tries < size * size * 20 {
        tries += 1;
        let row = rng.gen_range(0..size);
        let col = rng.gen_range(0..size);
        try_black_pair(&mut grid, row, col);
    }
    let count = grid.black_count();
    (count >= min_black && count <= max_black && is_valid_template(&grid)).then_some(grid)
}

/// Tentatively blacken (row, col) and its 180° partner, keeping the change
/// only if every touched line still has legal runs and the white cells stay
/// connected.
fn try_black_pair(grid: &mut Grid, row: usize, col: usize) -> bool {
    if grid.get(row, col).is_black() {
        return false;
    }
    let (prow, pcol) = grid.partner(row, col);
    grid.set(row, col, Cell::Black);
    grid.set(prow, pcol, Cell::Black);
    let ok = runs_ok(grid.row(row))
        && runs_ok(grid.col(col))
        && runs_ok(grid.row(prow))
        && runs_ok(grid.col(pcol))
        && grid.white_connected();
    if !ok {
        grid.set(row, col, Cell::Empty);
        grid.set(prow, pcol, Cell::Empty);
    }
    ok
}

fn runs_ok(line: &[Cell]) -> bool {
    line.split(|cell| cell.is_black())
        .all(|run| run.is_empty() || run.len() >= MIN_SLOT_LEN)
}
