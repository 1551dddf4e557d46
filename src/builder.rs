use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::fill::{FillBudget, Filler};
use crate::grid::Grid;
use crate::lexicon::Lexicon;
use crate::slots::SlotGraph;
use crate::template::{RandomTemplate, TemplateError, TemplateSource};

/// Terminal failure of the fill pipeline, raised only after every retry has
/// been spent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(
    "Fill search exhausted after {attempts} attempts (best attempt assigned {best_assigned} of {slot_count} slots)"
)]
pub struct FillError {
    pub attempts: usize,
    pub best_assigned: usize,
    pub slot_count: usize,
}

#[derive(Error, Debug, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Fill(#[from] FillError),
}

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub seed: u64,
    pub retries: usize,
    pub fill_budget: FillBudget,
    pub overall_budget: Option<Duration>,
}

impl BuildOptions {
    pub fn new(seed: u64, retries: usize) -> Self {
        BuildOptions {
            seed,
            retries,
            fill_budget: FillBudget::default(),
            overall_budget: None,
        }
    }
}

/// Generate-mode pipeline: template, slots, fill, retried up to the budget.
pub fn generate(lexicon: &Lexicon, size: usize, options: &BuildOptions) -> Result<Grid, BuildError> {
    let mut source = RandomTemplate::new(size);
    build_puzzle(lexicon, &mut source, options)
}

/// The outer retry loop. Each attempt draws a fresh template and runs one
/// fill; per-attempt failures are recovered here and never surface. The
/// attempt RNG and the fill seed both derive from seed + attempt index.
pub fn build_puzzle(
    lexicon: &Lexicon,
    source: &mut dyn TemplateSource,
    options: &BuildOptions,
) -> Result<Grid, BuildError> {
    let deadline = options.overall_budget.map(|budget| Instant::now() + budget);
    let filler = Filler::with_budget(lexicon, options.fill_budget);
    let mut fill_attempts = 0;
    let mut best_assigned = 0;
    let mut slot_count = 0;
    let mut last_template_error = None;

    for attempt in 0..options.retries {
        if deadline.map_or(false, |d| Instant::now() >= d) {
            info!("Overall time budget expired after {} attempts", attempt);
            break;
        }
        let attempt_seed = options.seed.wrapping_add(attempt as u64);
        let mut rng = StdRng::seed_from_u64(attempt_seed);
        let template = match source.next_template(&mut rng) {
            Ok(template) => template,
            Err(err) => {
                debug!("Attempt {}: {}", attempt + 1, err);
                last_template_error = Some(err);
                continue;
            }
        };
        let graph = SlotGraph::extract(&template);
        slot_count = graph.len();
        fill_attempts += 1;
        match filler.fill(&template, &graph, attempt_seed) {
            Ok(grid) => {
                info!("Fill succeeded on attempt {} of {}", attempt + 1, options.retries);
                return Ok(grid);
            }
            Err(failure) => {
                debug!(
                    "Attempt {}: fill failed after {} nodes, reached {} of {} slots",
                    attempt + 1,
                    failure.nodes,
                    failure.best_assigned,
                    graph.len()
                );
                best_assigned = best_assigned.max(failure.best_assigned);
            }
        }
    }

    if fill_attempts == 0 {
        Err(BuildError::Template(last_template_error.unwrap_or(
            TemplateError::Exhausted {
                attempts: options.retries,
            },
        )))
    } else {
        Err(BuildError::Fill(FillError {
            attempts: fill_attempts,
            best_assigned,
            slot_count,
        }))
    }
}
