use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::grid::{Cell, Grid};
use crate::lexicon::Lexicon;
use crate::slots::{SlotGraph, SlotId};

/// Random bonus added to candidate scores so that retries explore different
/// orderings. Deterministic under a fixed seed.
const SCORE_JITTER: f64 = 0.1;

/// Hard caps on a single fill attempt. Exceeding either fails the attempt
/// without partial output.
#[derive(Debug, Clone, Copy)]
pub struct FillBudget {
    pub max_nodes: usize,
    pub max_time: Duration,
}

impl Default for FillBudget {
    fn default() -> Self {
        FillBudget {
            max_nodes: 100_000,
            max_time: Duration::from_secs(10),
        }
    }
}

/// Diagnostics from a failed attempt, recovered by the retry controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillFailure {
    pub nodes: usize,
    pub best_assigned: usize,
}

/// Depth-first search with chronological backtracking over the slot graph.
pub struct Filler<'a> {
    lexicon: &'a Lexicon,
    budget: FillBudget,
}

impl<'a> Filler<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Filler {
            lexicon,
            budget: FillBudget::default(),
        }
    }

    pub fn with_budget(lexicon: &'a Lexicon, budget: FillBudget) -> Self {
        Filler { lexicon, budget }
    }

    /// Attempt a complete fill of the template. On success every white cell
    /// of the returned grid carries a letter; on failure the working copy is
    /// discarded and only diagnostics are returned.
    pub fn fill(&self, template: &Grid, graph: &SlotGraph, seed: u64) -> Result<Grid, FillFailure> {
        let mut search = Search {
            lexicon: self.lexicon,
            graph,
            grid: template.clone(),
            assigned: vec![None; graph.len()],
            assigned_count: 0,
            best_assigned: 0,
            used: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
            nodes: 0,
            max_nodes: self.budget.max_nodes,
            deadline: Instant::now() + self.budget.max_time,
            out_of_budget: false,
        };
        if search.solve() {
            debug!("Fill succeeded after {} nodes", search.nodes);
            Ok(search.grid)
        } else {
            debug!(
                "Fill failed after {} nodes, best {} of {} slots",
                search.nodes,
                search.best_assigned,
                graph.len()
            );
            Err(FillFailure {
                nodes: search.nodes,
                best_assigned: search.best_assigned,
            })
        }
    }
}

struct Search<'a> {
    lexicon: &'a Lexicon,
    graph: &'a SlotGraph,
    grid: Grid,
    assigned: Vec<Option<String>>,
    assigned_count: usize,
    best_assigned: usize,
    used: HashSet<String>,
    rng: StdRng,
    nodes: usize,
    max_nodes: usize,
    deadline: Instant,
    out_of_budget: bool,
}

impl Search<'_> {
    fn solve(&mut self) -> bool {
        if self.assigned_count == self.graph.len() {
            return true;
        }
        self.nodes += 1;
        if self.nodes > self.max_nodes || Instant::now() >= self.deadline {
            self.out_of_budget = true;
            return false;
        }
        let slot_id = match self.most_constrained() {
            Some(id) => id,
            None => return false,
        };
        for word in self.candidates(slot_id) {
            let newly = self.place(slot_id, &word);
            if self.forward_check(slot_id) && self.solve() {
                return true;
            }
            self.unplace(slot_id, &word, newly);
            if self.out_of_budget {
                return false;
            }
        }
        false
    }

    /// The unassigned slot with the fewest lexicon candidates for its current
    /// pattern. Ties go to the slot with more crossings, then the lower id.
    fn most_constrained(&self) -> Option<SlotId> {
        let mut best: Option<(usize, Reverse<usize>, SlotId)> = None;
        for id in 0..self.graph.len() {
            if self.assigned[id].is_some() {
                continue;
            }
            let pattern = self.graph.slots[id].pattern(&self.grid);
            let count = self.lexicon.count_matches(&pattern);
            let key = (count, Reverse(self.graph.crossing_count(id)), id);
            if best.map_or(true, |b| key < b) {
                best = Some(key);
            }
        }
        best.map(|(_, _, id)| id)
    }

    /// Unused candidates for the slot, highest jittered score first.
    fn candidates(&mut self, slot_id: SlotId) -> Vec<String> {
        let pattern = self.graph.slots[slot_id].pattern(&self.grid);
        let lexicon = self.lexicon;
        let used = &self.used;
        let rng = &mut self.rng;
        let mut scored: Vec<(f64, String)> = lexicon
            .query(&pattern)
            .filter(|entry| !used.contains(&entry.word))
            .map(|entry| (entry.score + rng.gen_range(0.0..SCORE_JITTER), entry.word.clone()))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, word)| word).collect()
    }

    /// Write the word into the grid, returning the cells that were empty
    /// before so backtracking can restore them.
    fn place(&mut self, slot_id: SlotId, word: &str) -> Vec<(usize, usize)> {
        let mut newly = Vec::new();
        let cells = self.graph.slots[slot_id].cells.clone();
        for (offset, &(row, col)) in cells.iter().enumerate() {
            if self.grid.get(row, col).letter().is_none() {
                newly.push((row, col));
                self.grid
                    .set(row, col, Cell::Letter(word.as_bytes()[offset] as char));
            }
        }
        self.assigned[slot_id] = Some(word.to_string());
        self.assigned_count += 1;
        self.best_assigned = self.best_assigned.max(self.assigned_count);
        self.used.insert(word.to_string());
        newly
    }

    fn unplace(&mut self, slot_id: SlotId, word: &str, newly: Vec<(usize, usize)>) {
        for (row, col) in newly {
            self.grid.set(row, col, Cell::Empty);
        }
        self.assigned[slot_id] = None;
        self.assigned_count -= 1;
        self.used.remove(word);
    }

    /// Reject the tentative assignment as soon as any crossing slot is left
    /// without a single candidate.
    fn forward_check(&self, slot_id: SlotId) -> bool {
        for crossing in self.graph.crossings_of(slot_id) {
            if self.assigned[crossing.other].is_some() {
                continue;
            }
            let pattern = self.graph.slots[crossing.other].pattern(&self.grid);
            if self.lexicon.count_matches(&pattern) == 0 {
                return false;
            }
        }
        true
    }
}
