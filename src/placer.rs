use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::grid::{Cell, Direction, Grid};
use crate::input::ClueAnswer;
use crate::MIN_SLOT_LEN;

#[derive(Error, Debug, PartialEq)]
pub enum PlacementError {
    #[error("Best attempt placed only {placed} of {total} words, need at least {required}")]
    TooFewPlaced {
        placed: usize,
        total: usize,
        required: usize,
    },
}

/// A user-supplied entry committed to a grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedEntry {
    pub clue: String,
    pub answer: String,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy)]
pub struct PlacerOptions {
    pub size: usize,
    pub seed: u64,
    pub retries: usize,
    pub symmetry: bool,
    pub min_placed: usize,
}

#[derive(Debug)]
pub struct PlacerResult {
    pub grid: Grid,
    pub placed: Vec<PlacedEntry>,
    pub skipped: Vec<String>,
    pub intersections: usize,
}

/// Greedy free-form placement. Answers are taken longest first; the first
/// goes at dead center and each later one takes the highest-scoring valid
/// position. Entries with no valid position are skipped, so the result may
/// be partial.
pub fn place_all(
    entries: &[ClueAnswer],
    options: &PlacerOptions,
) -> Result<PlacerResult, PlacementError> {
    let mut order: Vec<&ClueAnswer> = entries.iter().collect();
    order.sort_by(|a, b| b.answer.len().cmp(&a.answer.len()));

    let mut best = next_attempt(&order, options, 0);
    for index in 1..options.retries.max(1) {
        let attempt = next_attempt(&order, options, index);
        if attempt.beats(&best) {
            best = attempt;
        }
    }

    if best.placed.len() < options.min_placed {
        return Err(PlacementError::TooFewPlaced {
            placed: best.placed.len(),
            total: entries.len(),
            required: options.min_placed,
        });
    }

    let grid = best.to_grid();
    for run in grid.all_runs() {
        if run.len() > 1 && run.len() < MIN_SLOT_LEN {
            warn!(
                "Placement created a {}-letter run '{}'",
                run.len(),
                Cell::as_string(run)
            );
        }
    }
    info!(
        "Placed {} of {} words with {} intersections",
        best.placed.len(),
        entries.len(),
        best.intersections
    );
    Ok(PlacerResult {
        grid,
        placed: best.placed,
        skipped: best.skipped,
        intersections: best.intersections,
    })
}

struct Attempt {
    size: usize,
    symmetry: bool,
    letters: Vec<Vec<Option<char>>>,
    blocked: Vec<Vec<bool>>,
    placed: Vec<PlacedEntry>,
    skipped: Vec<String>,
    intersections: usize,
    bbox: Option<(usize, usize, usize, usize)>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    row: usize,
    col: usize,
    direction: Direction,
    intersections: usize,
    score: f64,
}

fn next_attempt(order: &[&ClueAnswer], options: &PlacerOptions, index: usize) -> Attempt {
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(index as u64));
    let attempt = run_attempt(order, options, &mut rng);
    debug!(
        "Placement attempt {}: {} placed, {} intersections",
        index + 1,
        attempt.placed.len(),
        attempt.intersections
    );
    attempt
}

fn run_attempt(order: &[&ClueAnswer], options: &PlacerOptions, rng: &mut StdRng) -> Attempt {
    let mut attempt = Attempt {
        size: options.size,
        symmetry: options.symmetry,
        letters: vec![vec![None; options.size]; options.size],
        blocked: vec![vec![false; options.size]; options.size],
        placed: Vec::new(),
        skipped: Vec::new(),
        intersections: 0,
        bbox: None,
    };
    for entry in order {
        match attempt.best_candidate(&entry.answer, rng) {
            Some(candidate) => attempt.commit(entry, candidate),
            None => attempt.skipped.push(entry.answer.clone()),
        }
    }
    attempt
}

impl Attempt {
    /// The highest-scoring valid position, or the dead-center position for
    /// the first word.
    fn best_candidate(&self, word: &str, rng: &mut StdRng) -> Option<Candidate> {
        if self.placed.is_empty() {
            let row = self.size / 2;
            let col = (self.size.saturating_sub(word.len())) / 2;
            return self
                .validate(word, row, col, Direction::Across)
                .map(|intersections| Candidate {
                    row,
                    col,
                    direction: Direction::Across,
                    intersections,
                    score: 0.0,
                });
        }
        let mut best: Option<Candidate> = None;
        for direction in [Direction::Across, Direction::Down] {
            for row in 0..self.size {
                for col in 0..self.size {
                    let Some(intersections) = self.validate(word, row, col, direction) else {
                        continue;
                    };
                    let score = self.score(word, row, col, direction, intersections)
                        + rng.gen_range(0.0..0.1);
                    if best.map_or(true, |b| score > b.score) {
                        best = Some(Candidate {
                            row,
                            col,
                            direction,
                            intersections,
                            score,
                        });
                    }
                }
            }
        }
        best
    }

    fn cells_of(&self, word: &str, row: usize, col: usize, direction: Direction) -> Vec<(usize, usize)> {
        (0..word.len())
            .map(|i| match direction {
                Direction::Across => (row, col + i),
                Direction::Down => (row + i, col),
            })
            .collect()
    }

    /// Check rules (i)-(iv): inside the grid, letters agree at overlaps, no
    /// extension along the axis, no accidental perpendicular two-letter
    /// words. Returns the intersection count for a valid position.
    fn validate(&self, word: &str, row: usize, col: usize, direction: Direction) -> Option<usize> {
        let len = word.len();
        if len < 2 || len > self.size {
            return None;
        }
        match direction {
            Direction::Across => {
                if col + len > self.size {
                    return None;
                }
            }
            Direction::Down => {
                if row + len > self.size {
                    return None;
                }
            }
        }
        let cells = self.cells_of(word, row, col, direction);
        let mut intersections = 0;
        for (i, &(r, c)) in cells.iter().enumerate() {
            let letter = word.as_bytes()[i] as char;
            match self.letters[r][c] {
                Some(existing) => {
                    if existing != letter {
                        return None;
                    }
                    intersections += 1;
                }
                None => {
                    if self.blocked[r][c] {
                        return None;
                    }
                    for (nr, nc) in self.perpendicular_neighbors(r, c, direction) {
                        if self.letters[nr][nc].is_some() {
                            return None;
                        }
                    }
                }
            }
        }
        let borders = self.axis_borders(&cells, direction);
        for &(r, c) in &borders {
            if self.letters[r][c].is_some() {
                return None;
            }
        }
        if self.symmetry && !self.symmetry_consistent(&cells, &borders) {
            return None;
        }
        Some(intersections)
    }

    /// Under symmetry, every cell this word whitens must have a white
    /// partner (a cell of this same word, or an existing letter), and every
    /// border cell it blackens must not have a white partner.
    fn symmetry_consistent(&self, cells: &[(usize, usize)], borders: &[(usize, usize)]) -> bool {
        for &(r, c) in cells {
            let partner = (self.size - 1 - r, self.size - 1 - c);
            if !cells.contains(&partner) && self.letters[partner.0][partner.1].is_none() {
                return false;
            }
        }
        for &(r, c) in borders {
            let partner = (self.size - 1 - r, self.size - 1 - c);
            if cells.contains(&partner) || self.letters[partner.0][partner.1].is_some() {
                return false;
            }
        }
        true
    }

    fn perpendicular_neighbors(
        &self,
        row: usize,
        col: usize,
        direction: Direction,
    ) -> Vec<(usize, usize)> {
        let candidates = match direction {
            Direction::Across => [(row.wrapping_sub(1), col), (row + 1, col)],
            Direction::Down => [(row, col.wrapping_sub(1)), (row, col + 1)],
        };
        candidates
            .into_iter()
            .filter(|&(r, c)| r < self.size && c < self.size)
            .collect()
    }

    /// The in-grid cells immediately before and after the word along its
    /// axis. These become implied black squares.
    fn axis_borders(
        &self,
        cells: &[(usize, usize)],
        direction: Direction,
    ) -> Vec<(usize, usize)> {
        let (&(first_r, first_c), &(last_r, last_c)) = match (cells.first(), cells.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Vec::new(),
        };
        let candidates = match direction {
            Direction::Across => [
                (first_r, first_c.wrapping_sub(1)),
                (last_r, last_c + 1),
            ],
            Direction::Down => [
                (first_r.wrapping_sub(1), first_c),
                (last_r + 1, last_c),
            ],
        };
        candidates
            .into_iter()
            .filter(|&(r, c)| r < self.size && c < self.size)
            .collect()
    }

    /// `2·intersections + centrality − expansion`; the caller adds jitter.
    fn score(
        &self,
        word: &str,
        row: usize,
        col: usize,
        direction: Direction,
        intersections: usize,
    ) -> f64 {
        let cells = self.cells_of(word, row, col, direction);
        let (mid_r, mid_c) = cells[cells.len() / 2];
        let center = (self.size as f64 - 1.0) / 2.0;
        let distance = (mid_r as f64 - center).abs() + (mid_c as f64 - center).abs();
        let centrality = -distance / self.size as f64;

        let old_area = self.bbox.map_or(0, bbox_area);
        let new_area = bbox_area(self.grown_bbox(&cells));
        let expansion = (new_area - old_area) as f64 / (self.size * self.size) as f64;

        2.0 * intersections as f64 + centrality - expansion
    }

    fn grown_bbox(&self, cells: &[(usize, usize)]) -> (usize, usize, usize, usize) {
        let mut bbox = self.bbox.unwrap_or_else(|| {
            let &(r, c) = &cells[0];
            (r, r, c, c)
        });
        for &(r, c) in cells {
            bbox.0 = bbox.0.min(r);
            bbox.1 = bbox.1.max(r);
            bbox.2 = bbox.2.min(c);
            bbox.3 = bbox.3.max(c);
        }
        bbox
    }

    fn commit(&mut self, entry: &ClueAnswer, candidate: Candidate) {
        let cells = self.cells_of(&entry.answer, candidate.row, candidate.col, candidate.direction);
        for (i, &(r, c)) in cells.iter().enumerate() {
            self.letters[r][c] = Some(entry.answer.as_bytes()[i] as char);
        }
        for (r, c) in self.axis_borders(&cells, candidate.direction) {
            self.blocked[r][c] = true;
        }
        self.bbox = Some(self.grown_bbox(&cells));
        self.intersections += candidate.intersections;
        self.placed.push(PlacedEntry {
            clue: entry.clue.clone(),
            answer: entry.answer.clone(),
            row: candidate.row,
            col: candidate.col,
            direction: candidate.direction,
        });
    }

    /// Attempts are ranked by words placed, then total intersections, then
    /// compactness of the used area.
    fn beats(&self, other: &Attempt) -> bool {
        if self.placed.len() != other.placed.len() {
            return self.placed.len() > other.placed.len();
        }
        if self.intersections != other.intersections {
            return self.intersections > other.intersections;
        }
        self.compactness() > other.compactness()
    }

    fn compactness(&self) -> f64 {
        let white: usize = self
            .letters
            .iter()
            .flatten()
            .filter(|l| l.is_some())
            .count();
        let area = self.bbox.map_or(1, bbox_area);
        white as f64 / area as f64
    }

    fn to_grid(&self) -> Grid {
        let rows = self
            .letters
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(letter) => Cell::Letter(*letter),
                        None => Cell::Black,
                    })
                    .collect()
            })
            .collect();
        Grid::from_rows(rows)
    }
}

fn bbox_area((rmin, rmax, cmin, cmax): (usize, usize, usize, usize)) -> i64 {
    ((rmax - rmin + 1) * (cmax - cmin + 1)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<ClueAnswer> {
        pairs
            .iter()
            .map(|(clue, answer)| ClueAnswer {
                clue: clue.to_string(),
                answer: answer.to_string(),
            })
            .collect()
    }

    fn options(size: usize, symmetry: bool, min_placed: usize) -> PlacerOptions {
        PlacerOptions {
            size,
            seed: 1,
            retries: 5,
            symmetry,
            min_placed,
        }
    }

    #[test]
    fn first_word_lands_at_dead_center() {
        let input = entries(&[("Power source", "GENERATOR")]);
        let result = place_all(&input, &options(15, false, 1)).unwrap();
        assert_eq!(result.placed.len(), 1);
        let first = &result.placed[0];
        assert_eq!((first.row, first.col), (7, 3));
        assert_eq!(first.direction, Direction::Across);
    }

    #[test]
    fn second_word_crosses_the_first() {
        let input = entries(&[("Feline", "CAT"), ("Serve well", "ACE")]);
        let result = place_all(&input, &options(5, false, 2)).unwrap();
        assert_eq!(result.placed.len(), 2);
        assert_eq!(result.intersections, 1);
        assert_eq!(result.placed[1].direction, Direction::Down);
    }

    #[test]
    fn disjoint_words_fall_back_to_free_placement() {
        let input = entries(&[("Feline", "CAT"), ("Hound", "DOG")]);
        let result = place_all(&input, &options(7, false, 2)).unwrap();
        assert_eq!(result.placed.len(), 2);
        assert_eq!(result.intersections, 0);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn committed_letters_agree_at_every_overlap() {
        let input = entries(&[
            ("One", "STONE"),
            ("Two", "TRACE"),
            ("Three", "EAGLE"),
            ("Four", "CAT"),
            ("Five", "NET"),
        ]);
        let result = place_all(&input, &options(11, false, 2)).unwrap();
        for entry in &result.placed {
            for (i, letter) in entry.answer.chars().enumerate() {
                let (r, c) = match entry.direction {
                    Direction::Across => (entry.row, entry.col + i),
                    Direction::Down => (entry.row + i, entry.col),
                };
                assert_eq!(result.grid.get(r, c), &Cell::Letter(letter));
            }
        }
    }

    #[test]
    fn symmetry_rejects_partnerless_placements() {
        let input = entries(&[("Feline", "CAT"), ("Hound", "DOG")]);
        let free = place_all(&input, &options(5, false, 2)).unwrap();
        assert_eq!(free.placed.len(), 2);

        let err = place_all(&input, &options(5, true, 2)).unwrap_err();
        assert_eq!(
            err,
            PlacementError::TooFewPlaced {
                placed: 1,
                total: 2,
                required: 2,
            }
        );
    }

    fn thirty_short_answers() -> Vec<ClueAnswer> {
        let answers = [
            "CAT", "DOG", "SUN", "MAP", "BOX", "FIG", "HEN", "JAR", "KEY", "LOG", "NET", "OWL",
            "PIG", "RUG", "TUB", "VAN", "WEB", "YAM", "ZOO", "ACE", "BED", "COW", "DEN", "EGG",
            "FOX", "GUM", "HAT", "INK", "JET", "LAW",
        ];
        answers
            .iter()
            .map(|answer| ClueAnswer {
                clue: format!("Clue for {}", answer),
                answer: answer.to_string(),
            })
            .collect()
    }

    #[test]
    fn thirty_short_answers_all_place_on_a_standard_grid() {
        let input = thirty_short_answers();
        let result = place_all(
            &input,
            &PlacerOptions {
                size: 15,
                seed: 1,
                retries: 5,
                symmetry: false,
                min_placed: 30,
            },
        )
        .unwrap();
        assert_eq!(result.placed.len(), 30);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn symmetry_fails_the_same_thirty_answers() {
        let input = thirty_short_answers();
        let err = place_all(
            &input,
            &PlacerOptions {
                size: 15,
                seed: 1,
                retries: 5,
                symmetry: true,
                min_placed: 30,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::TooFewPlaced { required: 30, .. }
        ));
    }

    #[test]
    fn unplaceable_answers_are_skipped_not_fatal() {
        let input = entries(&[("Feline", "CAT"), ("Too big", "EXTRAORDINARY")]);
        let result = place_all(&input, &options(5, false, 1)).unwrap();
        assert_eq!(result.placed.len(), 1);
        assert_eq!(result.skipped, vec!["EXTRAORDINARY".to_string()]);
    }

    #[test]
    fn unused_cells_materialize_as_black() {
        let input = entries(&[("Feline", "CAT")]);
        let result = place_all(&input, &options(5, false, 1)).unwrap();
        assert_eq!(result.grid.white_count(), 3);
        assert_eq!(result.grid.black_count(), 22);
    }

    #[test]
    fn attempts_are_deterministic_for_a_seed() {
        let input = entries(&[
            ("One", "STONE"),
            ("Two", "TRACE"),
            ("Three", "EAGLE"),
            ("Four", "CAT"),
            ("Five", "NET"),
        ]);
        let first = place_all(&input, &options(11, false, 2)).unwrap();
        let second = place_all(&input, &options(11, false, 2)).unwrap();
        assert_eq!(first.grid, second.grid);
        assert_eq!(first.placed, second.placed);
    }
}
