use log::warn;
use std::collections::HashMap;

use crate::grid::{Cell, Direction, Grid};

/// One line of the printed clue lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueEntry {
    pub number: u32,
    pub clue: String,
    pub answer: String,
}

/// A numbered answer before clue text has been attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedAnswer {
    pub number: u32,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct Numbering {
    pub numbers: HashMap<(usize, usize), u32>,
    pub across: Vec<NumberedAnswer>,
    pub down: Vec<NumberedAnswer>,
}

/// Scan row-major and hand out sequential numbers. A white cell starts across
/// when its left neighbor is black or the edge and its right neighbor is
/// white; starting down is the same rotated.
pub fn assign_numbers(grid: &Grid) -> Numbering {
    let size = grid.size();
    let mut numbering = Numbering::default();
    let mut next = 1u32;
    for row in 0..size {
        for col in 0..size {
            if grid.get(row, col).is_black() {
                continue;
            }
            let starts_across = (col == 0 || grid.get(row, col - 1).is_black())
                && col + 1 < size
                && grid.get(row, col + 1).is_white();
            let starts_down = (row == 0 || grid.get(row - 1, col).is_black())
                && row + 1 < size
                && grid.get(row + 1, col).is_white();
            if !starts_across && !starts_down {
                continue;
            }
            numbering.numbers.insert((row, col), next);
            if starts_across {
                numbering.across.push(NumberedAnswer {
                    number: next,
                    row,
                    col,
                    direction: Direction::Across,
                    answer: read_answer(grid, row, col, Direction::Across),
                });
            }
            if starts_down {
                numbering.down.push(NumberedAnswer {
                    number: next,
                    row,
                    col,
                    direction: Direction::Down,
                    answer: read_answer(grid, row, col, Direction::Down),
                });
            }
            next += 1;
        }
    }
    numbering
}

fn read_answer(grid: &Grid, row: usize, col: usize, direction: Direction) -> String {
    let (line, start) = match direction {
        Direction::Across => (grid.row(row), col),
        Direction::Down => (grid.col(col), row),
    };
    let run: Vec<Cell> = line[start..]
        .iter()
        .take_while(|cell| cell.is_white())
        .cloned()
        .collect();
    Cell::as_string(&run)
}

/// Attach clue text through the given resolver. When nothing resolves the
/// answer itself stands in, with a warning.
pub fn clue_lists<F>(numbering: &Numbering, mut resolve: F) -> (Vec<ClueEntry>, Vec<ClueEntry>)
where
    F: FnMut(&NumberedAnswer) -> Option<String>,
{
    let across = numbering
        .across
        .iter()
        .map(|item| attach(item, &mut resolve))
        .collect();
    let down = numbering
        .down
        .iter()
        .map(|item| attach(item, &mut resolve))
        .collect();
    (across, down)
}

fn attach<F>(item: &NumberedAnswer, resolve: &mut F) -> ClueEntry
where
    F: FnMut(&NumberedAnswer) -> Option<String>,
{
    let clue = match resolve(item) {
        Some(clue) => clue,
        None => {
            warn!(
                "No clue resolved for '{}' ({} {}), using the answer",
                item.answer, item.number, item.direction
            );
            item.answer.clone()
        }
    };
    ClueEntry {
        number: item.number,
        clue,
        answer: item.answer.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_from;

    #[test]
    fn open_square_numbers_edges_only() {
        let grid = grid_from(&["SIT", "ACE", "PEN"]);
        let numbering = assign_numbers(&grid);
        assert_eq!(numbering.numbers[&(0, 0)], 1);
        assert_eq!(numbering.numbers[&(0, 1)], 2);
        assert_eq!(numbering.numbers[&(0, 2)], 3);
        assert_eq!(numbering.numbers[&(1, 0)], 4);
        assert_eq!(numbering.numbers[&(2, 0)], 5);
        assert_eq!(numbering.numbers.len(), 5);

        let across: Vec<(u32, &str)> = numbering
            .across
            .iter()
            .map(|a| (a.number, a.answer.as_str()))
            .collect();
        assert_eq!(across, vec![(1, "SIT"), (4, "ACE"), (5, "PEN")]);
        let down: Vec<(u32, &str)> = numbering
            .down
            .iter()
            .map(|a| (a.number, a.answer.as_str()))
            .collect();
        assert_eq!(down, vec![(1, "SAP"), (2, "ICE"), (3, "TEN")]);
    }

    #[test]
    fn numbers_are_contiguous_and_row_major() {
        let grid = grid_from(&["#...#", ".....", "..#..", ".....", "#...#"]);
        let numbering = assign_numbers(&grid);
        let mut positions: Vec<((usize, usize), u32)> =
            numbering.numbers.iter().map(|(&p, &n)| (p, n)).collect();
        positions.sort();
        let ordered: Vec<u32> = positions.iter().map(|&(_, n)| n).collect();
        assert_eq!(ordered, (1..=ordered.len() as u32).collect::<Vec<u32>>());

        let across_numbers: Vec<u32> = numbering.across.iter().map(|a| a.number).collect();
        let down_numbers: Vec<u32> = numbering.down.iter().map(|a| a.number).collect();
        assert_eq!(across_numbers, vec![1, 4, 6, 7, 8, 10]);
        assert_eq!(down_numbers, vec![1, 2, 3, 4, 5, 9]);
    }

    #[test]
    fn resolver_fallback_uses_the_answer() {
        let grid = grid_from(&["SIT", "ACE", "PEN"]);
        let numbering = assign_numbers(&grid);
        let (across, _) = clue_lists(&numbering, |item| {
            (item.answer == "SIT").then(|| "Take a seat".to_string())
        });
        assert_eq!(across[0].clue, "Take a seat");
        assert_eq!(across[1].clue, "ACE");
        assert_eq!(across[1].answer, "ACE");
    }
}
