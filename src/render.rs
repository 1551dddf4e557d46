use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

use crate::grid::Grid;
use crate::number::ClueEntry;

/// The contract handed to the page renderer: a filled grid, the clue number
/// map, and the ordered across/down lists. The external PDF renderer
/// consumes the same structure; this module's text renderer is the bundled
/// reference implementation.
pub struct PuzzlePage<'a> {
    pub title: &'a str,
    pub grid: &'a Grid,
    pub numbers: &'a HashMap<(usize, usize), u32>,
    pub across: &'a [ClueEntry],
    pub down: &'a [ClueEntry],
}

impl fmt::Display for PuzzlePage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        self.write_blank_grid(f)?;
        writeln!(f)?;
        write!(f, "{}", self.grid)?;
        writeln!(f)?;
        writeln!(f, "ACROSS")?;
        for entry in self.across {
            writeln!(f, "{:>3}. {} ({})", entry.number, entry.clue, entry.answer)?;
        }
        writeln!(f)?;
        writeln!(f, "DOWN")?;
        for entry in self.down {
            writeln!(f, "{:>3}. {} ({})", entry.number, entry.clue, entry.answer)?;
        }
        Ok(())
    }
}

impl PuzzlePage<'_> {
    /// The solving grid: black squares, clue numbers at slot starts, dots
    /// elsewhere.
    fn write_blank_grid(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid.size() {
            for col in 0..self.grid.size() {
                if self.grid.get(row, col).is_black() {
                    write!(f, "  #")?;
                } else if let Some(number) = self.numbers.get(&(row, col)) {
                    write!(f, "{:>3}", number)?;
                } else {
                    write!(f, "  .")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn write_page(page: &PuzzlePage<'_>, path: &Path) -> io::Result<()> {
    std::fs::write(path, page.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_from;
    use crate::number::assign_numbers;

    #[test]
    fn page_lists_clues_in_number_order() {
        let grid = grid_from(&["SIT", "ACE", "PEN"]);
        let numbering = assign_numbers(&grid);
        let (across, down) = crate::number::clue_lists(&numbering, |item| {
            Some(format!("Clue for {}", item.answer))
        });
        let page = PuzzlePage {
            title: "CROSSWORD",
            grid: &grid,
            numbers: &numbering.numbers,
            across: &across,
            down: &down,
        };
        let text = page.to_string();
        assert!(text.starts_with("CROSSWORD\n"));
        assert!(text.contains("  1  2  3"));
        assert!(text.contains("  4  .  ."));
        assert!(text.contains("ACROSS"));
        assert!(text.contains("  1. Clue for SIT (SIT)"));
        assert!(text.contains("  3. Clue for TEN (TEN)"));
        let across_at = text.find("ACROSS").unwrap();
        let down_at = text.find("DOWN").unwrap();
        assert!(across_at < down_at);
    }
}
