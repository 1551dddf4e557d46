use log::warn;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::lexicon::normalize;
use crate::DEFAULT_GRID_SIZE;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Unable to read the word list '{path}': {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
    #[error("The word list holds no entries")]
    Empty,
    #[error("Missing required column '{0}' in the header row")]
    MissingColumn(&'static str),
    #[error("Row {row}: answer '{answer}' contains no usable letters")]
    BadAnswer { row: usize, answer: String },
    #[error("Duplicate answer '{0}'")]
    DuplicateAnswer(String),
    #[error("Answer '{answer}' is {len} letters, too long for a {size}x{size} grid")]
    AnswerTooLong {
        answer: String,
        len: usize,
        size: usize,
    },
}

/// One user-supplied entry, with the answer normalized to uppercase A-Z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueAnswer {
    pub clue: String,
    pub answer: String,
}

/// Interpret a parsed worksheet: a header row followed by data rows. The
/// simple form needs `word` and `clue` columns; the richer export form is
/// recognized by an `answer` column, whose `number` column is only an
/// ordering hint. Headers are case-insensitive.
pub fn entries_from_rows(
    rows: &[Vec<String>],
    grid_size: Option<usize>,
) -> Result<Vec<ClueAnswer>, InputError> {
    let header = match rows.first() {
        Some(header) => header,
        None => return Err(InputError::Empty),
    };
    let find = |name: &str| {
        header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(name))
    };

    let (answer_col, clue_col, number_col) = if let Some(answer_col) = find("answer") {
        let clue_col = find("clue").ok_or(InputError::MissingColumn("clue"))?;
        (answer_col, clue_col, find("number"))
    } else {
        let answer_col = find("word").ok_or(InputError::MissingColumn("word"))?;
        let clue_col = find("clue").ok_or(InputError::MissingColumn("clue"))?;
        (answer_col, clue_col, None)
    };

    let mut seen = HashSet::new();
    let mut numbered: Vec<(u32, usize, ClueAnswer)> = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(1) {
        let raw = row.get(answer_col).map(String::as_str).unwrap_or("");
        if raw.trim().is_empty() && row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let answer = normalize(raw).ok_or_else(|| InputError::BadAnswer {
            row: index + 1,
            answer: raw.to_string(),
        })?;
        if let Some(size) = grid_size {
            if answer.len() > size {
                let len = answer.len();
                return Err(InputError::AnswerTooLong { answer, len, size });
            }
        }
        if !seen.insert(answer.clone()) {
            return Err(InputError::DuplicateAnswer(answer));
        }
        let clue = row
            .get(clue_col)
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();
        let hint = number_col
            .and_then(|col| row.get(col))
            .and_then(|cell| cell.trim().parse::<u32>().ok())
            .unwrap_or(u32::MAX);
        numbered.push((hint, index, ClueAnswer { clue, answer }));
    }

    if numbered.is_empty() {
        return Err(InputError::Empty);
    }
    numbered.sort_by_key(|&(hint, index, _)| (hint, index));
    if number_col.is_some() {
        let contiguous = numbered
            .iter()
            .enumerate()
            .all(|(i, &(hint, _, _))| hint == i as u32 + 1);
        if !contiguous {
            warn!("Worksheet numbers are not contiguous from 1; entries are renumbered after placement");
        }
    }
    Ok(numbered.into_iter().map(|(_, _, entry)| entry).collect())
}

/// Load the tab-separated interchange the XLSX front-end emits.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
        .collect())
}

/// Grid size for XLSX mode when the user does not pass one.
pub fn derive_grid_size(entries: &[ClueAnswer]) -> usize {
    let longest = entries.iter().map(|e| e.answer.len()).max().unwrap_or(0);
    longest.max(DEFAULT_GRID_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
        table
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn simple_form_is_case_insensitive_and_normalizes() {
        let table = rows(&[
            &["Word", "Clue"],
            &["cat", "Feline"],
            &["ice-cream", "Cone filler"],
        ]);
        let entries = entries_from_rows(&table, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].answer, "CAT");
        assert_eq!(entries[1].answer, "ICECREAM");
        assert_eq!(entries[1].clue, "Cone filler");
    }

    #[test]
    fn rich_form_orders_by_the_number_hint() {
        let table = rows(&[
            &["Number", "Direction", "Row", "Col", "Clue", "Answer"],
            &["2", "Down", "3", "4", "Second", "BETA"],
            &["1", "Across", "1", "1", "First", "ALPHA"],
        ]);
        let entries = entries_from_rows(&table, None).unwrap();
        assert_eq!(entries[0].answer, "ALPHA");
        assert_eq!(entries[1].answer, "BETA");
    }

    #[test]
    fn missing_clue_column_is_an_error() {
        let table = rows(&[&["Word"], &["CAT"]]);
        assert!(matches!(
            entries_from_rows(&table, None),
            Err(InputError::MissingColumn("clue"))
        ));
    }

    #[test]
    fn answer_without_letters_is_an_error() {
        let table = rows(&[&["word", "clue"], &["123", "Numeric"]]);
        assert!(matches!(
            entries_from_rows(&table, None),
            Err(InputError::BadAnswer { row: 2, .. })
        ));
    }

    #[test]
    fn duplicate_answers_are_rejected_case_insensitively() {
        let table = rows(&[&["word", "clue"], &["CAT", "One"], &["cat", "Two"]]);
        assert!(matches!(
            entries_from_rows(&table, None),
            Err(InputError::DuplicateAnswer(answer)) if answer == "CAT"
        ));
    }

    #[test]
    fn answers_longer_than_the_grid_are_rejected() {
        let table = rows(&[&["word", "clue"], &["EXTRAORDINARY", "Big"]]);
        assert!(matches!(
            entries_from_rows(&table, Some(5)),
            Err(InputError::AnswerTooLong { size: 5, .. })
        ));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let table = rows(&[&["word", "clue"], &["", ""], &["CAT", "Feline"]]);
        let entries = entries_from_rows(&table, None).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn grid_size_grows_to_fit_the_longest_answer() {
        let entries = vec![
            ClueAnswer {
                clue: String::new(),
                answer: "CAT".to_string(),
            },
            ClueAnswer {
                clue: String::new(),
                answer: "EXTRATERRESTRIAL".to_string(),
            },
        ];
        assert_eq!(derive_grid_size(&entries), 16);
        assert_eq!(derive_grid_size(&entries[..1].to_vec()), 15);
    }
}
