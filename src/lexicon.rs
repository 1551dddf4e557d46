use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

use crate::MAX_WORD_LEN;

/// Score for curated bank entries, which come with hand-written clues.
pub const BANK_SCORE: f64 = 1.0;
/// Score for bulk dictionary entries.
pub const DICTIONARY_SCORE: f64 = 0.3;

/// Suffixes stripped (one at a time) when resolving a clue through a bank stem.
const INFLECTIONS: [&str; 5] = ["S", "ED", "ING", "ER", "LY"];

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Unable to read the word source '{path}': {source}")]
    UnreadableSource { path: String, source: io::Error },
    #[error("Only {count} clueable entries were loaded, need at least {minimum}")]
    TooFewEntries { count: usize, minimum: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    Bank,
    Dictionary,
}

#[derive(Debug, Clone)]
pub struct LexiconEntry {
    pub word: String,
    pub score: f64,
    pub source: WordSource,
}

/// A fixed-length query where each position is either a known letter or a
/// wildcard. Compiled to an anchored regex once, then matched against every
/// word in the length bucket.
#[derive(Debug)]
pub struct Pattern {
    regex: Regex,
    len: usize,
}

impl Pattern {
    pub fn new(letters: &[Option<char>]) -> Self {
        let mut expr = String::with_capacity(letters.len() + 2);
        expr.push('^');
        for letter in letters {
            expr.push(letter.unwrap_or('.'));
        }
        expr.push('$');
        let regex = Regex::new(&expr).expect("Unable to build pattern regex");
        Pattern {
            regex,
            len: letters.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn matches(&self, word: &str) -> bool {
        self.regex.is_match(word)
    }
}

/// External semantic dictionary, consulted for words the bank cannot clue.
/// The PDF pipeline wires a real implementation in; tests use stubs.
pub trait ClueSource {
    fn clue(&self, word: &str) -> Option<String>;
}

/// Uppercase, strip everything outside A-Z, reject results shorter than 2.
pub fn normalize(raw: &str) -> Option<String> {
    let word: String = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if word.len() >= 2 {
        Some(word)
    } else {
        None
    }
}

fn inflected_stem<'a>(word: &'a str, clues: &HashMap<String, String>) -> Option<&'a str> {
    for suffix in INFLECTIONS {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.len() >= 2 && clues.contains_key(stem) {
                return Some(stem);
            }
        }
    }
    None
}

/// Immutable word index, bucketed by length, each bucket sorted by descending
/// score. Built once per run and shared read-only across all fill attempts.
pub struct Lexicon {
    buckets: Vec<Vec<LexiconEntry>>,
    clues: HashMap<String, String>,
}

impl Lexicon {
    /// Normalize, deduplicate, filter for clueability and index the given
    /// sources. Every entry that survives is guaranteed to resolve a clue.
    pub fn build(
        bank: &[(String, String)],
        dictionary: &[String],
        external: Option<&dyn ClueSource>,
    ) -> Self {
        let mut clues: HashMap<String, String> = HashMap::new();
        let mut best: HashMap<String, LexiconEntry> = HashMap::new();

        for (raw, clue) in bank {
            let Some(word) = normalize(raw) else { continue };
            if word.len() > MAX_WORD_LEN {
                warn!("Dropping bank word '{}': longer than {} letters", word, MAX_WORD_LEN);
                continue;
            }
            clues.entry(word.clone()).or_insert_with(|| clue.clone());
            admit(
                &mut best,
                LexiconEntry {
                    word,
                    score: BANK_SCORE,
                    source: WordSource::Bank,
                },
            );
        }

        for raw in dictionary {
            let Some(word) = normalize(raw) else { continue };
            if word.len() > MAX_WORD_LEN {
                continue;
            }
            let clueable =
                clues.contains_key(&word) || inflected_stem(&word, &clues).is_some();
            if !clueable {
                match external.and_then(|source| source.clue(&word)) {
                    Some(clue) => {
                        clues.insert(word.clone(), clue);
                    }
                    None => continue,
                }
            }
            admit(
                &mut best,
                LexiconEntry {
                    word,
                    score: DICTIONARY_SCORE,
                    source: WordSource::Dictionary,
                },
            );
        }

        let mut buckets = vec![Vec::new(); MAX_WORD_LEN + 1];
        for (_, entry) in best {
            buckets[entry.word.len()].push(entry);
        }
        for bucket in &mut buckets {
            bucket.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.word.cmp(&b.word)));
        }
        Lexicon { buckets, clues }
    }

    /// Build from the configured source files, falling back to the embedded
    /// assets, and require a minimum number of surviving entries.
    pub fn from_sources(
        bank_path: Option<&Path>,
        dictionary_path: Option<&Path>,
        system_words: Option<&Path>,
        minimum: usize,
    ) -> Result<Lexicon, LexiconError> {
        let bank = match bank_path {
            Some(path) => read_bank(path)?,
            None => BUILTIN_BANK.clone(),
        };
        let mut words = match dictionary_path {
            Some(path) => read_word_list(path)?,
            None => BUILTIN_WORDS.clone(),
        };
        if let Some(path) = system_words {
            let allowed: HashSet<String> = read_word_list(path)?
                .iter()
                .filter_map(|w| normalize(w))
                .collect();
            words.retain(|w| normalize(w).map_or(false, |n| allowed.contains(&n)));
        }
        let lexicon = Lexicon::build(&bank, &words, None);
        if lexicon.len() < minimum {
            return Err(LexiconError::TooFewEntries {
                count: lexicon.len(),
                minimum,
            });
        }
        let from_bank = lexicon
            .buckets
            .iter()
            .flatten()
            .filter(|entry| entry.source == WordSource::Bank)
            .count();
        info!(
            "Loaded {} clueable lexicon entries ({} bank, {} dictionary)",
            lexicon.len(),
            from_bank,
            lexicon.len() - from_bank
        );
        Ok(lexicon)
    }

    fn bucket(&self, len: usize) -> &[LexiconEntry] {
        self.buckets.get(len).map_or(&[], |b| b.as_slice())
    }

    /// All entries of the pattern's length matching its known letters, in
    /// descending score order. Lazily produced, so callers that only want the
    /// top candidates stop early.
    pub fn query<'a>(&'a self, pattern: &'a Pattern) -> impl Iterator<Item = &'a LexiconEntry> {
        self.bucket(pattern.len())
            .iter()
            .filter(move |entry| pattern.matches(&entry.word))
    }

    pub fn count_matches(&self, pattern: &Pattern) -> usize {
        self.query(pattern).count()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.bucket(word.len()).iter().any(|e| e.word == word)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Resolve a clue: direct bank hit first, then an inflected stem.
    pub fn clue_for(&self, word: &str) -> Option<String> {
        if let Some(clue) = self.clues.get(word) {
            return Some(clue.clone());
        }
        inflected_stem(word, &self.clues).map(|stem| self.clues[stem].clone())
    }
}

fn admit(best: &mut HashMap<String, LexiconEntry>, entry: LexiconEntry) {
    match best.get_mut(&entry.word) {
        Some(existing) => {
            warn!(
                "Duplicate word '{}' collapsed, keeping score {}",
                entry.word,
                existing.score.max(entry.score)
            );
            if entry.score > existing.score {
                *existing = entry;
            }
        }
        None => {
            best.insert(entry.word.clone(), entry);
        }
    }
}

lazy_static! {
    static ref BUILTIN_BANK: Vec<(String, String)> = parse_bank(include_str!("../assets/bank.tsv"));
    static ref BUILTIN_WORDS: Vec<String> = include_str!("../assets/words.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
}

fn parse_bank(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let (word, clue) = line.split_once('\t')?;
            Some((word.trim().to_string(), clue.trim().to_string()))
        })
        .collect()
}

pub fn read_bank(path: &Path) -> Result<Vec<(String, String)>, LexiconError> {
    let text = std::fs::read_to_string(path).map_err(|source| LexiconError::UnreadableSource {
        path: path.display().to_string(),
        source,
    })?;
    let bank = parse_bank(&text);
    debug!("Read {} bank entries from {}", bank.len(), path.display());
    Ok(bank)
}

pub fn read_word_list(path: &Path) -> Result<Vec<String>, LexiconError> {
    let file = File::open(path).map_err(|source| LexiconError::UnreadableSource {
        path: path.display().to_string(),
        source,
    })?;
    let mut words = Vec::new();
    for line in io::BufReader::new(file).lines() {
        let line = line.map_err(|source| LexiconError::UnreadableSource {
            path: path.display().to_string(),
            source,
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            words.push(trimmed.to_string());
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(w, c)| (w.to_string(), c.to_string()))
            .collect()
    }

    fn words(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn normalize_strips_and_uppercases() {
        assert_eq!(normalize("don't"), Some("DONT".to_string()));
        assert_eq!(normalize("  cafe-au-lait "), Some("CAFEAULAIT".to_string()));
        assert_eq!(normalize("a"), None);
        assert_eq!(normalize("1+1"), None);
    }

    #[test]
    fn duplicate_keeps_highest_score() {
        let lexicon = Lexicon::build(&bank(&[("ABC", "The alphabet opener")]), &words(&["abc"]), None);
        let pattern = Pattern::new(&[None, None, None]);
        let matches: Vec<&LexiconEntry> = lexicon.query(&pattern).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].word, "ABC");
        assert_eq!(matches[0].score, BANK_SCORE);
    }

    #[test]
    fn unclueable_dictionary_words_are_dropped() {
        let lexicon = Lexicon::build(&bank(&[("CAT", "Tabby, e.g.")]), &words(&["cats", "xylem"]), None);
        assert!(lexicon.contains("CAT"));
        assert!(lexicon.contains("CATS"));
        assert!(!lexicon.contains("XYLEM"));
    }

    #[test]
    fn inflection_resolves_clue_through_stem() {
        let lexicon = Lexicon::build(&bank(&[("JUMP", "Leap")]), &words(&["jumped", "jumping"]), None);
        assert_eq!(lexicon.clue_for("JUMPED"), Some("Leap".to_string()));
        assert_eq!(lexicon.clue_for("JUMPING"), Some("Leap".to_string()));
        assert_eq!(lexicon.clue_for("SPROCKET"), None);
    }

    struct FixedClues;

    impl ClueSource for FixedClues {
        fn clue(&self, word: &str) -> Option<String> {
            (word == "XYLEM").then(|| "Water-carrying plant tissue".to_string())
        }
    }

    #[test]
    fn external_source_rescues_unclueable_words() {
        let lexicon = Lexicon::build(&bank(&[]), &words(&["xylem", "qoph"]), Some(&FixedClues));
        assert!(lexicon.contains("XYLEM"));
        assert!(!lexicon.contains("QOPH"));
        assert_eq!(
            lexicon.clue_for("XYLEM"),
            Some("Water-carrying plant tissue".to_string())
        );
    }

    struct AnyClue;

    impl ClueSource for AnyClue {
        fn clue(&self, word: &str) -> Option<String> {
            Some(format!("Definition of {}", word))
        }
    }

    #[test]
    fn query_orders_by_descending_score() {
        let lexicon = Lexicon::build(
            &bank(&[("TEN", "Perfect gymnastics score")]),
            &words(&["tan", "ton"]),
            Some(&AnyClue),
        );
        let pattern = Pattern::new(&[Some('T'), None, Some('N')]);
        let ordered: Vec<&str> = lexicon.query(&pattern).map(|e| e.word.as_str()).collect();
        assert_eq!(ordered, vec!["TEN", "TAN", "TON"]);
    }

    #[test]
    fn empty_bucket_yields_no_matches() {
        let lexicon = Lexicon::build(&bank(&[("CAT", "Feline")]), &[], None);
        let pattern = Pattern::new(&[None; 7]);
        assert_eq!(lexicon.count_matches(&pattern), 0);
    }

    #[test]
    fn pattern_matches_fixed_letters_only() {
        let pattern = Pattern::new(&[Some('A'), None, Some('T')]);
        assert!(pattern.matches("ANT"));
        assert!(pattern.matches("ART"));
        assert!(!pattern.matches("BAT"));
        assert!(!pattern.matches("ANTS"));
    }
}
