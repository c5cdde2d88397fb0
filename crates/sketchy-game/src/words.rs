//! Word sources for the drawer's options and the timeout fallback.

use std::collections::HashSet;
use std::path::Path;

use rand::Rng;

use crate::GameError;

/// Supplies secret words.
pub trait WordSource {
    /// Up to `n` distinct words, in random order.
    ///
    /// Returns fewer than `n` only when the source holds fewer words.
    fn sample(&self, n: usize) -> Vec<String>;

    /// One word chosen uniformly from the whole source.
    fn one(&self) -> String;
}

/// Built-in list used when no word file is configured.
const DEFAULT_WORDS: &[&str] = &[
    "apple", "airplane", "anchor", "backpack", "banana", "bicycle", "bridge", "butterfly",
    "cactus", "camera", "candle", "castle", "cloud", "compass", "crown", "dinosaur",
    "dragon", "drum", "elephant", "envelope", "feather", "fire truck", "fish", "flower",
    "ghost", "giraffe", "guitar", "hammer", "hot air balloon", "house", "ice cream",
    "island", "jellyfish", "kangaroo", "key", "kite", "ladder", "lighthouse", "lion",
    "mermaid", "moon", "mountain", "mushroom", "octopus", "owl", "palm tree", "penguin",
    "piano", "pirate", "pizza", "rainbow", "robot", "rocket", "sandwich", "scissors",
    "snail", "snowman", "spider", "sun", "sword", "telescope", "tent", "tornado",
    "train", "treasure", "turtle", "umbrella", "unicorn", "volcano", "waterfall",
    "whale", "windmill", "wizard", "zebra",
];

/// An in-memory list of distinct words sampled with `rand`.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Builds a list from the given words, dropping blanks and duplicates.
    ///
    /// Order of first appearance is kept.
    pub fn new<I, S>(words: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();

        if words.is_empty() {
            return Err(GameError::EmptyWordList);
        }
        Ok(Self { words })
    }

    /// Parses a JSON array of strings.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let words: Vec<String> = serde_json::from_str(json)?;
        Self::new(words)
    }

    /// Reads a JSON array of strings from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl Default for WordList {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordSource for WordList {
    fn sample(&self, n: usize) -> Vec<String> {
        let amount = n.min(self.words.len());
        rand::seq::index::sample(&mut rand::rng(), self.words.len(), amount)
            .into_iter()
            .map(|i| self.words[i].clone())
            .collect()
    }

    fn one(&self) -> String {
        let i = rand::rng().random_range(0..self.words.len());
        self.words[i].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_rejects_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(WordList::new(empty), Err(GameError::EmptyWordList)));
        assert!(matches!(
            WordList::new(["  ", ""]),
            Err(GameError::EmptyWordList)
        ));
    }

    #[test]
    fn test_word_list_dedupes_and_trims() {
        let list = WordList::new(["cat", " cat ", "dog", "cat"]).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains("cat"));
        assert!(list.contains("dog"));
    }

    #[test]
    fn test_sample_returns_distinct_words() {
        let list = WordList::default();
        for _ in 0..50 {
            let options = list.sample(3);
            assert_eq!(options.len(), 3);
            let distinct: HashSet<_> = options.iter().collect();
            assert_eq!(distinct.len(), 3);
            assert!(options.iter().all(|w| list.contains(w)));
        }
    }

    #[test]
    fn test_sample_caps_at_list_size() {
        let list = WordList::new(["cat", "dog"]).unwrap();
        let mut options = list.sample(5);
        options.sort();
        assert_eq!(options, vec!["cat", "dog"]);
    }

    #[test]
    fn test_one_comes_from_list() {
        let list = WordList::new(["only"]).unwrap();
        assert_eq!(list.one(), "only");
    }

    #[test]
    fn test_from_json() {
        let list = WordList::from_json(r#"["boat", "tree"]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert!(matches!(
            WordList::from_json(r#"{"words": []}"#),
            Err(GameError::WordListParse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WordList::load("/nonexistent/sketchy-words.json").unwrap_err();
        assert!(matches!(err, GameError::WordListIo(_)));
    }

    #[test]
    fn test_default_list_has_no_duplicates() {
        let list = WordList::default();
        let rebuilt = WordList::new(DEFAULT_WORDS.iter().copied()).unwrap();
        assert_eq!(list.len(), rebuilt.len());
    }
}
