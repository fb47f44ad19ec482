//! The 2048-entry mnemonic wordlist
//!
//! A wordlist is loaded once by the caller and then passed by reference to
//! every operation that needs it. It is never mutated after construction.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Number of words in every BIP-39 wordlist
pub const WORDLIST_SIZE: usize = 2048;

/// Bits encoded by one word
pub const BITS_PER_WORD: usize = 11;

/// An immutable, indexed BIP-39 wordlist
#[derive(Debug, Clone)]
pub struct Wordlist {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Wordlist {
    /// The standard English wordlist
    pub fn english() -> Self {
        let words = bip39::Language::English
            .word_list()
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>();
        Self::build(words)
    }

    /// Build a wordlist from exactly 2048 distinct, non-empty words
    ///
    /// Entries are trimmed and NFKD-normalized. An entry that is empty after
    /// trimming is an error, not skipped, so a stray blank line cannot shift
    /// the index of every word after it.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().nfkd().collect::<String>())
            .collect::<Vec<_>>();

        if let Some(position) = words.iter().position(String::is_empty) {
            return Err(Error::Config(format!(
                "wordlist entry {} is empty",
                position + 1
            )));
        }

        if words.len() != WORDLIST_SIZE {
            return Err(Error::Config(format!(
                "wordlist must contain {} words, found {}",
                WORDLIST_SIZE,
                words.len()
            )));
        }

        let list = Self::build(words);
        if list.index.len() != WORDLIST_SIZE {
            return Err(Error::Config("wordlist contains duplicate words".to_string()));
        }
        Ok(list)
    }

    /// Load a newline-separated wordlist file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read wordlist {}: {}", path.display(), e)))?;
        let list = Self::from_words(contents.lines())?;
        debug!(path = %path.display(), "loaded wordlist from file");
        Ok(list)
    }

    fn build(words: Vec<String>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u16))
            .collect();
        Self { words, index }
    }

    /// Index of a word (0..2048), after NFKD normalization
    pub fn index_of(&self, word: &str) -> Option<u16> {
        if let Some(&i) = self.index.get(word) {
            return Some(i);
        }
        let normalized = word.nfkd().collect::<String>();
        self.index.get(&normalized).copied()
    }

    /// Like [`Wordlist::index_of`] but fails with [`Error::UnknownWord`]
    pub fn lookup(&self, word: &str) -> Result<u16> {
        self.index_of(word)
            .ok_or_else(|| Error::UnknownWord(word.to_string()))
    }

    /// Word at an index
    pub fn word(&self, index: u16) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    /// All words in wordlist order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
