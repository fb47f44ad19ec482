//! Last-word recovery for mnemonics missing their final word
//!
//! The final word of a mnemonic mixes its last entropy bits with the checksum,
//! so only some wordlist entries complete a prefix into a valid phrase. The
//! whole wordlist is scanned; there is no shortcut that predicts the match set.

use serde::Serialize;
use tracing::{debug, info};

use crate::crypto::mnemonic::{split_phrase, validate_indices, word_indices, MnemonicStrength};
use crate::crypto::wordlist::Wordlist;
use crate::error::{Error, Result};

/// Words that complete a prefix, and the full phrases they produce
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Candidate final words, in wordlist order
    pub candidates: Vec<String>,
    /// `prefix + candidate` for each candidate, same order
    pub mnemonics: Vec<String>,
}

impl Completion {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Find every final word that turns `prefix` into a checksum-valid mnemonic
///
/// `prefix` must be one word short of a legal mnemonic length (11, 14, 17,
/// 20 or 23 words).
pub fn complete_words<S: AsRef<str>>(prefix: &[S], wordlist: &Wordlist) -> Result<Completion> {
    let target = prefix.len() + 1;
    if MnemonicStrength::from_word_count(target).is_none() {
        return Err(Error::InvalidMnemonic(format!(
            "a completable prefix has 11, 14, 17, 20 or 23 words, got {}",
            prefix.len()
        )));
    }

    let mut indices = word_indices(prefix, wordlist)?;
    indices.push(0);

    let base = prefix.iter().map(|w| w.as_ref()).collect::<Vec<_>>().join(" ");
    let mut completion = Completion::default();

    for (i, word) in wordlist.words().enumerate() {
        indices[target - 1] = i as u16;
        if validate_indices(&indices) {
            completion.candidates.push(word.to_string());
            completion.mnemonics.push(format!("{} {}", base, word));
        }
    }

    debug!(prefix_words = prefix.len(), scanned = wordlist.len(), "completion scan finished");
    info!(candidates = completion.len(), "found candidate final words");
    Ok(completion)
}

/// Phrase form of [`complete_words`]
pub fn complete_mnemonic(prefix: &str, wordlist: &Wordlist) -> Result<Completion> {
    complete_words(&split_phrase(prefix), wordlist)
}
