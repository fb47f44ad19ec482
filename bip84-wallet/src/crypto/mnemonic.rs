//! Mnemonic phrase validation, generation and seed derivation
//!
//! A mnemonic of `n` words carries `11 * n` bits: `ENT = 32 * n / 3` bits of
//! entropy followed by `CS = n / 3` checksum bits, where the checksum is the
//! leading `CS` bits of `SHA-256(entropy)`.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::crypto::hash::sha256;
use crate::crypto::wordlist::{Wordlist, BITS_PER_WORD};
use crate::error::{Error, Result};

/// PBKDF2 rounds for seed stretching
pub const SEED_ROUNDS: u32 = 2048;

/// Length of a derived seed in bytes
pub const SEED_LEN: usize = 64;

const SALT_PREFIX: &str = "mnemonic";

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    Words12,
    /// 15 words (160 bits)
    Words15,
    /// 18 words (192 bits)
    Words18,
    /// 21 words (224 bits)
    Words21,
    /// 24 words (256 bits)
    Words24,
}

impl MnemonicStrength {
    pub const ALL: [MnemonicStrength; 5] = [
        Self::Words12,
        Self::Words15,
        Self::Words18,
        Self::Words21,
        Self::Words24,
    ];

    /// Strength for a word count, if the count is legal
    pub fn from_word_count(count: usize) -> Option<Self> {
        match count {
            12 => Some(Self::Words12),
            15 => Some(Self::Words15),
            18 => Some(Self::Words18),
            21 => Some(Self::Words21),
            24 => Some(Self::Words24),
            _ => None,
        }
    }

    /// Strength for an entropy length in bytes, if the length is legal
    pub fn from_entropy_len(len: usize) -> Option<Self> {
        Self::from_word_count(len * 8 * 3 / 32).filter(|s| s.entropy_bytes() == len)
    }

    pub fn word_count(&self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words15 => 15,
            Self::Words18 => 18,
            Self::Words21 => 21,
            Self::Words24 => 24,
        }
    }

    /// ENT in bits
    pub fn entropy_bits(&self) -> usize {
        self.word_count() * 32 / 3
    }

    /// Get entropy length in bytes
    pub fn entropy_bytes(&self) -> usize {
        self.entropy_bits() / 8
    }

    /// CS in bits
    pub fn checksum_bits(&self) -> usize {
        self.word_count() / 3
    }
}

/// A 512-bit seed derived from a mnemonic and passphrase
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; SEED_LEN]> for Seed {
    fn from(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// NFKD-normalize a phrase and split it on any whitespace
pub fn split_phrase(phrase: &str) -> Vec<String> {
    phrase
        .nfkd()
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Join words with single spaces after NFKD normalization
fn normalize_phrase<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref().nfkd().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn indices_to_bits(indices: &[u16]) -> Vec<u8> {
    let total_bits = indices.len() * BITS_PER_WORD;
    let mut bytes = vec![0u8; (total_bits + 7) / 8];
    for (i, &index) in indices.iter().enumerate() {
        for bit in 0..BITS_PER_WORD {
            if index & (1 << (BITS_PER_WORD - 1 - bit)) != 0 {
                let pos = i * BITS_PER_WORD + bit;
                bytes[pos / 8] |= 0x80 >> (pos % 8);
            }
        }
    }
    bytes
}

fn bits_to_indices(stream: &[u8], word_count: usize) -> Vec<u16> {
    (0..word_count)
        .map(|w| {
            (0..BITS_PER_WORD).fold(0u16, |acc, bit| {
                let pos = w * BITS_PER_WORD + bit;
                let set = stream[pos / 8] & (0x80 >> (pos % 8)) != 0;
                (acc << 1) | set as u16
            })
        })
        .collect()
}

/// Leading `bits` bits of SHA-256(entropy), right-aligned
fn checksum(entropy: &[u8], bits: usize) -> u8 {
    sha256(entropy)[0] >> (8 - bits)
}

/// Look up every word, failing with [`Error::UnknownWord`] on the first miss
pub fn word_indices<S: AsRef<str>>(words: &[S], wordlist: &Wordlist) -> Result<Vec<u16>> {
    words.iter().map(|w| wordlist.lookup(w.as_ref())).collect()
}

/// Split word indices into entropy bytes and the embedded checksum value
fn split_entropy(indices: &[u16], strength: MnemonicStrength) -> (Vec<u8>, u8) {
    let bits = indices_to_bits(indices);
    let ent_bytes = strength.entropy_bytes();
    let embedded = bits[ent_bytes] >> (8 - strength.checksum_bits());
    (bits[..ent_bytes].to_vec(), embedded)
}

/// Checksum predicate over already-resolved word indices
pub fn validate_indices(indices: &[u16]) -> bool {
    let Some(strength) = MnemonicStrength::from_word_count(indices.len()) else {
        return false;
    };
    let (entropy, embedded) = split_entropy(indices, strength);
    embedded == checksum(&entropy, strength.checksum_bits())
}

/// Validate a word sequence against the wordlist and its checksum
///
/// Returns `Ok(false)` for an illegal length or a checksum mismatch and
/// [`Error::UnknownWord`] when a word is not in the wordlist.
pub fn validate_words<S: AsRef<str>>(words: &[S], wordlist: &Wordlist) -> Result<bool> {
    let indices = word_indices(words, wordlist)?;
    Ok(validate_indices(&indices))
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str, wordlist: &Wordlist) -> Result<bool> {
    validate_words(&split_phrase(phrase), wordlist)
}

/// Like [`validate_words`] but turns a failed check into [`Error::InvalidMnemonic`]
pub fn ensure_valid<S: AsRef<str>>(words: &[S], wordlist: &Wordlist) -> Result<()> {
    if MnemonicStrength::from_word_count(words.len()).is_none() {
        return Err(Error::InvalidMnemonic(format!(
            "expected 12, 15, 18, 21 or 24 words, got {}",
            words.len()
        )));
    }
    if !validate_words(words, wordlist)? {
        return Err(Error::InvalidMnemonic("checksum mismatch".to_string()));
    }
    Ok(())
}

/// Recover the entropy encoded by a valid mnemonic
pub fn mnemonic_to_entropy(phrase: &str, wordlist: &Wordlist) -> Result<Vec<u8>> {
    let words = split_phrase(phrase);
    ensure_valid(&words, wordlist)?;
    let indices = word_indices(&words, wordlist)?;
    let strength = MnemonicStrength::from_word_count(indices.len())
        .ok_or_else(|| Error::InvalidMnemonic("illegal word count".to_string()))?;
    let (entropy, _) = split_entropy(&indices, strength);
    Ok(entropy)
}

/// Encode entropy (16, 20, 24, 28 or 32 bytes) as a mnemonic phrase
pub fn entropy_to_mnemonic(entropy: &[u8], wordlist: &Wordlist) -> Result<String> {
    let strength = MnemonicStrength::from_entropy_len(entropy.len()).ok_or_else(|| {
        Error::InvalidInput(format!("entropy must be 16-32 bytes in steps of 4, got {}", entropy.len()))
    })?;

    let mut stream = Vec::with_capacity(entropy.len() + 1);
    stream.extend_from_slice(entropy);
    stream.push(sha256(entropy)[0]);

    let words = bits_to_indices(&stream, strength.word_count())
        .into_iter()
        .map(|i| {
            wordlist
                .word(i)
                .ok_or_else(|| Error::InvalidInput(format!("word index {} out of range", i)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(words.join(" "))
}

/// Generate a new random mnemonic phrase with the specified strength
pub fn generate_mnemonic(strength: MnemonicStrength, wordlist: &Wordlist) -> Result<String> {
    let mut entropy = vec![0u8; strength.entropy_bytes()];
    OsRng.fill_bytes(&mut entropy);
    entropy_to_mnemonic(&entropy, wordlist)
}

/// Stretch a phrase into a seed without checking it
///
/// Any word sequence can be stretched; callers that need a wallet seed should
/// use [`mnemonic_to_seed`], which validates first.
pub fn stretch_phrase(phrase: &str, passphrase: &str) -> Seed {
    let password = normalize_phrase(&split_phrase(phrase));
    let salt = format!("{}{}", SALT_PREFIX, passphrase.nfkd().collect::<String>());

    let mut seed = [0u8; SEED_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), SEED_ROUNDS, &mut seed);
    Seed(seed)
}

/// Generate a seed from a mnemonic phrase and optional passphrase
///
/// Fails with [`Error::InvalidMnemonic`] or [`Error::UnknownWord`] before any
/// stretching happens if the phrase does not validate.
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>, wordlist: &Wordlist) -> Result<Seed> {
    let words = split_phrase(phrase);
    ensure_valid(&words, wordlist)?;
    debug!(words = words.len(), "mnemonic validated, deriving seed");
    Ok(stretch_phrase(&words.join(" "), passphrase.unwrap_or("")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_strength_table() {
        let table: Vec<_> = MnemonicStrength::ALL
            .iter()
            .map(|s| (s.word_count(), s.entropy_bits(), s.checksum_bits()))
            .collect();
        assert_eq!(
            table,
            vec![(12, 128, 4), (15, 160, 5), (18, 192, 6), (21, 224, 7), (24, 256, 8)]
        );
        assert_eq!(MnemonicStrength::from_entropy_len(32), Some(MnemonicStrength::Words24));
        assert_eq!(MnemonicStrength::from_entropy_len(17), None);
        assert_eq!(MnemonicStrength::from_word_count(13), None);
    }

    #[test]
    fn test_validate_mnemonic() {
        let wordlist = Wordlist::english();
        assert!(validate_mnemonic(ABANDON_ABOUT, &wordlist).unwrap());

        let wrong_checksum = ABANDON_ABOUT.replace("about", "abandon");
        assert!(!validate_mnemonic(&wrong_checksum, &wordlist).unwrap());

        let eleven = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        assert!(!validate_mnemonic(eleven, &wordlist).unwrap());
    }

    #[test]
    fn test_validate_unknown_word() {
        let wordlist = Wordlist::english();
        let phrase = ABANDON_ABOUT.replace("about", "aboutt");
        assert_eq!(
            validate_mnemonic(&phrase, &wordlist),
            Err(Error::UnknownWord("aboutt".to_string()))
        );
    }

    #[test]
    fn test_entropy_roundtrip_vectors() {
        let wordlist = Wordlist::english();
        assert_eq!(entropy_to_mnemonic(&[0u8; 16], &wordlist).unwrap(), ABANDON_ABOUT);
        assert_eq!(
            entropy_to_mnemonic(&[0x7f; 16], &wordlist).unwrap(),
            "legal winner thank year wave sausage worth useful legal winner thank yellow"
        );
        assert_eq!(
            entropy_to_mnemonic(&[0xff; 32], &wordlist).unwrap(),
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo vote"
        );
        assert_eq!(mnemonic_to_entropy(ABANDON_ABOUT, &wordlist).unwrap(), vec![0u8; 16]);
    }

    #[test]
    fn test_entropy_bad_length() {
        let wordlist = Wordlist::english();
        assert!(matches!(entropy_to_mnemonic(&[0u8; 15], &wordlist), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_generate_mnemonic() {
        let wordlist = Wordlist::english();
        for strength in MnemonicStrength::ALL {
            let mnemonic = generate_mnemonic(strength, &wordlist).unwrap();
            assert_eq!(mnemonic.split_whitespace().count(), strength.word_count());
            assert!(validate_mnemonic(&mnemonic, &wordlist).unwrap());
        }
    }

    #[test]
    fn test_mnemonic_to_seed() {
        let wordlist = Wordlist::english();
        let seed = mnemonic_to_seed(ABANDON_ABOUT, None, &wordlist).unwrap();
        assert_eq!(
            seed.to_hex(),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );

        let trezor = mnemonic_to_seed(ABANDON_ABOUT, Some("TREZOR"), &wordlist).unwrap();
        assert_eq!(
            trezor.to_hex(),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_mnemonic_to_seed_rejects_invalid() {
        let wordlist = Wordlist::english();
        let bad = ABANDON_ABOUT.replace("about", "abandon");
        assert!(matches!(mnemonic_to_seed(&bad, None, &wordlist), Err(Error::InvalidMnemonic(_))));
        assert!(matches!(mnemonic_to_seed("abandon", None, &wordlist), Err(Error::InvalidMnemonic(_))));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let messy = "  abandon   abandon abandon\tabandon\nabandon abandon abandon abandon abandon abandon abandon about  ";
        assert_eq!(stretch_phrase(messy, ""), stretch_phrase(ABANDON_ABOUT, ""));
    }

    #[test]
    fn test_seed_debug_is_redacted() {
        let seed = stretch_phrase(ABANDON_ABOUT, "");
        assert_eq!(format!("{:?}", seed), "Seed(..)");
    }
}
