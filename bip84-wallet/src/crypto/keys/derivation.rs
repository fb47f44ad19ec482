//! BIP-32 hierarchical deterministic key derivation
//!
//! Every [`ExtendedKey`] is an independent value: deriving a child reads the
//! parent and returns fresh buffers, so keys never alias each other and no
//! parent keeps track of its children.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::config::KeyVersions;
use crate::crypto::{base58, ec};
use crate::crypto::hash::{hash160, hmac_sha512, split_digest};
use crate::error::{Error, Result};

/// Offset added to hardened child indices
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for the master node
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// BIP-84 purpose level
pub const BIP84_PURPOSE: u32 = 84;

/// Serialized extended key length before the checksum
pub const EXTENDED_KEY_LEN: usize = 78;

const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// A single step in a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildNumber {
    /// Mixes the parent public key into derivation
    Normal(u32),
    /// Mixes the parent private key into derivation
    Hardened(u32),
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidInput(format!("child index {} is out of range", index)));
        }
        Ok(Self::Normal(index))
    }

    pub fn hardened(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidInput(format!("hardened index {} is out of range", index)));
        }
        Ok(Self::Hardened(index))
    }

    /// Decode the serialized form, where hardened indices carry the 2^31 offset
    pub fn from_u32(raw: u32) -> Self {
        if raw >= HARDENED_OFFSET {
            Self::Hardened(raw - HARDENED_OFFSET)
        } else {
            Self::Normal(raw)
        }
    }

    /// Serialized form: index, plus 2^31 when hardened
    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Normal(index) => *index,
            Self::Hardened(index) => index + HARDENED_OFFSET,
        }
    }

    /// Index without the hardened offset
    pub fn index(&self) -> u32 {
        match self {
            Self::Normal(index) | Self::Hardened(index) => *index,
        }
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened(_))
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(index) => write!(f, "{}", index),
            Self::Hardened(index) => write!(f, "{}'", index),
        }
    }
}

/// A sequence of child numbers from the master key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// m/84'/coin'/account'
    pub fn bip84_account(coin: u32, account: u32) -> Result<Self> {
        Ok(Self(vec![
            ChildNumber::hardened(BIP84_PURPOSE)?,
            ChildNumber::hardened(coin)?,
            ChildNumber::hardened(account)?,
        ]))
    }

    /// m/84'/0'/0'/0, the external chain whose children are receive addresses
    pub fn bip84_external_chain() -> Self {
        Self(vec![
            ChildNumber::Hardened(BIP84_PURPOSE),
            ChildNumber::Hardened(0),
            ChildNumber::Hardened(0),
            ChildNumber::Normal(0),
        ])
    }

    /// A copy of this path extended by one level
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut levels = self.0.clone();
        levels.push(child);
        Self(levels)
    }

    pub fn as_slice(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(levels: Vec<ChildNumber>) -> Self {
        Self(levels)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for child in &self.0 {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    /// Parse a BIP-32 derivation path such as `m/84'/0'/0'/0/5`
    fn from_str(path: &str) -> Result<Self> {
        let mut components = path.trim().split('/');
        if components.next() != Some("m") {
            return Err(Error::InvalidInput(format!("Invalid derivation path: {}", path)));
        }

        components
            .map(|component| {
                let (digits, hardened) = match component.strip_suffix(|c: char| matches!(c, '\'' | 'h' | 'H')) {
                    Some(digits) => (digits, true),
                    None => (component, false),
                };
                let index = digits.parse::<u32>().map_err(|_| {
                    Error::InvalidInput(format!("Invalid derivation path component: {}", component))
                })?;
                if hardened {
                    ChildNumber::hardened(index)
                } else {
                    ChildNumber::normal(index)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

/// A private key with the chain code and position needed to derive children
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    private_key: [u8; 32],
    public_key: [u8; 33],
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
}

impl ExtendedKey {
    fn from_parts(
        private_key: [u8; 32],
        chain_code: [u8; 32],
        depth: u8,
        parent_fingerprint: [u8; 4],
        child_number: ChildNumber,
    ) -> Result<Self> {
        let public_key = ec::public_key_compressed(&private_key)?;
        Ok(Self {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
        })
    }

    /// Derive the master key from a seed
    pub fn master_from_seed(seed: &[u8]) -> Result<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(Error::InvalidSeed(format!(
                "seed must be {} to {} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let digest = hmac_sha512(MASTER_HMAC_KEY, seed)?;
        let (key, chain_code) = split_digest(&digest);

        if !ec::is_valid_private_key(&key) {
            return Err(Error::InvalidSeed(
                "master key is zero or not below the curve order".to_string(),
            ));
        }

        Self::from_parts(key, chain_code, 0, [0u8; 4], ChildNumber::Normal(0))
    }

    /// Derive a child key from this key
    ///
    /// Fails with [`Error::InvalidChild`] when the derived scalar is unusable;
    /// the caller should move on to the next index.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self> {
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| Error::InvalidInput("maximum derivation depth reached".to_string()))?;

        let mut data = Vec::with_capacity(37);
        if child.is_hardened() {
            data.push(0);
            data.extend_from_slice(&self.private_key);
        } else {
            data.extend_from_slice(&self.public_key);
        }
        data.extend_from_slice(&child.to_u32().to_be_bytes());

        let digest = hmac_sha512(&self.chain_code, &data)?;
        let (tweak, chain_code) = split_digest(&digest);

        // IL >= n and IL + k == 0 (mod n) both make the child unusable
        let private_key = ec::add_scalars(&self.private_key, &tweak).map_err(|_| {
            debug!(child = %child, "derived child scalar out of range");
            Error::InvalidChild { index: child.index() }
        })?;

        Self::from_parts(private_key, chain_code, depth, self.fingerprint(), child)
    }

    /// Apply [`ExtendedKey::derive_child`] for each level of a path
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.as_slice()
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Compressed public key
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn public_key_uncompressed(&self) -> Result<[u8; 65]> {
        ec::public_key_uncompressed(&self.private_key)
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// Hash160 of the compressed public key
    pub fn identifier(&self) -> [u8; 20] {
        hash160(&self.public_key)
    }

    /// First four bytes of the identifier
    pub fn fingerprint(&self) -> [u8; 4] {
        let id = self.identifier();
        [id[0], id[1], id[2], id[3]]
    }

    fn serialize(&self, version: [u8; 4], key: &[u8]) -> String {
        let mut data = Vec::with_capacity(EXTENDED_KEY_LEN);
        data.extend_from_slice(&version);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(key);
        base58::check_encode(&data)
    }

    /// Base58Check private serialization (xprv, zprv, ...)
    pub fn to_extended_private(&self, versions: KeyVersions) -> String {
        let mut key = [0u8; 33];
        key[1..].copy_from_slice(&self.private_key);
        self.serialize(versions.private, &key)
    }

    /// Base58Check public serialization (xpub, zpub, ...)
    pub fn to_extended_public(&self, versions: KeyVersions) -> String {
        self.serialize(versions.public, &self.public_key)
    }

    /// Parse a private serialization produced by [`ExtendedKey::to_extended_private`]
    pub fn from_extended_private(encoded: &str, versions: KeyVersions) -> Result<Self> {
        let data = base58::check_decode(encoded)?;
        if data.len() != EXTENDED_KEY_LEN {
            return Err(Error::EncodingError(format!(
                "extended key must be {} bytes, got {}",
                EXTENDED_KEY_LEN,
                data.len()
            )));
        }
        if data[..4] != versions.private {
            return Err(Error::EncodingError("unexpected extended key version".to_string()));
        }
        if data[45] != 0 {
            return Err(Error::EncodingError("extended key does not hold a private key".to_string()));
        }

        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut raw_child = [0u8; 4];
        raw_child.copy_from_slice(&data[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);
        let mut private_key = [0u8; 32];
        private_key.copy_from_slice(&data[46..78]);

        Self::from_parts(
            private_key,
            chain_code,
            depth,
            parent_fingerprint,
            ChildNumber::from_u32(u32::from_be_bytes(raw_child)),
        )
        .map_err(|_| Error::InvalidKeyFormat("extended key scalar is out of range".to_string()))
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public_key", &hex::encode(self.public_key))
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

/// Derive the master extended key from a seed
pub fn master_from_seed(seed: &[u8]) -> Result<ExtendedKey> {
    ExtendedKey::master_from_seed(seed)
}

/// Derive one child of `parent`
pub fn derive_child(parent: &ExtendedKey, index: u32, hardened: bool) -> Result<ExtendedKey> {
    let child = if hardened {
        ChildNumber::hardened(index)?
    } else {
        ChildNumber::normal(index)?
    };
    parent.derive_child(child)
}

/// Derive along every level of `path`, stopping at the first failure
pub fn derive_path(master: &ExtendedKey, path: &DerivationPath) -> Result<ExtendedKey> {
    master.derive_path(path)
}
