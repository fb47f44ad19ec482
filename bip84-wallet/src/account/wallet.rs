//! BIP-84 account: mnemonic in, receive addresses out

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Network, WalletConfig, MAX_ADDRESS_COUNT};
use crate::crypto::keys::{bitcoin, wif, ChildNumber, DerivationPath, ExtendedKey};
use crate::crypto::mnemonic::mnemonic_to_seed;
use crate::crypto::wordlist::Wordlist;
use crate::error::{Error, Result};

/// BIP-44 coin type for Bitcoin
const COIN_TYPE: u32 = 0;

/// First account
const ACCOUNT: u32 = 0;

/// One derived receive address with its keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAddress {
    /// Child index under m/84'/0'/0'/0
    pub index: u32,
    /// Full derivation path
    pub path: String,
    /// Bech32 P2WPKH address
    pub address: String,
    /// Compressed public key, hex
    pub public_key: String,
    /// Private key in Wallet Import Format
    pub wif: String,
}

/// The first account of a BIP-84 wallet
///
/// Holds the account key (m/84'/0'/0') and its external chain
/// (m/84'/0'/0'/0). The seed and the master key are dropped once these are
/// derived.
#[derive(Debug, Clone)]
pub struct Bip84Account {
    network: Network,
    account: ExtendedKey,
    external: ExtendedKey,
}

impl Bip84Account {
    /// Validate a mnemonic and derive the account keys from it
    pub fn from_mnemonic(
        phrase: &str,
        passphrase: Option<&str>,
        wordlist: &Wordlist,
        network: Network,
    ) -> Result<Self> {
        let seed = mnemonic_to_seed(phrase, passphrase, wordlist)?;
        let master = ExtendedKey::master_from_seed(seed.as_bytes())?;
        Self::from_master(&master, network)
    }

    /// Check `config`, load its wordlist and derive the account on its network
    pub fn from_config(phrase: &str, passphrase: Option<&str>, config: &WalletConfig) -> Result<Self> {
        config.validate()?;
        let wordlist = match &config.wordlist {
            Some(path) => Wordlist::from_file(path)?,
            None => Wordlist::english(),
        };
        Self::from_mnemonic(phrase, passphrase, &wordlist, config.network)
    }

    /// Derive the account keys from an existing master key
    pub fn from_master(master: &ExtendedKey, network: Network) -> Result<Self> {
        let account = master.derive_path(&DerivationPath::bip84_account(COIN_TYPE, ACCOUNT)?)?;
        let external = account.derive_child(ChildNumber::Normal(0))?;
        debug!(network = %network, "derived BIP-84 account keys");
        Ok(Self {
            network,
            account,
            external,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Path of the external chain every receive address hangs off
    pub fn external_path(&self) -> DerivationPath {
        DerivationPath::bip84_external_chain()
    }

    /// Derive the receive address at `index`
    ///
    /// `compressed` only changes the WIF suffix; the address always commits to
    /// the compressed public key.
    pub fn derive_address(&self, index: u32, compressed: bool) -> Result<DerivedAddress> {
        let child = ChildNumber::normal(index)?;
        let key = self.external.derive_child(child)?;

        Ok(DerivedAddress {
            index,
            path: self.external_path().child(child).to_string(),
            address: bitcoin::encode_p2wpkh(key.public_key(), self.network)?,
            public_key: hex::encode(key.public_key()),
            wif: wif::encode(key.private_key(), compressed, self.network)?,
        })
    }

    /// Derive `count` receive addresses in ascending index order
    ///
    /// An index whose child key is invalid is skipped and the next index used,
    /// so every entry carries the index it was actually derived at.
    pub fn derive_addresses(&self, count: u32, compressed: bool) -> Result<Vec<DerivedAddress>> {
        let addresses = collect_addresses(count, |index| self.derive_address(index, compressed))?;
        info!(count = addresses.len(), network = %self.network, "derived addresses");
        Ok(addresses)
    }

    /// Account-level extended public key (zpub, or vpub on testnet)
    pub fn account_xpub(&self) -> String {
        self.account.to_extended_public(self.network.bip84_versions())
    }

    /// Account-level extended private key (zprv, or vprv on testnet)
    pub fn account_xprv(&self) -> String {
        self.account.to_extended_private(self.network.bip84_versions())
    }
}

/// Call `derive` for indices 0, 1, ... until `count` addresses are collected,
/// skipping indices that fail with [`Error::InvalidChild`]
fn collect_addresses<F>(count: u32, mut derive: F) -> Result<Vec<DerivedAddress>>
where
    F: FnMut(u32) -> Result<DerivedAddress>,
{
    if count == 0 || count > MAX_ADDRESS_COUNT {
        return Err(Error::InvalidInput(format!(
            "address count must be between 1 and {}, got {}",
            MAX_ADDRESS_COUNT, count
        )));
    }

    let mut addresses = Vec::with_capacity(count.min(1024) as usize);
    let mut index = 0u32;
    while addresses.len() < count as usize {
        if index >= MAX_ADDRESS_COUNT {
            return Err(Error::InvalidInput("ran out of non-hardened indices".to_string()));
        }
        match derive(index) {
            Ok(derived) => addresses.push(derived),
            Err(Error::InvalidChild { index: skipped }) => {
                warn!(index = skipped, "skipping invalid child key");
            }
            Err(e) => return Err(e),
        }
        index += 1;
    }
    Ok(addresses)
}

/// Derive the addresses described by `config` from a mnemonic
pub fn derive_addresses(
    phrase: &str,
    passphrase: Option<&str>,
    config: &WalletConfig,
) -> Result<Vec<DerivedAddress>> {
    let account = Bip84Account::from_config(phrase, passphrase, config)?;
    account.derive_addresses(config.count, config.compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn account(network: Network) -> Bip84Account {
        Bip84Account::from_mnemonic(ABANDON_ABOUT, None, &Wordlist::english(), network).unwrap()
    }

    #[test]
    fn test_first_receive_address() {
        let derived = account(Network::Mainnet).derive_address(0, true).unwrap();
        assert_eq!(derived.path, "m/84'/0'/0'/0/0");
        assert_eq!(derived.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
        assert_eq!(
            derived.public_key,
            "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c"
        );
        assert_eq!(derived.wif, "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d");
    }

    #[test]
    fn test_derive_addresses_in_order() {
        let addresses = account(Network::Mainnet).derive_addresses(3, true).unwrap();
        assert_eq!(addresses.len(), 3);
        assert_eq!(
            addresses.iter().map(|a| a.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(addresses[1].address, "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g");
    }

    #[test]
    fn test_uncompressed_only_changes_wif() {
        let account = account(Network::Mainnet);
        let compressed = account.derive_address(0, true).unwrap();
        let uncompressed = account.derive_address(0, false).unwrap();
        assert_eq!(compressed.address, uncompressed.address);
        assert_eq!(compressed.public_key, uncompressed.public_key);
        assert!(uncompressed.wif.starts_with('5'));
        assert_eq!(
            wif::decode(&compressed.wif).unwrap().private_key,
            wif::decode(&uncompressed.wif).unwrap().private_key
        );
    }

    #[test]
    fn test_testnet_prefixes() {
        let account = account(Network::Testnet);
        let derived = account.derive_address(0, true).unwrap();
        assert!(derived.address.starts_with("tb1q"));
        assert!(derived.wif.starts_with('c'));
        assert!(account.account_xpub().starts_with("vpub"));
        assert!(account.account_xprv().starts_with("vprv"));
    }

    #[test]
    fn test_account_extended_keys() {
        let account = account(Network::Mainnet);
        assert!(account.account_xpub().starts_with("zpub"));
        assert!(account.account_xprv().starts_with("zprv"));
    }

    #[test]
    fn test_rejects_invalid_mnemonic_and_counts() {
        let bad = ABANDON_ABOUT.replace("about", "abandon");
        assert!(matches!(
            Bip84Account::from_mnemonic(&bad, None, &Wordlist::english(), Network::Mainnet),
            Err(Error::InvalidMnemonic(_))
        ));

        let account = account(Network::Mainnet);
        assert!(account.derive_addresses(0, true).is_err());
        assert!(account.derive_address(MAX_ADDRESS_COUNT, true).is_err());
    }

    fn placeholder(index: u32) -> DerivedAddress {
        DerivedAddress {
            index,
            path: format!("m/84'/0'/0'/0/{}", index),
            address: String::new(),
            public_key: String::new(),
            wif: String::new(),
        }
    }

    #[test]
    fn test_invalid_child_is_skipped() {
        let addresses = collect_addresses(3, |index| {
            if index == 1 {
                Err(Error::InvalidChild { index })
            } else {
                Ok(placeholder(index))
            }
        })
        .unwrap();

        assert_eq!(addresses.len(), 3);
        assert_eq!(
            addresses.iter().map(|a| a.index).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }

    #[test]
    fn test_other_errors_stop_collection() {
        let result = collect_addresses(3, |index| {
            if index == 2 {
                Err(Error::EncodingError("bad program".to_string()))
            } else {
                Ok(placeholder(index))
            }
        });
        assert_eq!(result, Err(Error::EncodingError("bad program".to_string())));
    }

    #[test]
    fn test_derive_addresses_from_config() {
        let config = WalletConfig {
            count: 2,
            ..WalletConfig::default()
        };
        let addresses = derive_addresses(ABANDON_ABOUT, None, &config).unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");

        let serialized = serde_json::to_value(&addresses[0]).unwrap();
        assert_eq!(serialized["index"], 0);
        assert_eq!(serialized["path"], "m/84'/0'/0'/0/0");
    }
}
