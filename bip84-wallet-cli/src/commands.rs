//! Subcommand handlers
//!
//! Each handler returns the text to print so it can be tested without
//! capturing stdout.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use bip84_wallet::crypto::keys::wif;
use bip84_wallet::crypto::mnemonic::{generate_mnemonic, MnemonicStrength};
use bip84_wallet::crypto::{complete_words, Wordlist};
use bip84_wallet::{Bip84Account, DerivedAddress, Network, WalletConfig};

/// Options for `derive`
pub struct DeriveArgs {
    pub mnemonic: String,
    pub passphrase: Option<String>,
    pub count: Option<u32>,
    pub testnet: bool,
    pub uncompressed: bool,
    pub xpub: bool,
    pub json: bool,
    pub wordlist: Option<PathBuf>,
}

fn load_wordlist(path: Option<&PathBuf>) -> Result<Wordlist> {
    match path {
        Some(path) => Wordlist::from_file(path)
            .with_context(|| format!("loading wordlist {}", path.display())),
        None => Ok(Wordlist::english()),
    }
}

/// Environment configuration with command-line flags applied on top
///
/// Variables a flag supersedes are not read at all, and range checks run
/// once the flags are in place.
fn resolve_config<F>(args: &DeriveArgs, lookup: F) -> Result<WalletConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let superseded = |key: &str| match key {
        "BIP84_NETWORK" => args.testnet,
        "BIP84_COMPRESSED" => args.uncompressed,
        "BIP84_ADDRESS_COUNT" => args.count.is_some(),
        "BIP84_WORDLIST" => args.wordlist.is_some(),
        _ => false,
    };
    let mut config = WalletConfig::from_lookup(|key| if superseded(key) { None } else { lookup(key) })
        .context("reading BIP84_* environment")?;

    if let Some(count) = args.count {
        config.count = count;
    }
    if args.testnet {
        config.network = Network::Testnet;
    }
    if args.uncompressed {
        config.compressed = false;
    }
    if args.wordlist.is_some() {
        config.wordlist = args.wordlist.clone();
    }
    config.validate()?;
    Ok(config)
}

pub fn handle_derive(args: DeriveArgs) -> Result<String> {
    let config = resolve_config(&args, |key| std::env::var(key).ok())?;
    let account = Bip84Account::from_config(&args.mnemonic, args.passphrase.as_deref(), &config)
        .context("deriving account from mnemonic")?;
    let addresses = account.derive_addresses(config.count, config.compressed)?;
    info!(count = addresses.len(), network = %config.network, "derivation complete");

    if args.json {
        let mut value = serde_json::json!({ "addresses": addresses });
        if args.xpub {
            value["xpub"] = serde_json::Value::String(account.account_xpub());
        }
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = String::new();
    if args.xpub {
        writeln!(out, "Account xpub: {}", account.account_xpub())?;
        writeln!(out)?;
    }
    out.push_str(&render_addresses(&addresses));
    Ok(out.trim_end().to_string())
}

/// One block per address
pub fn render_addresses(addresses: &[DerivedAddress]) -> String {
    let mut out = String::new();
    for derived in addresses {
        out.push_str(&format!("[{}] {}\n", derived.index, derived.path));
        out.push_str(&format!("  Address:     {}\n", derived.address));
        out.push_str(&format!("  Public key:  {}\n", derived.public_key));
        out.push_str(&format!("  Private key: {}\n\n", derived.wif));
    }
    out
}

pub fn handle_complete(words: &[String], json: bool, wordlist: Option<PathBuf>) -> Result<String> {
    let wordlist = load_wordlist(wordlist.as_ref())?;
    // allow the prefix as a single quoted argument too
    let prefix: Vec<String> = words
        .iter()
        .flat_map(|w| w.split_whitespace())
        .map(str::to_string)
        .collect();

    let completion = complete_words(&prefix, &wordlist)?;
    if json {
        return Ok(serde_json::to_string_pretty(&completion)?);
    }
    if completion.is_empty() {
        return Ok("no valid last word".to_string());
    }

    let mut out = String::new();
    writeln!(out, "Candidate last words ({}):", completion.len())?;
    for (i, word) in completion.candidates.iter().enumerate() {
        writeln!(out, "{:>4}. {}", i + 1, word)?;
    }
    writeln!(out)?;
    writeln!(out, "Valid mnemonics:")?;
    for mnemonic in &completion.mnemonics {
        writeln!(out, "{}", mnemonic)?;
    }
    Ok(out.trim_end().to_string())
}

pub fn handle_wif(key: &str, testnet: bool) -> Result<String> {
    let network = if testnet { Network::Testnet } else { Network::Mainnet };
    let compressed = wif::encode_hex(key, true, network).context("encoding compressed WIF")?;
    let uncompressed = wif::encode_hex(key, false, network).context("encoding uncompressed WIF")?;
    Ok(format!(
        "Network:      {}\nCompressed:   {}\nUncompressed: {}",
        network, compressed, uncompressed
    ))
}

pub fn handle_generate(words: usize, wordlist: Option<PathBuf>) -> Result<String> {
    let Some(strength) = MnemonicStrength::from_word_count(words) else {
        bail!("word count must be 12, 15, 18, 21 or 24, got {}", words);
    };
    let wordlist = load_wordlist(wordlist.as_ref())?;
    Ok(generate_mnemonic(strength, &wordlist)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn derive_args() -> DeriveArgs {
        DeriveArgs {
            mnemonic: MNEMONIC.to_string(),
            passphrase: None,
            count: Some(2),
            testnet: false,
            uncompressed: false,
            xpub: false,
            json: false,
            wordlist: None,
        }
    }

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_flags_override_environment() {
        let args = DeriveArgs {
            count: Some(1),
            testnet: true,
            ..derive_args()
        };
        let config = resolve_config(
            &args,
            lookup_from(&[("BIP84_ADDRESS_COUNT", "0"), ("BIP84_NETWORK", "regtest")]),
        )
        .unwrap();
        assert_eq!(config.count, 1);
        assert_eq!(config.network, Network::Testnet);
    }

    #[test]
    fn test_environment_used_without_flags() {
        let args = DeriveArgs {
            count: None,
            ..derive_args()
        };
        let config = resolve_config(
            &args,
            lookup_from(&[("BIP84_ADDRESS_COUNT", "4"), ("BIP84_COMPRESSED", "false")]),
        )
        .unwrap();
        assert_eq!(config.count, 4);
        assert!(!config.compressed);
        assert_eq!(config.network, Network::Mainnet);

        assert!(resolve_config(&args, lookup_from(&[("BIP84_ADDRESS_COUNT", "0")])).is_err());
        assert!(resolve_config(&args, lookup_from(&[("BIP84_NETWORK", "regtest")])).is_err());
    }

    #[test]
    fn test_derive_text() {
        let out = handle_derive(derive_args()).unwrap();
        assert!(out.contains("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"));
        assert!(out.contains("bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g"));
        assert!(out.contains("KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d"));
        assert!(out.contains("m/84'/0'/0'/0/1"));
    }

    #[test]
    fn test_derive_json() {
        let args = DeriveArgs {
            json: true,
            xpub: true,
            ..derive_args()
        };
        let out = handle_derive(args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["addresses"].as_array().unwrap().len(), 2);
        assert_eq!(value["addresses"][0]["index"], 0);
        assert!(value["xpub"].as_str().unwrap().starts_with("zpub"));
    }

    #[test]
    fn test_derive_rejects_bad_mnemonic() {
        let args = DeriveArgs {
            mnemonic: MNEMONIC.replace("about", "abandon"),
            ..derive_args()
        };
        assert!(handle_derive(args).is_err());
    }

    #[test]
    fn test_complete_accepts_single_argument() {
        let prefix = MNEMONIC.rsplit_once(' ').unwrap().0.to_string();
        let out = handle_complete(&[prefix], false, None).unwrap();
        assert!(out.starts_with("Candidate last words (128):"));
        assert!(out.contains(MNEMONIC));
    }

    #[test]
    fn test_wif_output() {
        let out = handle_wif(
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d",
            false,
        )
        .unwrap();
        assert!(out.contains("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"));
        assert!(handle_wif("not hex", false).is_err());
    }

    #[test]
    fn test_generate() {
        let phrase = handle_generate(12, None).unwrap();
        assert_eq!(phrase.split(' ').count(), 12);
        assert!(handle_generate(13, None).is_err());
    }
}
