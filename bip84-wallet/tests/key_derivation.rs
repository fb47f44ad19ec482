//! Tests for BIP-84 key derivation

use bip84_wallet::crypto::keys::bitcoin as segwit;
use bip84_wallet::crypto::keys::{wif, DerivationPath, ExtendedKey};
use bip84_wallet::crypto::mnemonic::mnemonic_to_seed;
use bip84_wallet::{Bip84Account, Network, Wordlist};

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn master() -> ExtendedKey {
    let seed = mnemonic_to_seed(MNEMONIC, None, &Wordlist::english()).unwrap();
    ExtendedKey::master_from_seed(seed.as_bytes()).unwrap()
}

#[test]
fn test_bip84_receive_addresses() {
    let account = Bip84Account::from_mnemonic(MNEMONIC, None, &Wordlist::english(), Network::Mainnet).unwrap();
    let addresses = account.derive_addresses(2, true).unwrap();

    assert_eq!(addresses[0].address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
    assert_eq!(
        addresses[0].public_key,
        "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c"
    );
    assert_eq!(addresses[0].wif, "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d");

    assert_eq!(addresses[1].path, "m/84'/0'/0'/0/1");
    assert_eq!(addresses[1].address, "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g");
    assert_eq!(
        addresses[1].public_key,
        "03e775fd51f0dfb8cd865d9ff1cca2a158cf651fe997fdc9fee9c1d3b5e995ea77"
    );
    assert_eq!(addresses[1].wif, "Kxpf5b8p3qX56DKEe5NqWbNUP9MnqoRFzZwHRtsFqhzuvUJsYZCy");
}

#[test]
fn test_bip84_change_address() {
    let path: DerivationPath = "m/84'/0'/0'/1/0".parse().unwrap();
    let key = master().derive_path(&path).unwrap();

    assert_eq!(
        hex::encode(key.public_key()),
        "03025324888e429ab8e3dbaf1f7802648b9cd01e9b418485c5fa4c1b9b5700e1a6"
    );
    assert_eq!(
        segwit::encode_p2wpkh(key.public_key(), Network::Mainnet).unwrap(),
        "bc1q8c6fshw2dlwun7ekn9qwf37cu2rn755upcp6el"
    );
    assert_eq!(
        wif::encode(key.private_key(), true, Network::Mainnet).unwrap(),
        "KxuoxufJL5csa1Wieb2kp29VNdn92Us8CoaUG3aGtPtcF3AzeXvF"
    );
}

#[test]
fn test_address_decodes_to_key_hash() {
    let account = Bip84Account::from_mnemonic(MNEMONIC, None, &Wordlist::english(), Network::Mainnet).unwrap();
    let derived = account.derive_address(0, true).unwrap();
    let public_key = hex::decode(&derived.public_key).unwrap();

    let hash = segwit::decode_p2wpkh(&derived.address, Network::Mainnet).unwrap();
    assert_eq!(hash, bip84_wallet::crypto::hash::hash160(&public_key));
}

#[test]
fn test_passphrase_changes_addresses() {
    let wordlist = Wordlist::english();
    let plain = Bip84Account::from_mnemonic(MNEMONIC, None, &wordlist, Network::Mainnet).unwrap();
    let salted = Bip84Account::from_mnemonic(MNEMONIC, Some("TREZOR"), &wordlist, Network::Mainnet).unwrap();
    assert_ne!(
        plain.derive_address(0, true).unwrap().address,
        salted.derive_address(0, true).unwrap().address
    );
}

#[test]
fn test_extended_keys_match_bitcoin_crate() {
    use bitcoin::bip32::{DerivationPath as BtcPath, Xpriv, Xpub};
    use bitcoin::secp256k1::Secp256k1;

    let seed = mnemonic_to_seed(MNEMONIC, None, &Wordlist::english()).unwrap();
    let secp = Secp256k1::new();
    let btc_master = Xpriv::new_master(bitcoin::Network::Bitcoin, seed.as_bytes()).unwrap();
    let versions = Network::Mainnet.bip32_versions();

    for path in ["m", "m/84'/0'/0'", "m/84'/0'/0'/0/0", "m/84'/0'/0'/1/7", "m/0/2147483647'/1"] {
        let ours = master().derive_path(&path.parse().unwrap()).unwrap();
        let btc_path: BtcPath = path.parse().unwrap();
        let theirs = btc_master.derive_priv(&secp, &btc_path).unwrap();

        assert_eq!(ours.to_extended_private(versions), theirs.to_string(), "xprv at {}", path);
        assert_eq!(
            ours.to_extended_public(versions),
            Xpub::from_priv(&secp, &theirs).to_string(),
            "xpub at {}",
            path
        );
    }
}

#[test]
fn test_wif_matches_bitcoin_crate() {
    let account = Bip84Account::from_mnemonic(MNEMONIC, None, &Wordlist::english(), Network::Testnet).unwrap();
    for derived in account.derive_addresses(5, true).unwrap() {
        let theirs = bitcoin::PrivateKey::from_wif(&derived.wif).unwrap();
        let ours = wif::decode(&derived.wif).unwrap();
        assert!(theirs.compressed);
        assert_eq!(theirs.inner.secret_bytes(), ours.private_key);
    }
}
