//! BIP84 Wallet CLI
//!
//! Derives native SegWit addresses from a mnemonic, recovers a missing last
//! word, converts raw keys to WIF and generates new mnemonics. Results go to
//! stdout; logs go to stderr.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bip84-wallet")]
#[command(about = "BIP-84 native SegWit address derivation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Newline-separated 2048-word list to use instead of English
    #[arg(long, global = true, env = "BIP84_WORDLIST")]
    wordlist: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive receive addresses m/84'/0'/0'/0/i
    Derive {
        /// Mnemonic phrase
        #[arg(short, long, env = "BIP84_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
        /// Optional passphrase
        #[arg(short, long, env = "BIP84_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Number of addresses
        #[arg(short, long)]
        count: Option<u32>,
        /// Use testnet prefixes and version bytes
        #[arg(long)]
        testnet: bool,
        /// Emit WIF without the compressed-key suffix
        #[arg(long)]
        uncompressed: bool,
        /// Print the account zpub
        #[arg(long)]
        xpub: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List every word that completes a mnemonic missing its last word
    Complete {
        /// The known words (11, 14, 17, 20 or 23)
        #[arg(short, long, num_args = 1..)]
        words: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Encode a raw hex private key as WIF
    Wif {
        /// 32-byte private key in hex
        #[arg(short, long)]
        key: String,
        /// Use the testnet version byte
        #[arg(long)]
        testnet: bool,
    },
    /// Generate a new random mnemonic
    Generate {
        /// Word count: 12, 15, 18, 21 or 24
        #[arg(short, long, default_value_t = 24)]
        words: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!(version = bip84_wallet::VERSION, "starting");

    let wordlist = cli.wordlist;
    let output = match cli.command {
        Commands::Derive {
            mnemonic,
            passphrase,
            count,
            testnet,
            uncompressed,
            xpub,
            json,
        } => commands::handle_derive(commands::DeriveArgs {
            mnemonic,
            passphrase,
            count,
            testnet,
            uncompressed,
            xpub,
            json,
            wordlist,
        })?,
        Commands::Complete { words, json } => commands::handle_complete(&words, json, wordlist)?,
        Commands::Wif { key, testnet } => commands::handle_wif(&key, testnet)?,
        Commands::Generate { words } => commands::handle_generate(words, wordlist)?,
    };

    println!("{}", output);
    Ok(())
}
