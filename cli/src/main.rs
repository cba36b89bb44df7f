//! aesforge CLI
//!
//! File encryption with the hardware-accelerated AES engines.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cbc_files, open_files, print_features, seal_files, KeyArg};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser)]
#[command(name = "aesforge")]
#[command(about = "AES-GCM / AES-CBC using VAES, AES-NI or portable code paths", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine selection and capability probing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show detected CPU features and the code path chosen per mode
    Features,

    /// Encrypt files with AES-GCM (writes FILE.gcm: nonce || ciphertext || tag)
    Seal {
        #[command(flatten)]
        key: KeyArg,

        /// Associated data bound to every file
        #[arg(long, default_value = "")]
        aad: String,

        /// Tag length in bits (32..=128, multiple of 8)
        #[arg(long, default_value_t = 128)]
        tag_bits: u32,

        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Verify and decrypt FILE.gcm files produced by `seal`
    Open {
        #[command(flatten)]
        key: KeyArg,

        /// Associated data used at seal time
        #[arg(long, default_value = "")]
        aad: String,

        /// Tag length in bits used at seal time
        #[arg(long, default_value_t = 128)]
        tag_bits: u32,

        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// AES-CBC over block-aligned files (no padding)
    Cbc {
        #[command(flatten)]
        key: KeyArg,

        /// 16-byte IV (hex)
        #[arg(long)]
        iv: String,

        /// Decrypt instead of encrypt
        #[arg(short, long)]
        decrypt: bool,

        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Features => print_features(),
        Commands::Seal {
            key,
            aad,
            tag_bits,
            files,
        } => seal_files(files, &key.decode()?, aad.as_bytes(), *tag_bits)?,
        Commands::Open {
            key,
            aad,
            tag_bits,
            files,
        } => open_files(files, &key.decode()?, aad.as_bytes(), *tag_bits)?,
        Commands::Cbc {
            key,
            iv,
            decrypt,
            files,
        } => cbc_files(files, &key.decode()?, iv, *decrypt)?,
    }

    Ok(())
}
