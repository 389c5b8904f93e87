//! ROHO (RH) block inspector
//!
//! Decodes a block in either wire format, checks its signature and
//! transactions root and prints it as JSON.

use clap::Parser;
use rh_blocks::{Block, Scheme};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Inspect an RH block file
#[derive(Parser, Debug)]
#[command(name = "rh-block-inspect")]
#[command(about = "Decode an RH block, verify it and print it as JSON")]
struct Args {
    /// Block file, binary (versions 1-4) or protobuf (version 5)
    path: PathBuf,

    /// Chain scheme character
    #[arg(long, default_value = "R", value_parser = parse_scheme)]
    scheme: Scheme,

    /// The file holds hex text instead of raw bytes
    #[arg(long)]
    hex: bool,
}

fn parse_scheme(value: &str) -> Result<Scheme, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii_graphic() => Ok(*byte),
        _ => Err(format!("scheme must be a single character, got {:?}", value)),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "rh_blocks=info,rh_block_inspect=info".to_string()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let raw = fs::read(&args.path)?;
    let data = if args.hex {
        hex::decode(String::from_utf8(raw)?.trim())?
    } else {
        raw
    };

    let block = Block::unmarshal(&data, args.scheme)?;
    info!(
        id = %block.id(),
        version = %block.version(),
        transactions = block.transactions.count(),
        size = data.len(),
        "decoded block"
    );

    if block.verify_signature(args.scheme)? {
        info!("signature valid");
    } else {
        warn!("signature INVALID");
    }
    if block.verify_transactions_root(args.scheme)? {
        info!("transactions root valid");
    } else {
        warn!("transactions root INVALID");
    }

    println!("{}", serde_json::to_string_pretty(&block)?);
    Ok(())
}
