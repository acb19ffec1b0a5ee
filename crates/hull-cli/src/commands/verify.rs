//! Package verification command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use hull_kernel::trust::{read_public_key_file, verify_startup};

/// Arguments for `hull verify`.
#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Package directory or entry-point file inside it
    pub package: PathBuf,

    /// Trusted developer public key file (64 hex characters)
    #[arg(short, long)]
    pub pubkey: PathBuf,
}

/// Runs the same verification the host runs at startup.
pub fn run(args: &VerifyArgs) -> Result<()> {
    let key = read_public_key_file(&args.pubkey)
        .with_context(|| format!("loading public key {}", args.pubkey.display()))?;
    verify_startup(&args.package, &key).context("package verification failed")?;
    println!("package verified");
    Ok(())
}
