//! hull - package signing and verification tool.
//!
//! Developer-side companion to the kernel's startup verifier:
//! generates signing keys, signs package directories, and checks
//! signed packages the same way the host does at startup.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// hull - package signing and verification tool
#[derive(Parser, Debug)]
#[command(name = "hull")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a developer signing keypair
    Keygen {
        /// Output path prefix; writes <prefix>.key and <prefix>.pub
        #[arg(short, long, default_value = "hull")]
        out: PathBuf,
    },

    /// Sign a package directory
    Sign(commands::sign::SignArgs),

    /// Verify a signed package against a trusted public key
    Verify(commands::verify::VerifyArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Keygen { out } => commands::keygen::run(&out),
        Commands::Sign(args) => commands::sign::run(&args),
        Commands::Verify(args) => commands::verify::run(&args),
    }
}
