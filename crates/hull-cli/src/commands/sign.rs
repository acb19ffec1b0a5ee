//! Package signing command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use hull_kernel::crypto::sha256;
use hull_kernel::trust::{
    LEGACY_SIG_FILE_NAME, PlatformAttestation, SIG_FILE_NAME, SignRequest, sign_package,
};

use super::read_secret_key_file;

/// Arguments for `hull sign`.
#[derive(clap::Args, Debug)]
pub struct SignArgs {
    /// Package directory to sign
    pub package: PathBuf,

    /// Developer secret key file (128 hex characters)
    #[arg(short, long)]
    pub key: PathBuf,

    /// JSON manifest file to embed verbatim
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// JSON build-metadata file to embed verbatim
    #[arg(long)]
    pub build: Option<PathBuf>,

    /// Host binary whose hash goes into the document; selects the
    /// current format, which also needs a platform attestation (omit
    /// for a legacy hull.sig)
    #[arg(long, requires_all = ["platforms", "platform_key"])]
    pub binary: Option<PathBuf>,

    /// Trampoline binary whose hash goes into the document
    #[arg(long, requires = "binary")]
    pub trampoline: Option<PathBuf>,

    /// Platforms JSON file for the platform attestation
    #[arg(long, requires_all = ["binary", "platform_key"])]
    pub platforms: Option<PathBuf>,

    /// Platform secret key file (128 hex characters)
    #[arg(long)]
    pub platform_key: Option<PathBuf>,
}

fn hash_file(path: &PathBuf) -> Result<[u8; 32]> {
    let content =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(sha256(&content))
}

fn read_json_file(path: &PathBuf) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// Signs every file under the package directory and writes the
/// signature document beside them.
pub fn run(args: &SignArgs) -> Result<()> {
    if !args.package.is_dir() {
        bail!("{} is not a directory", args.package.display());
    }
    let secret = read_secret_key_file(&args.key)?;

    let binary_hash = args.binary.as_ref().map(hash_file).transpose()?;
    let trampoline_hash = args.trampoline.as_ref().map(hash_file).transpose()?;
    let manifest = args.manifest.as_ref().map(read_json_file).transpose()?;
    let build = args.build.as_ref().map(read_json_file).transpose()?;

    let platforms = args.platforms.as_ref().map(read_json_file).transpose()?;
    let platform_secret = args
        .platform_key
        .as_ref()
        .map(|path| read_secret_key_file(path))
        .transpose()?;
    let platform = match (&platforms, &platform_secret) {
        (Some(platforms), Some(secret)) => Some(PlatformAttestation {
            platforms: platforms.as_str(),
            secret,
        }),
        (None, None) => None,
        _ => bail!("--platforms and --platform-key must be given together"),
    };

    let document = sign_package(&SignRequest {
        root: &args.package,
        secret: &secret,
        binary_hash,
        trampoline_hash,
        build: build.as_deref(),
        manifest: manifest.as_deref(),
        platform,
    })?;

    let name = if binary_hash.is_some() {
        SIG_FILE_NAME
    } else {
        LEGACY_SIG_FILE_NAME
    };
    let out = args.package.join(name);
    std::fs::write(&out, document).with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}
