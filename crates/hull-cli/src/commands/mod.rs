//! CLI command implementations.

pub mod keygen;
pub mod sign;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result, bail};
use hull_kernel::crypto::SECRET_KEY_LEN;

/// Reads a 64-byte hex-encoded secret key file.
pub(crate) fn read_secret_key_file(path: &Path) -> Result<[u8; SECRET_KEY_LEN]> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading secret key {}", path.display()))?;
    let trimmed = text.trim();
    let mut key = [0u8; SECRET_KEY_LEN];
    if trimmed.len() != SECRET_KEY_LEN * 2 {
        bail!("secret key file {} must hold 128 hex characters", path.display());
    }
    hex::decode_to_slice(trimmed, &mut key)
        .with_context(|| format!("secret key {} is not valid hex", path.display()))?;
    Ok(key)
}
