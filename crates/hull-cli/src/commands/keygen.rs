//! Keypair generation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hull_kernel::crypto::ed25519_keypair;

/// Generates an Ed25519 keypair and writes `<prefix>.key` (secret)
/// and `<prefix>.pub` (public) as hex text files.
pub fn run(prefix: &Path) -> Result<()> {
    let key_path = prefix.with_extension("key");
    let pub_path = prefix.with_extension("pub");
    if key_path.exists() || pub_path.exists() {
        bail!(
            "refusing to overwrite existing {} or {}",
            key_path.display(),
            pub_path.display()
        );
    }

    let kp = ed25519_keypair();

    std::fs::write(&pub_path, format!("{}\n", hex::encode(kp.public)))
        .with_context(|| format!("writing {}", pub_path.display()))?;
    write_secret(&key_path, &format!("{}\n", hex::encode(kp.secret)))?;

    println!("public key: {}", hex::encode(kp.public));
    println!("secret key written to {}", key_path.display());
    Ok(())
}

#[cfg(unix)]
fn write_secret(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(not(unix))]
fn write_secret(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_both_key_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("dev");
        run(&prefix).expect("keygen");

        let public = std::fs::read_to_string(prefix.with_extension("pub")).expect("pub");
        let secret = std::fs::read_to_string(prefix.with_extension("key")).expect("key");
        assert_eq!(public.trim().len(), 64);
        assert_eq!(secret.trim().len(), 128);
        // Secret layout is seed followed by public key.
        assert!(secret.trim().ends_with(public.trim()));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("dev");
        run(&prefix).expect("keygen");
        assert!(run(&prefix).is_err());
    }
}
