//! Startup verification: the host calls this before loading any
//! application code.

use std::path::Path;

use super::document::SigDocument;
use super::files::FileSource;
use super::verify::verify_document;
use super::{TrustError, LEGACY_SIG_FILE_NAME, SIG_FILE_NAME};
use crate::crypto::PUBLIC_KEY_LEN;

/// Reads a trusted developer public key from a hex text file.
///
/// The file holds 64 hex characters; surrounding whitespace is
/// ignored.
///
/// # Errors
///
/// Returns [`TrustError`] on I/O failure or malformed hex.
pub fn read_public_key_file(path: &Path) -> Result<[u8; PUBLIC_KEY_LEN], TrustError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| TrustError::io(format!("reading {}", path.display()), e))?;
    let trimmed = text.trim();
    let mut key = [0u8; PUBLIC_KEY_LEN];
    if trimmed.len() != PUBLIC_KEY_LEN * 2 {
        return Err(TrustError::InvalidHex { field: "public_key" });
    }
    hex::decode_to_slice(trimmed, &mut key)
        .map_err(|_| TrustError::InvalidHex { field: "public_key" })?;
    Ok(key)
}

fn locate_sig_file(dir: &Path) -> Result<std::path::PathBuf, TrustError> {
    let current = dir.join(SIG_FILE_NAME);
    if current.is_file() {
        return Ok(current);
    }
    let legacy = dir.join(LEGACY_SIG_FILE_NAME);
    if legacy.is_file() {
        tracing::info!(
            dir = %dir.display(),
            "trust: falling back to legacy {LEGACY_SIG_FILE_NAME}"
        );
        return Ok(legacy);
    }
    Err(TrustError::SignatureFileNotFound {
        dir: dir.display().to_string(),
    })
}

/// Verifies the package containing `entry` before any of it runs.
///
/// `entry` may be the package directory itself or the entry-point
/// file inside it. The signature document (`package.sig`, falling
/// back to `hull.sig`) is located beside the entry point, parsed, and
/// fully verified against the trusted developer key. Verification is
/// fail-fast; on error the host must refuse to load the package.
///
/// # Errors
///
/// Returns the first [`TrustError`] encountered in document lookup,
/// parsing, signature verification, or file integrity checking.
pub fn verify_startup(
    entry: &Path,
    app_public_key: &[u8; PUBLIC_KEY_LEN],
) -> Result<(), TrustError> {
    let dir = if entry.is_dir() {
        entry
    } else {
        entry.parent().unwrap_or(Path::new("."))
    };

    let sig_path = locate_sig_file(dir)?;
    tracing::info!(sig = %sig_path.display(), "trust: verifying package");
    let doc = SigDocument::read_from(&sig_path)?;
    verify_document(&doc, app_public_key, &FileSource::Root(dir))?;
    tracing::info!(
        files = doc.file_entries().len(),
        legacy = doc.is_legacy(),
        "trust: package verified"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ed25519_keypair;
    use crate::trust::sign::{sign_package, SignRequest};

    fn signed_package(kp: &crate::crypto::Keypair) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("main.lua"), b"print('hi')").expect("write");
        let text = sign_package(&SignRequest {
            root: dir.path(),
            secret: &kp.secret,
            binary_hash: None,
            trampoline_hash: None,
            build: None,
            manifest: None,
            platform: None,
        })
        .expect("sign");
        std::fs::write(dir.path().join(SIG_FILE_NAME), text).expect("write sig");
        dir
    }

    #[test]
    fn verifies_from_package_directory() {
        let kp = ed25519_keypair();
        let dir = signed_package(&kp);
        verify_startup(dir.path(), &kp.public).expect("verify");
    }

    #[test]
    fn verifies_from_entry_point_file() {
        let kp = ed25519_keypair();
        let dir = signed_package(&kp);
        verify_startup(&dir.path().join("main.lua"), &kp.public).expect("verify");
    }

    #[test]
    fn legacy_file_name_is_accepted() {
        let kp = ed25519_keypair();
        let dir = signed_package(&kp);
        std::fs::rename(
            dir.path().join(SIG_FILE_NAME),
            dir.path().join(LEGACY_SIG_FILE_NAME),
        )
        .expect("rename");
        verify_startup(dir.path(), &kp.public).expect("verify");
    }

    #[test]
    fn current_name_wins_over_legacy() {
        let kp = ed25519_keypair();
        let dir = signed_package(&kp);
        // A bogus legacy file must be ignored while package.sig exists.
        std::fs::write(dir.path().join(LEGACY_SIG_FILE_NAME), b"not json").expect("write");
        verify_startup(dir.path(), &kp.public).expect("verify");
    }

    #[test]
    fn missing_signature_file_fails() {
        let kp = ed25519_keypair();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("main.lua"), b"print('hi')").expect("write");
        assert!(matches!(
            verify_startup(dir.path(), &kp.public),
            Err(TrustError::SignatureFileNotFound { .. })
        ));
    }

    #[test]
    fn tampered_file_fails() {
        let kp = ed25519_keypair();
        let dir = signed_package(&kp);
        std::fs::write(dir.path().join("main.lua"), b"print('evil')").expect("write");
        assert!(matches!(
            verify_startup(dir.path(), &kp.public),
            Err(TrustError::FileHashMismatch { .. })
        ));
    }

    #[test]
    fn public_key_file_round_trips() {
        let kp = ed25519_keypair();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dev.pub");
        std::fs::write(&path, format!("{}\n", hex::encode(kp.public))).expect("write");
        assert_eq!(read_public_key_file(&path).expect("read"), kp.public);
    }

    #[test]
    fn short_public_key_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dev.pub");
        std::fs::write(&path, "abcd").expect("write");
        assert!(matches!(
            read_public_key_file(&path),
            Err(TrustError::InvalidHex { .. })
        ));
    }
}
