//! Package signing.
//!
//! The signer emits the document with its keys in the same fixed
//! alphabetical order the verifier reconstructs, so the bytes the
//! verifier splices back together are identical to the bytes that
//! were signed.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use super::files::relative_name;
use super::{TrustError, LEGACY_SIG_FILE_NAME, SIG_FILE_NAME};
use crate::crypto::{ed25519_sign, sha256, SECRET_KEY_LEN};

/// Platform-layer signing inputs.
#[derive(Clone, Copy)]
pub struct PlatformAttestation<'a> {
    /// Raw JSON text of the `platforms` object; signed verbatim.
    pub platforms: &'a str,
    /// Platform signing key.
    pub secret: &'a [u8; SECRET_KEY_LEN],
}

/// Inputs for signing an on-disk package.
pub struct SignRequest<'a> {
    /// Package root; every regular file below it is declared.
    pub root: &'a Path,
    /// Developer signing key.
    pub secret: &'a [u8; SECRET_KEY_LEN],
    /// Host-binary hash; its presence selects the current format.
    pub binary_hash: Option<[u8; 32]>,
    /// Trampoline hash (current format).
    pub trampoline_hash: Option<[u8; 32]>,
    /// Raw JSON `build` metadata object, if any.
    pub build: Option<&'a str>,
    /// Raw JSON `manifest` object, if any.
    pub manifest: Option<&'a str>,
    /// Platform attestation to embed (current format).
    pub platform: Option<PlatformAttestation<'a>>,
}

fn hash_package_files(root: &Path) -> Result<BTreeMap<String, String>, TrustError> {
    let mut hashes = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| TrustError::io(format!("walking {}", root.display()), e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = relative_name(root, entry.path()) else {
            return Err(TrustError::InvalidFileName {
                name: entry.path().display().to_string(),
            });
        };
        if name == SIG_FILE_NAME || name == LEGACY_SIG_FILE_NAME {
            continue;
        }
        let content = std::fs::read(entry.path())
            .map_err(|e| TrustError::io(format!("reading {}", entry.path().display()), e))?;
        hashes.insert(name, hex::encode(sha256(&content)));
    }
    Ok(hashes)
}

fn sign_hex(msg: &[u8], secret: &[u8; SECRET_KEY_LEN]) -> Result<String, TrustError> {
    let sig = ed25519_sign(msg, secret).map_err(|_| TrustError::InvalidSigningKey)?;
    Ok(hex::encode(sig))
}

/// Signs every file under `req.root` and returns the signature
/// document as JSON text, ready to write as `package.sig` (or
/// `hull.sig` for the legacy format).
///
/// A current-format request (`binary_hash` set) must carry a platform
/// attestation: the verifier requires the platform section on every
/// non-legacy document, so emitting one without it would produce a
/// document nothing can ever verify.
///
/// # Errors
///
/// Returns [`TrustError`] on I/O failure, a non-UTF-8 file name, a
/// malformed signing key, or a current-format request without a
/// platform attestation.
pub fn sign_package(req: &SignRequest<'_>) -> Result<String, TrustError> {
    if req.binary_hash.is_some() && req.platform.is_none() {
        return Err(TrustError::MissingPlatformSection);
    }
    let hashes = hash_package_files(req.root)?;
    let files_json = serde_json::to_string(&hashes)?;
    let manifest = req.manifest.unwrap_or("null");

    if req.binary_hash.is_none() {
        let payload = format!("{{\"files\":{files_json},\"manifest\":{manifest}}}");
        let signature = sign_hex(payload.as_bytes(), req.secret)?;
        let public = hex::encode(&req.secret[32..]);

        let mut doc = String::from("{");
        doc.push_str(&format!("\"files\":{files_json},"));
        if let Some(manifest) = req.manifest {
            doc.push_str(&format!("\"manifest\":{manifest},"));
        }
        doc.push_str(&format!(
            "\"public_key\":\"{public}\",\"signature\":\"{signature}\",\"version\":1}}"
        ));
        return Ok(doc);
    }

    let platform_json = req
        .platform
        .as_ref()
        .map(|attestation| -> Result<String, TrustError> {
            let signature = sign_hex(attestation.platforms.as_bytes(), attestation.secret)?;
            let public = hex::encode(&attestation.secret[32..]);
            Ok(format!(
                "{{\"platforms\":{platforms},\"public_key\":\"{public}\",\"signature\":\"{signature}\"}}",
                platforms = attestation.platforms,
            ))
        })
        .transpose()?
        .unwrap_or_else(|| "null".to_string());

    let binary_hash = req
        .binary_hash
        .map_or_else(|| "null".to_string(), |h| format!("\"{}\"", hex::encode(h)));
    let trampoline_hash = req
        .trampoline_hash
        .map_or_else(|| "null".to_string(), |h| format!("\"{}\"", hex::encode(h)));
    let build = req.build.unwrap_or("null");

    let payload = format!(
        "{{\"binary_hash\":{binary_hash},\"build\":{build},\"files\":{files_json},\
         \"manifest\":{manifest},\"platform\":{platform_json},\
         \"trampoline_hash\":{trampoline_hash}}}"
    );
    let signature = sign_hex(payload.as_bytes(), req.secret)?;
    let public = hex::encode(&req.secret[32..]);

    let mut doc = String::from("{");
    doc.push_str(&format!("\"binary_hash\":{binary_hash},"));
    if let Some(build) = req.build {
        doc.push_str(&format!("\"build\":{build},"));
    }
    doc.push_str(&format!("\"files\":{files_json},"));
    if let Some(manifest) = req.manifest {
        doc.push_str(&format!("\"manifest\":{manifest},"));
    }
    if platform_json != "null" {
        doc.push_str(&format!("\"platform\":{platform_json},"));
    }
    doc.push_str(&format!(
        "\"public_key\":\"{public}\",\"signature\":\"{signature}\","
    ));
    doc.push_str(&format!("\"trampoline_hash\":{trampoline_hash}}}"));
    Ok(doc)
}
