//! Signature verification over a parsed document.

use super::document::SigDocument;
use super::files::{verify_files, FileSource};
use super::{TrustError, PLATFORM_PUBLIC_KEY_PIN};
use crate::crypto::{ed25519_verify, PUBLIC_KEY_LEN};

/// Verifies the platform-layer attestation.
///
/// The signed message is the raw `platforms` object, byte-for-byte as
/// it appeared in the document. When the compiled-in pin is the
/// all-zero placeholder, any platform key is accepted and a warning
/// is logged.
///
/// # Errors
///
/// Returns [`TrustError`] if the platform section is missing, the key
/// does not match the pin, or the signature does not verify.
pub fn verify_platform_layer(doc: &SigDocument) -> Result<(), TrustError> {
    let section = doc
        .platform()
        .ok_or(TrustError::MissingPlatformSection)?;

    if PLATFORM_PUBLIC_KEY_PIN == [0u8; 32] {
        tracing::warn!("trust: platform key pinning disabled (placeholder pin)");
    } else if *section.public_key() != PLATFORM_PUBLIC_KEY_PIN {
        return Err(TrustError::PlatformKeyPinMismatch);
    }

    ed25519_verify(
        section.platforms_raw().as_bytes(),
        section.signature(),
        section.public_key(),
    )
    .map_err(|_| TrustError::PlatformSignatureInvalid)
}

/// Verifies the application-layer signature against the developer key
/// the host trusts.
///
/// The embedded `public_key` field is informational only; the
/// signature must verify under `app_public_key` or the package is
/// rejected.
///
/// # Errors
///
/// Returns [`TrustError::AppSignatureInvalid`] on any failure.
pub fn verify_app_layer(
    doc: &SigDocument,
    app_public_key: &[u8; PUBLIC_KEY_LEN],
) -> Result<(), TrustError> {
    let payload = doc.canonical_payload();
    ed25519_verify(payload.as_bytes(), doc.signature(), app_public_key)
        .map_err(|_| TrustError::AppSignatureInvalid)
}

/// Runs full verification of a parsed document: platform layer (when
/// the format carries one), application layer, then file integrity.
///
/// Legacy documents have no platform section and skip that step.
///
/// # Errors
///
/// Returns the first [`TrustError`] encountered; verification is
/// fail-fast.
pub fn verify_document(
    doc: &SigDocument,
    app_public_key: &[u8; PUBLIC_KEY_LEN],
    source: &FileSource<'_>,
) -> Result<(), TrustError> {
    if !doc.is_legacy() {
        verify_platform_layer(doc)?;
        tracing::debug!("trust: platform layer verified");
    }
    verify_app_layer(doc, app_public_key)?;
    tracing::debug!("trust: application layer verified");
    verify_files(doc.file_entries(), source)?;
    tracing::debug!(files = doc.file_entries().len(), "trust: file integrity verified");
    Ok(())
}
