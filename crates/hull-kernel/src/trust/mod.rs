//! Package trust verification.
//!
//! Before the host loads any application code it verifies the signed
//! package document (`package.sig`, legacy `hull.sig`) in four steps:
//!
//! 1. **Read**: parse the bounded-size document into [`SigDocument`].
//!    Signed sub-objects (`platforms`, `files`, `manifest`, `build`)
//!    are retained as raw JSON text, byte-for-byte as stored, because
//!    signature reconstruction must splice them verbatim;
//!    re-serializing a parsed structure is unsafe.
//! 2. **Platform layer**: Ed25519-verify the raw `platforms` object
//!    against the platform public key, optionally pinned to
//!    [`PLATFORM_PUBLIC_KEY_PIN`].
//! 3. **Application layer**: reconstruct the canonical payload in
//!    fixed alphabetical key order and Ed25519-verify it against the
//!    developer public key supplied by the host.
//! 4. **File integrity**: SHA-256 every declared file and refuse
//!    undeclared extras (closed world).
//!
//! [`verify_startup`] composes all four and is fail-fast: any single
//! failure prevents the process from loading application code; there
//! is no degraded or partial-trust mode. Unlike the capability
//! surface, errors here are detailed; they are consumed by the host
//! before any untrusted code exists.

mod document;
mod files;
mod sign;
mod startup;
mod verify;

use std::io;

use thiserror::Error;

pub use document::{PlatformEntry, PlatformSection, SigDocument, SigFileEntry};
pub use files::FileSource;
pub use sign::{sign_package, PlatformAttestation, SignRequest};
pub use startup::{read_public_key_file, verify_startup};
pub use verify::{verify_app_layer, verify_document, verify_platform_layer};

/// Signature document file name (current format).
pub const SIG_FILE_NAME: &str = "package.sig";

/// Signature document file name (legacy format, read-only fallback).
pub const LEGACY_SIG_FILE_NAME: &str = "hull.sig";

/// Largest signature document the verifier will read.
pub const MAX_SIG_SIZE: u64 = 1024 * 1024;

/// Compiled-in platform public key pin.
///
/// The all-zero placeholder disables pinning; a release build is
/// expected to replace it with the real platform key. The verifier
/// logs a warning whenever it runs unpinned so a placeholder that
/// leaks into production is visible in the host log.
pub const PLATFORM_PUBLIC_KEY_PIN: [u8; 32] = [0u8; 32];

/// Errors from signature-document reading and verification.
///
/// These are host-facing: startup verification runs before any
/// untrusted code is loaded, so unlike the capability surface there
/// is no reason to collapse them into an opaque signal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrustError {
    /// I/O failure while reading the document, a key file, or a
    /// declared file.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// What was being read.
        context: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The signature document exceeds [`MAX_SIG_SIZE`].
    #[error("signature document is {size} bytes, larger than the {max}-byte limit")]
    DocumentTooLarge {
        /// Observed size.
        size: u64,
        /// The limit.
        max: u64,
    },

    /// The document is not valid JSON or is missing a required field.
    #[error("malformed signature document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A hex field has the wrong length or non-hex characters.
    #[error("invalid hex in field '{field}'")]
    InvalidHex {
        /// The offending field.
        field: &'static str,
    },

    /// A declared file name is absolute or contains `..`.
    #[error("invalid file name in signature: {name}")]
    InvalidFileName {
        /// The offending name.
        name: String,
    },

    /// The 64-byte signing key is internally inconsistent.
    #[error("signing key is malformed")]
    InvalidSigningKey,

    /// No signature document was found beside the entry point.
    #[error("no {SIG_FILE_NAME} or {LEGACY_SIG_FILE_NAME} found in {dir}")]
    SignatureFileNotFound {
        /// Directory that was searched.
        dir: String,
    },

    /// The current-format document has no platform section.
    #[error("signature document is missing its platform section")]
    MissingPlatformSection,

    /// The platform public key does not match the compiled-in pin.
    #[error("platform public key does not match the compiled-in pin")]
    PlatformKeyPinMismatch,

    /// The platform-layer signature failed to verify.
    #[error("platform layer signature verification failed")]
    PlatformSignatureInvalid,

    /// The application-layer signature failed to verify.
    #[error("application layer signature verification failed")]
    AppSignatureInvalid,

    /// A declared file's content hash does not match.
    #[error("hash mismatch for declared file '{name}'")]
    FileHashMismatch {
        /// The file whose content changed.
        name: String,
    },

    /// A declared file is missing.
    #[error("declared file '{name}' is missing")]
    FileMissing {
        /// The missing file.
        name: String,
    },

    /// A file exists in the package that the signature does not
    /// declare.
    #[error("undeclared file '{name}' present in package")]
    UnexpectedFile {
        /// The extra file.
        name: String,
    },
}

impl TrustError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
