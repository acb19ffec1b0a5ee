//! Signature document parsing.
//!
//! The document schema is fixed and machine-generated, so it is
//! parsed into a structured type, but every signed sub-object is
//! kept as [`RawValue`], the exact byte sequence from the input, so
//! that payload reconstruction never re-serializes anything.

use std::path::Path;

use serde::Deserialize;
use serde_json::value::RawValue;

use super::{TrustError, MAX_SIG_SIZE};
use crate::crypto::{PUBLIC_KEY_LEN, SIGNATURE_LEN};

/// One `(name, hash)` entry from the `files` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigFileEntry {
    /// Package-relative file name.
    pub name: String,
    /// Lowercase hex SHA-256 of the file content.
    pub hash_hex: String,
}

/// One per-architecture entry from the `platforms` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Architecture identifier (e.g. `linux-x86_64`).
    pub arch: String,
    /// Lowercase hex SHA-256 of the platform binary.
    pub hash_hex: String,
    /// Lowercase hex canary bytes.
    pub canary_hex: String,
}

/// The nested platform-layer attestation.
#[derive(Debug)]
pub struct PlatformSection {
    platforms: Box<RawValue>,
    public_key: [u8; PUBLIC_KEY_LEN],
    public_key_hex: String,
    signature: [u8; SIGNATURE_LEN],
    signature_hex: String,
    entries: Vec<PlatformEntry>,
}

impl PlatformSection {
    /// The raw `platforms` object, byte-for-byte as stored.
    #[must_use]
    pub fn platforms_raw(&self) -> &str {
        self.platforms.get()
    }

    /// The platform signing public key.
    #[must_use]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// The platform-layer signature over the raw `platforms` bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    /// Parsed per-architecture entries.
    #[must_use]
    pub fn entries(&self) -> &[PlatformEntry] {
        &self.entries
    }
}

/// A parsed signature document.
///
/// Read fresh from disk at verification time and dropped immediately
/// after use; never cached across requests.
#[derive(Debug)]
pub struct SigDocument {
    binary_hash: Option<String>,
    trampoline_hash: Option<String>,
    build: Option<Box<RawValue>>,
    files: Box<RawValue>,
    manifest: Option<Box<RawValue>>,
    platform: Option<PlatformSection>,
    public_key: [u8; PUBLIC_KEY_LEN],
    signature: [u8; SIGNATURE_LEN],
    file_entries: Vec<SigFileEntry>,
}

#[derive(Deserialize)]
struct RawDocument {
    binary_hash: Option<String>,
    build: Option<Box<RawValue>>,
    files: Box<RawValue>,
    manifest: Option<Box<RawValue>>,
    platform: Option<RawPlatform>,
    public_key: String,
    signature: String,
    trampoline_hash: Option<String>,
}

#[derive(Deserialize)]
struct RawPlatform {
    platforms: Box<RawValue>,
    public_key: String,
    signature: String,
}

#[derive(Deserialize)]
struct RawPlatformEntry {
    hash: String,
    canary: String,
}

fn decode_hex<const N: usize>(s: &str, field: &'static str) -> Result<[u8; N], TrustError> {
    let mut out = [0u8; N];
    if s.len() != N * 2 {
        return Err(TrustError::InvalidHex { field });
    }
    hex::decode_to_slice(s, &mut out).map_err(|_| TrustError::InvalidHex { field })?;
    Ok(out)
}

fn check_hex_digest(s: &str, field: &'static str) -> Result<(), TrustError> {
    decode_hex::<32>(s, field).map(|_| ())
}

fn check_hex(s: &str, field: &'static str) -> Result<(), TrustError> {
    hex::decode(s)
        .map(|_| ())
        .map_err(|_| TrustError::InvalidHex { field })
}

fn check_file_name(name: &str) -> Result<(), TrustError> {
    let invalid = name.is_empty()
        || name.starts_with('/')
        || Path::new(name)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
    if invalid {
        return Err(TrustError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl SigDocument {
    /// Parses a signature document from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError`] for invalid JSON, missing required
    /// fields (`files`, `signature`, `public_key`), malformed hex, or
    /// unsafe declared file names.
    pub fn parse(text: &str) -> Result<Self, TrustError> {
        let raw: RawDocument = serde_json::from_str(text)?;

        if let Some(hash) = raw.binary_hash.as_deref() {
            check_hex_digest(hash, "binary_hash")?;
        }
        if let Some(hash) = raw.trampoline_hash.as_deref() {
            check_hex_digest(hash, "trampoline_hash")?;
        }

        let public_key = decode_hex(&raw.public_key, "public_key")?;
        let signature = decode_hex(&raw.signature, "signature")?;

        let platform = raw
            .platform
            .map(|section| -> Result<PlatformSection, TrustError> {
                let public_key = decode_hex(&section.public_key, "platform.public_key")?;
                let signature = decode_hex(&section.signature, "platform.signature")?;

                let bodies: std::collections::BTreeMap<String, RawPlatformEntry> =
                    serde_json::from_str(section.platforms.get())?;
                let mut entries = Vec::with_capacity(bodies.len());
                for (arch, body) in bodies {
                    check_hex_digest(&body.hash, "platforms.hash")?;
                    check_hex(&body.canary, "platforms.canary")?;
                    entries.push(PlatformEntry {
                        arch,
                        hash_hex: body.hash,
                        canary_hex: body.canary,
                    });
                }

                Ok(PlatformSection {
                    platforms: section.platforms,
                    public_key,
                    public_key_hex: section.public_key,
                    signature,
                    signature_hex: section.signature,
                    entries,
                })
            })
            .transpose()?;

        let file_map: std::collections::BTreeMap<String, String> =
            serde_json::from_str(raw.files.get())?;
        let mut file_entries = Vec::with_capacity(file_map.len());
        for (name, hash_hex) in file_map {
            check_file_name(&name)?;
            check_hex_digest(&hash_hex, "files")?;
            file_entries.push(SigFileEntry { name, hash_hex });
        }

        Ok(Self {
            binary_hash: raw.binary_hash,
            trampoline_hash: raw.trampoline_hash,
            build: raw.build,
            files: raw.files,
            manifest: raw.manifest,
            platform,
            public_key,
            signature,
            file_entries,
        })
    }

    /// Reads and parses a bounded-size signature document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError`] on I/O failure, an over-size document,
    /// or any parse failure.
    pub fn read_from(path: &Path) -> Result<Self, TrustError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| TrustError::io(format!("stat {}", path.display()), e))?;
        if metadata.len() > MAX_SIG_SIZE {
            return Err(TrustError::DocumentTooLarge {
                size: metadata.len(),
                max: MAX_SIG_SIZE,
            });
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrustError::io(format!("reading {}", path.display()), e))?;
        Self::parse(&text)
    }

    /// Whether this is a legacy (`hull.sig`) document, selected by
    /// the absence of `binary_hash`.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.binary_hash.is_none()
    }

    /// Declared host-binary hash (current format only).
    #[must_use]
    pub fn binary_hash(&self) -> Option<&str> {
        self.binary_hash.as_deref()
    }

    /// Declared trampoline hash (current format only).
    #[must_use]
    pub fn trampoline_hash(&self) -> Option<&str> {
        self.trampoline_hash.as_deref()
    }

    /// Raw `files` object, byte-for-byte as stored.
    #[must_use]
    pub fn files_raw(&self) -> &str {
        self.files.get()
    }

    /// Raw `manifest` object, if present.
    #[must_use]
    pub fn manifest_raw(&self) -> Option<&str> {
        self.manifest.as_deref().map(RawValue::get)
    }

    /// The developer public key embedded in the document.
    #[must_use]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// The application-layer signature.
    #[must_use]
    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    /// The nested platform attestation, if present.
    #[must_use]
    pub fn platform(&self) -> Option<&PlatformSection> {
        self.platform.as_ref()
    }

    /// Parsed `(name, hash)` entries from `files`.
    #[must_use]
    pub fn file_entries(&self) -> &[SigFileEntry] {
        &self.file_entries
    }

    /// Reconstructs the exact byte sequence the application layer
    /// signed.
    ///
    /// Current format: the canonical object in fixed alphabetical key
    /// order `{binary_hash, build, files, manifest, platform,
    /// trampoline_hash}`, with `null` substituted for absent optional
    /// fields and every sub-object spliced verbatim from the stored
    /// raw text. Legacy format: the two-field `{files, manifest}`
    /// form.
    #[must_use]
    pub fn canonical_payload(&self) -> String {
        let manifest = self.manifest_raw().unwrap_or("null");
        if self.is_legacy() {
            return format!(
                "{{\"files\":{files},\"manifest\":{manifest}}}",
                files = self.files_raw(),
            );
        }

        let platform = self.platform.as_ref().map_or_else(
            || "null".to_string(),
            |p| {
                format!(
                    "{{\"platforms\":{platforms},\"public_key\":\"{pk}\",\"signature\":\"{sig}\"}}",
                    platforms = p.platforms_raw(),
                    pk = p.public_key_hex,
                    sig = p.signature_hex,
                )
            },
        );
        let binary_hash = self
            .binary_hash
            .as_deref()
            .map_or_else(|| "null".to_string(), |h| format!("\"{h}\""));
        let trampoline_hash = self
            .trampoline_hash
            .as_deref()
            .map_or_else(|| "null".to_string(), |h| format!("\"{h}\""));
        let build = self.build.as_deref().map_or("null", RawValue::get);

        format!(
            "{{\"binary_hash\":{binary_hash},\"build\":{build},\"files\":{files},\
             \"manifest\":{manifest},\"platform\":{platform},\
             \"trampoline_hash\":{trampoline_hash}}}",
            files = self.files_raw(),
        )
    }
}
