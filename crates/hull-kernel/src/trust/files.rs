//! Declared-file integrity checks.
//!
//! The signature's `files` object is a closed world: every declared
//! file must exist with exactly the declared SHA-256, and no
//! undeclared file may be present in the package.

use std::collections::BTreeSet;
use std::path::Path;

use subtle::ConstantTimeEq;
use walkdir::WalkDir;

use super::document::SigFileEntry;
use super::{TrustError, LEGACY_SIG_FILE_NAME, SIG_FILE_NAME};
use crate::crypto::sha256;

/// Where package file contents come from during verification.
#[derive(Debug, Clone, Copy)]
pub enum FileSource<'a> {
    /// An in-memory `(name, content)` table, used when the package is
    /// carried inside the host binary.
    Embedded(&'a [(&'a str, &'a [u8])]),
    /// An on-disk package rooted at this directory.
    Root(&'a Path),
}

fn check_hash(entry: &SigFileEntry, content: &[u8]) -> Result<(), TrustError> {
    let mut declared = [0u8; 32];
    // Entries come from a parsed document, so the hex is well formed.
    hex::decode_to_slice(&entry.hash_hex, &mut declared)
        .map_err(|_| TrustError::InvalidHex { field: "files" })?;
    let actual = sha256(content);
    if bool::from(actual.ct_eq(&declared)) {
        Ok(())
    } else {
        Err(TrustError::FileHashMismatch {
            name: entry.name.clone(),
        })
    }
}

pub(crate) fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut name = String::new();
    for component in rel.components() {
        if !name.is_empty() {
            name.push('/');
        }
        name.push_str(component.as_os_str().to_str()?);
    }
    Some(name)
}

/// Checks every declared file against `source` and rejects extras.
///
/// # Errors
///
/// Returns [`TrustError`] for a missing or modified declared file, an
/// undeclared extra file, or I/O failure while reading.
pub(crate) fn verify_files(
    entries: &[SigFileEntry],
    source: &FileSource<'_>,
) -> Result<(), TrustError> {
    match source {
        FileSource::Embedded(table) => {
            for entry in entries {
                let content = table
                    .iter()
                    .find(|(name, _)| *name == entry.name)
                    .map(|(_, content)| *content)
                    .ok_or_else(|| TrustError::FileMissing {
                        name: entry.name.clone(),
                    })?;
                check_hash(entry, content)?;
            }
            let declared: BTreeSet<&str> =
                entries.iter().map(|e| e.name.as_str()).collect();
            for (name, _) in *table {
                if !declared.contains(name) {
                    return Err(TrustError::UnexpectedFile {
                        name: (*name).to_string(),
                    });
                }
            }
        }
        FileSource::Root(root) => {
            for entry in entries {
                let path = root.join(&entry.name);
                let content = std::fs::read(&path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        TrustError::FileMissing {
                            name: entry.name.clone(),
                        }
                    } else {
                        TrustError::io(format!("reading {}", path.display()), e)
                    }
                })?;
                check_hash(entry, &content)?;
            }

            let declared: BTreeSet<&str> =
                entries.iter().map(|e| e.name.as_str()).collect();
            for walked in WalkDir::new(root).sort_by_file_name() {
                let walked =
                    walked.map_err(|e| TrustError::io(format!("walking {}", root.display()), e.into()))?;
                if !walked.file_type().is_file() {
                    continue;
                }
                let Some(name) = relative_name(root, walked.path()) else {
                    return Err(TrustError::UnexpectedFile {
                        name: walked.path().display().to_string(),
                    });
                };
                // The signature document itself sits beside the files
                // it signs.
                if name == SIG_FILE_NAME || name == LEGACY_SIG_FILE_NAME {
                    continue;
                }
                if !declared.contains(name.as_str()) {
                    return Err(TrustError::UnexpectedFile { name });
                }
            }
        }
    }
    Ok(())
}
