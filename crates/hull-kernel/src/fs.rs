//! Path-confined filesystem capability.
//!
//! All file access on behalf of untrusted script code goes through a
//! single confinement root ([`FsConfig::base_dir`]). Validation is
//! two-phase:
//!
//! 1. **Lexical scan**: empty paths, absolute paths, and any literal
//!    `..` component are rejected outright, regardless of whether the
//!    path would lexically resolve back inside the root.
//! 2. **Ancestor confinement**: the nearest existing ancestor of the
//!    target is resolved through `canonicalize` (realpath) and must be
//!    the resolved base or strictly under it, compared component-wise
//!    rather than by string prefix.
//!
//! The second phase is what stops symlink-based escapes that the
//! lexical scan cannot see, while still permitting writes to files
//! that do not exist yet (naive realpath on the full target would
//! fail for those).
//!
//! Validation rejections and I/O failures are reported identically as
//! [`Denied`]; callers must not distinguish them when deciding to
//! retry.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::Denied;

/// Largest file the capability will read in a single call.
///
/// Bounds memory use from one scripting call; larger files must be
/// processed outside the sandbox.
pub const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// The single confinement root for one application instance.
///
/// Immutable after construction and shared by reference across all
/// filesystem operations for that instance. The kernel never retains
/// it.
#[derive(Debug, Clone)]
pub struct FsConfig {
    base_dir: PathBuf,
}

impl FsConfig {
    /// Creates a config rooted at `base_dir`.
    ///
    /// The directory does not have to exist yet, but every operation
    /// will fail until it does: confinement is anchored on the
    /// resolved real path of the base.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The configured confinement root, as given.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Validates `path` against the confinement root.
///
/// Returns the full (base-joined, unresolved) path suitable for the
/// subsequent I/O call. The target itself may not exist; only its
/// nearest existing ancestor is required to resolve inside the base.
///
/// # Errors
///
/// Returns [`Denied`] for empty paths, absolute paths, any literal
/// `..` component, a missing or unresolvable base directory, or an
/// ancestor that resolves outside the base.
pub fn validate(cfg: &FsConfig, path: &str) -> Result<PathBuf, Denied> {
    if path.is_empty() {
        tracing::warn!("fs: rejected empty path");
        return Err(Denied);
    }
    if Path::new(path).is_absolute() || path.starts_with('/') {
        tracing::warn!(path, "fs: rejected absolute path");
        return Err(Denied);
    }
    for component in Path::new(path).components() {
        if matches!(component, Component::ParentDir) {
            tracing::warn!(path, "fs: rejected '..' component");
            return Err(Denied);
        }
    }

    // Confinement is anchored on the real path of the base; a missing
    // base is a hard failure, not an invitation to create one.
    let resolved_base = std::fs::canonicalize(&cfg.base_dir).map_err(|err| {
        tracing::warn!(base = %cfg.base_dir.display(), %err, "fs: base directory did not resolve");
        Denied
    })?;

    let full = resolved_base.join(path);

    // The target may not exist yet (write case). Walk upward until an
    // ancestor resolves, then require that ancestor to sit inside the
    // base. Component-wise starts_with, not string prefix, so
    // "/base-evil" never passes for base "/base".
    let mut probe = full.clone();
    loop {
        match std::fs::canonicalize(&probe) {
            Ok(resolved) => {
                if resolved.starts_with(&resolved_base) {
                    return Ok(full);
                }
                tracing::warn!(
                    path,
                    resolved = %resolved.display(),
                    "fs: ancestor resolved outside the base directory"
                );
                return Err(Denied);
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if !probe.pop() {
                    tracing::warn!(path, "fs: no resolvable ancestor");
                    return Err(Denied);
                }
            },
            Err(err) => {
                tracing::warn!(path, %err, "fs: ancestor resolution failed");
                return Err(Denied);
            },
        }
    }
}

/// Reads the full contents of a confined file.
///
/// # Errors
///
/// Returns [`Denied`] on validation rejection, a missing file, a file
/// larger than [`MAX_FILE_SIZE`], or any I/O failure.
pub fn read(cfg: &FsConfig, path: &str) -> Result<Vec<u8>, Denied> {
    let full = validate(cfg, path)?;
    let metadata = std::fs::metadata(&full).map_err(|err| {
        tracing::warn!(path, %err, "fs: stat failed");
        Denied
    })?;
    if metadata.len() > MAX_FILE_SIZE {
        tracing::warn!(path, size = metadata.len(), "fs: file exceeds read limit");
        return Err(Denied);
    }
    std::fs::read(&full).map_err(|err| {
        tracing::warn!(path, %err, "fs: read failed");
        Denied
    })
}

/// Writes `data` to a confined file, creating missing parent
/// directories.
///
/// # Errors
///
/// Returns [`Denied`] on validation rejection or any I/O failure.
pub fn write(cfg: &FsConfig, path: &str, data: &[u8]) -> Result<(), Denied> {
    let full = validate(cfg, path)?;
    if let Some(parent) = full.parent() {
        // Best-effort: create_dir_all treats already-existing
        // directories as success; a real failure surfaces from the
        // write below anyway.
        let _ = std::fs::create_dir_all(parent);
    }
    std::fs::write(&full, data).map_err(|err| {
        tracing::warn!(path, %err, "fs: write failed");
        Denied
    })
}

/// Reports whether a confined path currently exists.
///
/// # Errors
///
/// Returns [`Denied`] on validation rejection or if existence cannot
/// be determined.
pub fn exists(cfg: &FsConfig, path: &str) -> Result<bool, Denied> {
    let full = validate(cfg, path)?;
    full.try_exists().map_err(|err| {
        tracing::warn!(path, %err, "fs: existence check failed");
        Denied
    })
}

/// Deletes a confined file.
///
/// # Errors
///
/// Returns [`Denied`] on validation rejection or any I/O failure
/// (including a missing target).
pub fn delete(cfg: &FsConfig, path: &str) -> Result<(), Denied> {
    let full = validate(cfg, path)?;
    std::fs::remove_file(&full).map_err(|err| {
        tracing::warn!(path, %err, "fs: delete failed");
        Denied
    })
}
