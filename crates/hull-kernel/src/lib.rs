//! Capability kernel for the Hull script host.
//!
//! Hull runs untrusted application scripts inside a host process. Every
//! sensitive resource those scripts can reach (filesystem, process
//! environment, database, cryptography) is mediated by one of the
//! narrow capability modules in this crate:
//!
//! - [`fs`]: path-confined file access rooted at a single directory
//! - [`env`]: allowlist-gated environment variable reads
//! - [`db`]: parameterized SQLite access with a bounded statement cache
//! - [`crypto`]: hashing, CSPRNG, key derivation, signatures, and
//!   authenticated encryption
//! - [`trust`]: dual-layer Ed25519 package-signature verification and
//!   per-file integrity checking, run once at startup before any
//!   application code is loaded
//!
//! # Failure model
//!
//! Capability functions fail closed with the opaque [`Denied`] signal.
//! Validation rejections, integrity failures, and resource failures are
//! deliberately indistinguishable at the API boundary; the reason is
//! emitted to the host's `tracing` stream and never surfaces into the
//! sandboxed runtime. The one exception is [`trust`], whose errors are
//! detailed: startup verification runs before any untrusted code exists
//! and its consumer is the host itself.
//!
//! # Concurrency
//!
//! The kernel is synchronous and single-threaded: every call executes
//! to completion on the calling thread, holds no locks, and spawns no
//! background work. The host serializes requests so that one capability
//! call at a time touches a given configuration object or database
//! connection. Bounded inputs (maximum random-byte count, maximum file
//! and signature-document sizes, PBKDF2 parameter caps) are the only
//! defense against resource exhaustion from a single call; callers
//! needing timeouts must enforce them externally.

pub mod crypto;
pub mod db;
pub mod env;
mod error;
pub mod fs;
pub mod trust;

pub use error::Denied;
