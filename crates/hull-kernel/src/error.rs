//! The opaque capability failure signal.

use std::fmt;

/// The single failure value every script-facing capability function
/// returns.
///
/// `Denied` carries no reason. Malformed paths, disallowed names,
/// wrong-typed parameters, bad signatures, tampered ciphertexts,
/// allocation failures, and plain I/O errors all collapse into this
/// one value so that untrusted script code cannot distinguish
/// "attacker caught" from "environment broke"; both must fail closed.
/// The diagnostic detail is logged to the host's `tracing` stream at
/// the point of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied;

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation denied")
    }
}

impl std::error::Error for Denied {}
