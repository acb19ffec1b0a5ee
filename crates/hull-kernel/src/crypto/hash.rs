//! SHA-2 digests.

use sha2::{Digest, Sha256, Sha512};

/// Size of a SHA-256 digest in bytes.
pub const SHA256_LEN: usize = 32;

/// Size of a SHA-512 digest in bytes.
pub const SHA512_LEN: usize = 64;

/// Computes the SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    Sha256::digest(data).into()
}

/// Computes the SHA-512 digest of `data`.
#[must_use]
pub fn sha512(data: &[u8]) -> [u8; SHA512_LEN] {
    Sha512::digest(data).into()
}
