//! PBKDF2 key derivation with caller-bounded parameters.

use sha2::Sha256;

use crate::Denied;

/// Maximum accepted salt length in bytes.
pub const MAX_KDF_SALT_LEN: usize = 1024;

/// Maximum derived key length in bytes.
pub const MAX_KDF_OUTPUT_LEN: usize = 512;

/// Maximum accepted iteration count.
///
/// Caps the CPU a single scripting call can burn; a hostile script
/// asking for billions of rounds is refused, not throttled.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Derives `out_len` bytes from `password` and `salt` using
/// PBKDF2-HMAC-SHA-256.
///
/// # Errors
///
/// Returns [`Denied`] for a zero or over-cap iteration count, an
/// over-length salt, or a zero or over-length output request.
pub fn pbkdf2_hmac_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out_len: usize,
) -> Result<Vec<u8>, Denied> {
    if iterations == 0 || iterations > MAX_KDF_ITERATIONS {
        tracing::warn!(iterations, "crypto: kdf iteration count out of bounds");
        return Err(Denied);
    }
    if salt.len() > MAX_KDF_SALT_LEN {
        tracing::warn!(salt_len = salt.len(), "crypto: kdf salt too long");
        return Err(Denied);
    }
    if out_len == 0 || out_len > MAX_KDF_OUTPUT_LEN {
        tracing::warn!(out_len, "crypto: kdf output length out of bounds");
        return Err(Denied);
    }

    let mut out = vec![0u8; out_len];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    Ok(out)
}
