//! Ed25519 detached signatures.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::Denied;

/// Ed25519 public key size in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 secret key size in bytes (seed followed by public key).
pub const SECRET_KEY_LEN: usize = 64;

/// Ed25519 detached signature size in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// A freshly generated Ed25519 keypair.
///
/// The secret half uses the 64-byte seed-plus-public-key layout, so a
/// secret key alone is sufficient to sign.
#[derive(Clone)]
pub struct Keypair {
    /// Public verification key.
    pub public: [u8; PUBLIC_KEY_LEN],
    /// Secret signing key.
    pub secret: [u8; SECRET_KEY_LEN],
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret material stays out of logs.
        f.debug_struct("Keypair")
            .field("public", &hex::encode(self.public))
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Generates a new Ed25519 keypair from the OS CSPRNG.
#[must_use]
pub fn ed25519_keypair() -> Keypair {
    let signing_key = SigningKey::generate(&mut OsRng);
    Keypair {
        public: signing_key.verifying_key().to_bytes(),
        secret: signing_key.to_keypair_bytes(),
    }
}

/// Signs `msg` with a 64-byte secret key.
///
/// # Errors
///
/// Returns [`Denied`] if the secret key is internally inconsistent
/// (its embedded public half does not match its seed).
pub fn ed25519_sign(msg: &[u8], secret: &[u8; SECRET_KEY_LEN]) -> Result<[u8; SIGNATURE_LEN], Denied> {
    let signing_key = SigningKey::from_keypair_bytes(secret).map_err(|err| {
        tracing::warn!(%err, "crypto: malformed signing key");
        Denied
    })?;
    Ok(signing_key.sign(msg).to_bytes())
}

/// Verifies a detached signature.
///
/// Uses strict verification and rejects weak (small-order) public
/// keys outright.
///
/// # Errors
///
/// Returns [`Denied`] for a malformed or weak public key and for any
/// signature that does not verify.
pub fn ed25519_verify(
    msg: &[u8],
    sig: &[u8; SIGNATURE_LEN],
    public: &[u8; PUBLIC_KEY_LEN],
) -> Result<(), Denied> {
    let verifying_key = VerifyingKey::from_bytes(public).map_err(|err| {
        tracing::warn!(%err, "crypto: malformed public key");
        Denied
    })?;
    if verifying_key.is_weak() {
        tracing::warn!("crypto: weak Ed25519 public key rejected");
        return Err(Denied);
    }
    let signature = Signature::from_bytes(sig);
    verifying_key.verify_strict(msg, &signature).map_err(|err| {
        tracing::debug!(%err, "crypto: signature verification failed");
        Denied
    })
}
