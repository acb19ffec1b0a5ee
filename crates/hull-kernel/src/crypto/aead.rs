//! Authenticated encryption: symmetric secretbox and asymmetric box.
//!
//! Both variants are XSalsa20-Poly1305; the asymmetric form derives
//! the shared key via X25519. Callers pass and receive unpadded
//! buffers; the zero-padding convention of the underlying NaCl wire
//! format is an implementation artifact the AEAD interface already
//! hides on both sides.

use crypto_box::{PublicKey, SalsaBox, SecretKey};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;
use rand::rngs::OsRng;

use crate::Denied;

/// Secretbox key size in bytes.
pub const SECRETBOX_KEY_LEN: usize = 32;

/// Secretbox (and box) nonce size in bytes.
pub const SECRETBOX_NONCE_LEN: usize = 24;

/// Poly1305 authentication tag size in bytes; ciphertexts are exactly
/// this much longer than their plaintexts.
pub const SECRETBOX_TAG_LEN: usize = 16;

/// Box public key size in bytes.
pub const BOX_PUBLIC_KEY_LEN: usize = 32;

/// Box secret key size in bytes.
pub const BOX_SECRET_KEY_LEN: usize = 32;

/// Box nonce size in bytes.
pub const BOX_NONCE_LEN: usize = 24;

/// A freshly generated X25519 keypair for box operations.
#[derive(Clone)]
pub struct BoxKeypair {
    /// Public key, shareable.
    pub public: [u8; BOX_PUBLIC_KEY_LEN],
    /// Secret key.
    pub secret: [u8; BOX_SECRET_KEY_LEN],
}

impl std::fmt::Debug for BoxKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxKeypair")
            .field("public", &hex::encode(self.public))
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Encrypts and authenticates `msg` under a symmetric key.
///
/// The returned ciphertext is `msg.len() + SECRETBOX_TAG_LEN` bytes.
///
/// # Errors
///
/// Returns [`Denied`] if encryption fails.
pub fn secretbox_seal(
    msg: &[u8],
    nonce: &[u8; SECRETBOX_NONCE_LEN],
    key: &[u8; SECRETBOX_KEY_LEN],
) -> Result<Vec<u8>, Denied> {
    let cipher = XSalsa20Poly1305::new(crypto_secretbox::Key::from_slice(key));
    cipher
        .encrypt(crypto_secretbox::Nonce::from_slice(nonce), msg)
        .map_err(|err| {
            tracing::warn!(%err, "crypto: secretbox seal failed");
            Denied
        })
}

/// Opens a secretbox ciphertext.
///
/// # Errors
///
/// Returns [`Denied`] for any authentication failure; corrupted
/// plaintext is never returned.
pub fn secretbox_open(
    ciphertext: &[u8],
    nonce: &[u8; SECRETBOX_NONCE_LEN],
    key: &[u8; SECRETBOX_KEY_LEN],
) -> Result<Vec<u8>, Denied> {
    let cipher = XSalsa20Poly1305::new(crypto_secretbox::Key::from_slice(key));
    cipher
        .decrypt(crypto_secretbox::Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            tracing::debug!("crypto: secretbox open rejected ciphertext");
            Denied
        })
}

/// Generates a new X25519 keypair for box operations.
#[must_use]
pub fn box_keypair() -> BoxKeypair {
    let secret = SecretKey::generate(&mut OsRng);
    BoxKeypair {
        public: *secret.public_key().as_bytes(),
        secret: secret.to_bytes(),
    }
}

/// Encrypts and authenticates `msg` from `my_secret` to
/// `their_public`.
///
/// # Errors
///
/// Returns [`Denied`] if encryption fails.
pub fn box_seal(
    msg: &[u8],
    nonce: &[u8; BOX_NONCE_LEN],
    their_public: &[u8; BOX_PUBLIC_KEY_LEN],
    my_secret: &[u8; BOX_SECRET_KEY_LEN],
) -> Result<Vec<u8>, Denied> {
    let cipher = SalsaBox::new(&PublicKey::from(*their_public), &SecretKey::from(*my_secret));
    cipher
        .encrypt(crypto_box::Nonce::from_slice(nonce), msg)
        .map_err(|err| {
            tracing::warn!(%err, "crypto: box seal failed");
            Denied
        })
}

/// Opens a box ciphertext sent from `their_public` to `my_secret`.
///
/// # Errors
///
/// Returns [`Denied`] for any authentication failure.
pub fn box_open(
    ciphertext: &[u8],
    nonce: &[u8; BOX_NONCE_LEN],
    their_public: &[u8; BOX_PUBLIC_KEY_LEN],
    my_secret: &[u8; BOX_SECRET_KEY_LEN],
) -> Result<Vec<u8>, Denied> {
    let cipher = SalsaBox::new(&PublicKey::from(*their_public), &SecretKey::from(*my_secret));
    cipher
        .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            tracing::debug!("crypto: box open rejected ciphertext");
            Denied
        })
}
