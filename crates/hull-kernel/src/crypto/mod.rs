//! Cryptographic primitives exposed to sandboxed scripts.
//!
//! Every function here is a pure operation over fixed-size byte
//! buffers: no state, no background work, no throwing into the
//! scripting runtime. Fixed key/nonce/tag lengths are part of the
//! binary contract and are enforced by `[u8; N]` parameters: a
//! binding that cannot produce the exact length cannot call the
//! function, and there is no truncation or padding fallback.
//!
//! - [`sha256`]/[`sha512`]: plain digests
//! - [`random_bytes`]: CSPRNG fill, capped per call
//! - [`pbkdf2_hmac_sha256`]: password-based key derivation with
//!   caller-bounded parameters
//! - [`ed25519_keypair`]/[`ed25519_sign`]/[`ed25519_verify`]:
//!   detached signatures (strict verification, weak keys rejected)
//! - [`auth`]/[`auth_verify`]: HMAC-SHA-512-256 message
//!   authentication with constant-time comparison
//! - [`secretbox_seal`]/[`secretbox_open`] and
//!   [`box_seal`]/[`box_open`]: symmetric and asymmetric
//!   authenticated encryption (XSalsa20-Poly1305); callers pass and
//!   receive unpadded buffers

mod aead;
mod auth;
mod hash;
mod kdf;
mod random;
mod sign;

pub use aead::{
    box_keypair, box_open, box_seal, secretbox_open, secretbox_seal, BoxKeypair, BOX_NONCE_LEN,
    BOX_PUBLIC_KEY_LEN, BOX_SECRET_KEY_LEN, SECRETBOX_KEY_LEN, SECRETBOX_NONCE_LEN,
    SECRETBOX_TAG_LEN,
};
pub use auth::{auth, auth_verify, AUTH_KEY_LEN, AUTH_TAG_LEN};
pub use hash::{sha256, sha512, SHA256_LEN, SHA512_LEN};
pub use kdf::{pbkdf2_hmac_sha256, MAX_KDF_ITERATIONS, MAX_KDF_OUTPUT_LEN, MAX_KDF_SALT_LEN};
pub use random::{random_bytes, MAX_RANDOM_BYTES};
pub use sign::{
    ed25519_keypair, ed25519_sign, ed25519_verify, Keypair, PUBLIC_KEY_LEN, SECRET_KEY_LEN,
    SIGNATURE_LEN,
};
