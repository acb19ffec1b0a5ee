//! HMAC-SHA-512-256 message authentication.
//!
//! The tag is the first 32 bytes of HMAC-SHA-512 output (the NaCl
//! `crypto_auth` construction), not HMAC over SHA-512/256.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::Denied;

type HmacSha512 = Hmac<Sha512>;

/// Authentication key size in bytes.
pub const AUTH_KEY_LEN: usize = 32;

/// Authentication tag size in bytes.
pub const AUTH_TAG_LEN: usize = 32;

/// Computes the authentication tag for `msg` under `key`.
#[must_use]
pub fn auth(msg: &[u8], key: &[u8; AUTH_KEY_LEN]) -> [u8; AUTH_TAG_LEN] {
    // HMAC accepts keys of any length; a 32-byte key cannot fail.
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg);
    let full = mac.finalize().into_bytes();
    let mut tag = [0u8; AUTH_TAG_LEN];
    tag.copy_from_slice(&full[..AUTH_TAG_LEN]);
    tag
}

/// Verifies an authentication tag in constant time.
///
/// # Errors
///
/// Returns [`Denied`] if the tag does not match.
pub fn auth_verify(tag: &[u8; AUTH_TAG_LEN], msg: &[u8], key: &[u8; AUTH_KEY_LEN]) -> Result<(), Denied> {
    let expected = auth(msg, key);
    if expected.ct_eq(tag).into() {
        Ok(())
    } else {
        tracing::debug!("crypto: auth tag mismatch");
        Err(Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_round_trip() {
        let key = [7u8; AUTH_KEY_LEN];
        let tag = auth(b"payload", &key);
        auth_verify(&tag, b"payload", &key).expect("verify");
    }

    #[test]
    fn tag_is_half_of_hmac_sha512() {
        let key = [0u8; AUTH_KEY_LEN];
        let mut mac = HmacSha512::new_from_slice(&key).expect("hmac key");
        mac.update(b"msg");
        let full = mac.finalize().into_bytes();
        assert_eq!(auth(b"msg", &key), full[..AUTH_TAG_LEN]);
    }

    #[test]
    fn modified_message_rejects() {
        let key = [7u8; AUTH_KEY_LEN];
        let tag = auth(b"payload", &key);
        assert_eq!(auth_verify(&tag, b"payloaD", &key), Err(Denied));
    }

    #[test]
    fn modified_tag_rejects() {
        let key = [7u8; AUTH_KEY_LEN];
        let mut tag = auth(b"payload", &key);
        tag[0] ^= 0x80;
        assert_eq!(auth_verify(&tag, b"payload", &key), Err(Denied));
    }

    #[test]
    fn different_key_rejects() {
        let tag = auth(b"payload", &[1u8; AUTH_KEY_LEN]);
        assert_eq!(auth_verify(&tag, b"payload", &[2u8; AUTH_KEY_LEN]), Err(Denied));
    }
}
