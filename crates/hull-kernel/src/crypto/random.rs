//! CSPRNG access with a per-call size cap.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::Denied;

/// Hard maximum number of random bytes a single call may request.
///
/// Bounds memory churn from one scripting call; larger needs must be
/// satisfied incrementally.
pub const MAX_RANDOM_BYTES: usize = 65_536;

/// Fills `buf` with bytes from the operating system CSPRNG.
///
/// # Errors
///
/// Returns [`Denied`] if `buf` exceeds [`MAX_RANDOM_BYTES`] or the OS
/// entropy source fails.
pub fn random_bytes(buf: &mut [u8]) -> Result<(), Denied> {
    if buf.len() > MAX_RANDOM_BYTES {
        tracing::warn!(requested = buf.len(), "crypto: random request over cap");
        return Err(Denied);
    }
    OsRng.try_fill_bytes(buf).map_err(|err| {
        tracing::warn!(%err, "crypto: OS entropy source failed");
        Denied
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_requested_length() {
        let mut buf = [0u8; 64];
        random_bytes(&mut buf).expect("random");
        // 64 zero bytes from a CSPRNG is a 2^-512 event.
        assert_ne!(buf, [0u8; 64]);
    }

    #[test]
    fn zero_length_request_is_fine() {
        let mut buf = [];
        random_bytes(&mut buf).expect("random");
    }

    #[test]
    fn over_cap_request_is_denied() {
        let mut buf = vec![0u8; MAX_RANDOM_BYTES + 1];
        assert_eq!(random_bytes(&mut buf), Err(Denied));
    }

    #[test]
    fn at_cap_request_succeeds() {
        let mut buf = vec![0u8; MAX_RANDOM_BYTES];
        random_bytes(&mut buf).expect("random");
    }
}
