//! Webhook signature verification
//!
//! The processor signs every delivery with HMAC-SHA512 over the raw body and
//! sends the lowercase hex digest alongside it. Verification must succeed
//! before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Verifies webhook signatures against a shared signing key
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: signing_key.into(),
        }
    }

    /// Hex-encoded HMAC-SHA512 of `raw_body`
    pub fn sign(&self, raw_body: &[u8]) -> String {
        sign(raw_body, &self.signing_key)
    }

    /// Whether `signature` is the digest of `raw_body` under this key
    pub fn verify(&self, raw_body: &[u8], signature: &str) -> bool {
        verify(raw_body, signature, &self.signing_key)
    }
}

/// Hex-encoded HMAC-SHA512 of `raw_body` under `signing_key`
pub fn sign(raw_body: &[u8], signing_key: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(signing_key).expect("HMAC accepts any key size");
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the expected digest with `signature`
pub fn verify(raw_body: &[u8], signature: &str, signing_key: &[u8]) -> bool {
    let expected = sign(raw_body, signing_key);
    if expected.len() != signature.len() {
        return false;
    }
    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}
