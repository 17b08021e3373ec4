//! PKCE (Proof Key for Code Exchange) support for OAuth 2.0.
//!
//! Implements the S256 method of RFC 7636.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Bytes of entropy behind every generated verifier.
const VERIFIER_ENTROPY_BYTES: usize = 32;

/// PKCE code verifier.
#[derive(Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a new random verifier: 32 bytes from the OS RNG, base64url without
    /// padding (43 characters).
    pub fn generate() -> Self {
        let mut random_bytes = [0u8; VERIFIER_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut random_bytes);
        Self(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Wrap an existing verifier string.
    pub fn from_string(verifier: String) -> Self {
        Self(verifier)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the S256 code challenge for this verifier.
    pub fn challenge(&self) -> PkceChallenge {
        PkceChallenge::from_verifier(self)
    }
}

// Verifiers are secrets until the token exchange; keep them out of logs.
impl fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PkceVerifier([REDACTED])")
    }
}

/// PKCE code challenge: base64url(SHA-256(verifier)) without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// The `code_challenge_method` value sent alongside the challenge.
    pub const METHOD: &'static str = "S256";

    /// Hash the verifier's ASCII bytes and encode the digest.
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let digest = Sha256::digest(verifier.as_str().as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
