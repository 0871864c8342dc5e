//! PKCE (RFC 7636, S256) and `state` values for one authorization request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Code verifier of a single login attempt.
///
/// Not `Clone`: it is moved into the token exchange and dropped there.
pub struct PkceVerifier(String);

impl PkceVerifier {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PkceVerifier(..)")
    }
}

/// Verifier plus its S256 challenge.
#[derive(Debug)]
pub struct PkcePair {
    verifier: PkceVerifier,
    challenge: String,
}

impl PkcePair {
    #[must_use]
    pub fn generate() -> Self {
        let verifier = random_urlsafe(32);
        let challenge = s256_challenge(&verifier);
        Self {
            verifier: PkceVerifier(verifier),
            challenge,
        }
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn into_verifier(self) -> PkceVerifier {
        self.verifier
    }
}

/// `BASE64URL(SHA256(verifier))`
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// 16 random bytes, base64url encoded (22 chars).
#[must_use]
pub fn generate_state() -> String {
    random_urlsafe(16)
}

fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}
