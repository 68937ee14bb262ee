//! PKCE and anti-forgery token generation

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates a cryptographically random code verifier for PKCE.
///
/// Returns a 64-character URL-safe string (RFC 7636 compliant, 43-128 chars).
pub fn generate_code_verifier() -> String {
    let mut random_bytes = [0u8; 48];
    rand::thread_rng().fill(&mut random_bytes[..]);
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates a cryptographically random state parameter.
///
/// Returns a 22-character URL-safe string (16 random bytes, base64url).
pub fn generate_state() -> String {
    let mut random_bytes = [0u8; 16];
    rand::thread_rng().fill(&mut random_bytes);
    URL_SAFE_NO_PAD.encode(random_bytes)
}
