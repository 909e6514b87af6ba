//! Code verifier, code challenge, and CSRF state helpers for the PKCE flow (RFC 7636).

// std
use std::ops::RangeInclusive;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::error::ConfigError;

/// Allowed code verifier lengths.
pub const CODE_VERIFIER_LEN: RangeInclusive<usize> = 43..=128;

const STATE_LEN: usize = 32;
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Generates a random code verifier of `len` unreserved characters.
///
/// `len` is clamped into [`CODE_VERIFIER_LEN`].
pub fn generate_code_verifier(len: usize) -> String {
	let len = len.clamp(*CODE_VERIFIER_LEN.start(), *CODE_VERIFIER_LEN.end());
	let mut rng = rand::rng();

	(0..len).map(|_| char::from(UNRESERVED[rng.random_range(0..UNRESERVED.len())])).collect()
}

/// Derives the `S256` code challenge: base64url without padding of the verifier's SHA-256.
pub fn make_code_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

/// Checks the verifier length and alphabet.
pub fn validate_code_verifier(verifier: &str) -> Result<(), ConfigError> {
	let length = verifier.chars().count();

	if !CODE_VERIFIER_LEN.contains(&length) || !verifier.bytes().all(|b| UNRESERVED.contains(&b)) {
		return Err(ConfigError::InvalidCodeVerifier { length });
	}

	Ok(())
}

/// Random alphanumeric value for the `state` parameter.
pub fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
