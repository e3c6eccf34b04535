//! Token generation.
//!
//! Tokens are `token_length` bytes drawn from a cryptographically secure
//! random source, encoded as unpadded URL-safe base64. The encoded length is
//! a pure function of the byte length, so tokens are compared as plain
//! strings.

use crate::error::TokenGenerationError;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::trace;

/// A cryptographically secure source of random bytes.
pub trait RandomSource: Send + Sync {
    /// Algorithm name, reported in the configuration summary.
    fn algorithm(&self) -> &str;

    /// Fill `dest` with random bytes.
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn algorithm(&self) -> &str {
        "OS"
    }

    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// A ChaCha-based generator seeded once from the operating system.
pub struct ChaChaRandom {
    rng: Mutex<StdRng>,
}

impl ChaChaRandom {
    /// Seed a new generator from the OS CSPRNG.
    pub fn new() -> Result<Self, TokenGenerationError> {
        let rng = StdRng::from_rng(OsRng)?;
        Ok(Self {
            rng: Mutex::new(rng),
        })
    }
}

impl RandomSource for ChaChaRandom {
    fn algorithm(&self) -> &str {
        "ChaCha"
    }

    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.lock().try_fill_bytes(dest)
    }
}

/// Resolve a random source by algorithm name.
///
/// Names are matched case-insensitively: `"OS"` and `"ChaCha"`.
///
/// ```
/// use tokenguard_csrf::token::random_source;
///
/// assert_eq!(random_source("os").unwrap().algorithm(), "OS");
/// assert!(random_source("SHA1PRNG").is_err());
/// ```
pub fn random_source(name: &str) -> Result<Arc<dyn RandomSource>, TokenGenerationError> {
    match name.to_ascii_lowercase().as_str() {
        "os" => Ok(Arc::new(OsRandom)),
        "chacha" => Ok(Arc::new(ChaChaRandom::new()?)),
        _ => Err(TokenGenerationError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Generate one token of `length` random bytes from `source`.
pub fn generate(source: &dyn RandomSource, length: usize) -> Result<String, TokenGenerationError> {
    if length == 0 {
        return Err(TokenGenerationError::InvalidLength(length));
    }

    let mut bytes = vec![0u8; length];
    source.try_fill(&mut bytes)?;
    trace!(algorithm = source.algorithm(), length, "Generated token");
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Length of the encoded form of a `length`-byte token.
pub fn encoded_len(length: usize) -> usize {
    (length * 4).div_ceil(3)
}

/// Compare two tokens without leaking the position of the first difference.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Token generator bound to a random source and a token length.
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn RandomSource>,
    length: usize,
}

impl TokenGenerator {
    pub fn new(source: Arc<dyn RandomSource>, length: usize) -> Self {
        Self { source, length }
    }

    /// Generate a fresh token.
    pub fn generate(&self) -> Result<String, TokenGenerationError> {
        generate(self.source.as_ref(), self.length)
    }

    pub fn algorithm(&self) -> &str {
        self.source.algorithm()
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("algorithm", &self.source.algorithm())
            .field("length", &self.length)
            .finish()
    }
}
