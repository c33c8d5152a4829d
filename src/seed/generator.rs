//! ChaCha20 outputs seeded from a photo digest.
//!
//! # Determinism
//!
//! The digest is used verbatim as the 32-byte ChaCha20 seed. ChaCha20's
//! stream and `rand`'s uniform samplers are value-stable across platforms,
//! so a photo yields the same flip and the same digits on every machine.
//! No other entropy source is consulted after seeding.

use super::digest::{derive_digest, HashAlgorithm, PhotoDigest};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use thiserror::Error;

/// Largest number of values one `draw_range` call produces.
pub const MAX_RANGE_DRAWS: usize = 10_000;

/// Errors from range draws.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("invalid range: upper bound {upper} must be greater than lower bound {lower}")]
    InvalidRange { lower: i64, upper: i64 },
    #[error("cannot draw {requested} values, at most {max} per call")]
    TooManyDraws { requested: usize, max: usize },
}

/// Stateless generator turning photo bytes into pseudo-random outputs.
///
/// Each call hashes the photo and seeds a fresh generator, so calls never
/// influence one another and the type is freely shareable across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedGenerator {
    algorithm: HashAlgorithm,
}

impl SeedGenerator {
    /// Creates a generator using the given digest algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the digest algorithm in use.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hashes the full photo content.
    pub fn derive_digest(&self, photo: &[u8]) -> PhotoDigest {
        derive_digest(self.algorithm, photo)
    }

    /// Draws one uniform boolean. `true` reads as heads.
    pub fn coin_flip(&self, photo: &[u8]) -> bool {
        self.rng_for(photo).gen_bool(0.5)
    }

    /// Draws `length` uniform decimal digits in draw order.
    ///
    /// The caller bounds `length`; a zero length yields an empty string.
    pub fn lucky_digits(&self, photo: &[u8], length: usize) -> String {
        let mut rng = self.rng_for(photo);
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Draws `count` uniform integers in `[lower, upper)`.
    ///
    /// `count` is bounded by [`MAX_RANGE_DRAWS`].
    pub fn draw_range(
        &self,
        photo: &[u8],
        lower: i64,
        upper: i64,
        count: usize,
    ) -> Result<Vec<i64>, SeedError> {
        if upper <= lower {
            return Err(SeedError::InvalidRange { lower, upper });
        }
        if count > MAX_RANGE_DRAWS {
            return Err(SeedError::TooManyDraws {
                requested: count,
                max: MAX_RANGE_DRAWS,
            });
        }
        let mut rng = self.rng_for(photo);
        Ok((0..count).map(|_| rng.gen_range(lower..upper)).collect())
    }

    fn rng_for(&self, photo: &[u8]) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(*self.derive_digest(photo).as_bytes())
    }
}
