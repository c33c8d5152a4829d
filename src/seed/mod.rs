//! Seed derivation from photo bytes.
//!
//! A photo is hashed once over its full content and the digest seeds a
//! ChaCha20 generator. Every output (coin flip, digit string, integer range)
//! is a pure function of the photo bytes: identical bytes always produce
//! identical outputs, while a single changed byte yields an unrelated digest.

mod digest;
mod generator;

pub use digest::{derive_digest, HashAlgorithm, PhotoDigest};
pub use generator::{SeedError, SeedGenerator, MAX_RANGE_DRAWS};
