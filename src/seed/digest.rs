//! Cryptographic digest of photo bytes.
//!
//! The digest is the only state a generator ever sees: it is computed
//! once over the whole photo, never over a sample or a decoded frame.

use blake3::Hasher as Blake3Hasher;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported hash algorithms for seed derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 - widely deployed, the default.
    #[default]
    Sha256,
    /// BLAKE3 - faster on large photos.
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// 256-bit digest of a photo.
///
/// Used directly as the ChaCha20 seed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PhotoDigest {
    data: [u8; 32],
}

impl PhotoDigest {
    /// Returns the digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.data
    }

    /// Returns the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.data.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Debug for PhotoDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PhotoDigest").field(&self.to_hex()).finish()
    }
}

/// Hashes the full photo content into a 256-bit digest.
pub fn derive_digest(algorithm: HashAlgorithm, photo: &[u8]) -> PhotoDigest {
    let data = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(photo);
            let result = hasher.finalize();
            let mut data = [0u8; 32];
            data.copy_from_slice(&result);
            data
        }
        HashAlgorithm::Blake3 => {
            let mut hasher = Blake3Hasher::new();
            hasher.update(photo);
            *hasher.finalize().as_bytes()
        }
    };

    tracing::trace!(algorithm = %algorithm, input_bytes = photo.len(), "Derived photo digest");

    PhotoDigest { data }
}
