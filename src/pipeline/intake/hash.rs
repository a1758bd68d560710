use std::fmt;

use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::IntakeError;

/// Fixed-length perceptual fingerprint of an image (256 bits when produced
/// by [`compute_perceptual_hash`]).
///
/// Stored as raw bytes; serialized as standard base64 so registry
/// snapshots and assessment JSON stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualHash(Vec<u8>);

impl PerceptualHash {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bit_len(&self) -> usize {
        self.0.len() * 8
    }

    /// Number of differing bits. Bytes past the end of the shorter hash
    /// count as fully different, which keeps the distance symmetric.
    pub fn hamming_distance(&self, other: &PerceptualHash) -> u32 {
        let common: u32 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let extra = self.0.len().abs_diff(other.0.len()) as u32 * 8;
        common + extra
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, IntakeError> {
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| IntakeError::InvalidHash(e.to_string()))
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for PerceptualHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PerceptualHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Compute the perceptual hash of a decoded image.
/// Row gradient over a 17x16 thumbnail: one bit per pixel pair, 256 bits
/// total. Survives resizing and mild recompression.
pub fn compute_perceptual_hash(img: &DynamicImage) -> PerceptualHash {
    let hasher = img_hash::HasherConfig::new()
        .hash_alg(img_hash::HashAlg::Gradient)
        .hash_size(16, 16)
        .to_hasher();

    let hash = hasher.hash_image(img);
    PerceptualHash(hash.as_bytes().to_vec())
}

/// SHA-256 content hash, base64-encoded.
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    base64::engine::general_purpose::STANDARD.encode(hash)
}

/// Decode image bytes into a `DynamicImage`.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, IntakeError> {
    image::load_from_memory(bytes).map_err(|e| IntakeError::ImageProcessing(e.to_string()))
}
