//! Perceptual-hash registry used for cross-claim duplicate detection.
//!
//! A best-effort fraud signal, not a system of record: the in-memory store
//! lives for the process lifetime and may be lost on restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::pipeline::intake::PerceptualHash;

/// One stored hash that lies close to the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashMatch {
    pub claim_id: String,
    pub distance: u32,
}

/// Store of perceptual hashes keyed by claim identifier.
///
/// Implementations must make `append` atomic per call. Lost updates under
/// concurrent appends only weaken duplicate detection.
pub trait HashRegistry: Send + Sync {
    /// Stored hashes with Hamming distance strictly below `max_distance`,
    /// skipping every hash registered under `exclude_claim_id`.
    fn lookup(
        &self,
        hash: &PerceptualHash,
        exclude_claim_id: Option<&str>,
        max_distance: u32,
    ) -> Vec<HashMatch>;

    /// Register a hash under a claim. Appends, never overwrites.
    fn append(&self, claim_id: &str, hash: PerceptualHash);
}

/// Process-local registry. Ordered by claim id so lookups are deterministic.
#[derive(Debug, Default)]
pub struct InMemoryHashRegistry {
    entries: RwLock<BTreeMap<String, Vec<PerceptualHash>>>,
}

impl InMemoryHashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with known hashes.
    pub fn seeded<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = (String, PerceptualHash)>,
    {
        let registry = Self::new();
        for (claim_id, hash) in seed {
            registry.append(&claim_id, hash);
        }
        registry
    }

    /// Total number of stored hashes.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim ids that have at least one stored hash.
    pub fn claims(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }

    pub fn hashes_for(&self, claim_id: &str) -> Vec<PerceptualHash> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(claim_id).cloned().unwrap_or_default()
    }
}

impl HashRegistry for InMemoryHashRegistry {
    fn lookup(
        &self,
        hash: &PerceptualHash,
        exclude_claim_id: Option<&str>,
        max_distance: u32,
    ) -> Vec<HashMatch> {
        // A poisoned lock still holds valid data: appends are single pushes.
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(claim_id, _)| Some(claim_id.as_str()) != exclude_claim_id)
            .flat_map(|(claim_id, hashes)| {
                hashes.iter().filter_map(move |stored| {
                    let distance = stored.hamming_distance(hash);
                    (distance < max_distance).then(|| HashMatch {
                        claim_id: claim_id.clone(),
                        distance,
                    })
                })
            })
            .collect()
    }

    fn append(&self, claim_id: &str, hash: PerceptualHash) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(claim_id.to_string()).or_default().push(hash);
    }
}
