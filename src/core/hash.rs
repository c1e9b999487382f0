//! Hashing Primitives
//!
//! Domain-separated SHA-256 used by:
//! - The commitment scheme (guess and winning hashes)
//! - Identity derivation from auth subjects
//!
//! Every hash in the crate goes through a domain separator so values from
//! one context can never be replayed in another.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Hash32 = [u8; 32];

/// Domain-separated SHA-256 hasher.
///
/// Wraps SHA-256 with helpers for the fixed-width types the game hashes.
/// Order of updates is part of the hash definition.
pub struct DomainHasher {
    hasher: Sha256,
}

impl DomainHasher {
    /// Create a new hasher seeded with a domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a fixed 32-byte value (hashes, salts).
    #[inline]
    pub fn update_hash(&mut self, value: &Hash32) {
        self.hasher.update(value);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash32 {
        self.hasher.finalize().into()
    }
}

/// Compute hash of data under a domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash32 {
    let mut hasher = DomainHasher::new(domain);
    hasher.update_bytes(data);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
