//! Identity Provider
//!
//! Resolves the effective caller identity for an operation.
//! The resolved identity is the key for commitments and the payout
//! recipient, so resolution sits in front of every mutating call.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

/// Unique participant identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct Identity(pub [u8; 16]);

impl Identity {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Generate a fresh random identity.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Abbreviated hex form for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Resolves the effective caller identity for an operation.
pub trait IdentityProvider: Send + Sync {
    /// Map the raw caller to the identity the game should act for.
    fn resolve(&self, raw: Identity) -> Identity;
}

/// Production resolver: callers act as themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl IdentityProvider for Passthrough {
    fn resolve(&self, raw: Identity) -> Identity {
        raw
    }
}

/// Table-driven resolver remapping selected callers.
///
/// Unmapped callers fall through unchanged. Used by tests and by harnesses
/// that play on behalf of other identities.
#[derive(Clone, Debug, Default)]
pub struct RemapProvider {
    map: BTreeMap<Identity, Identity>,
}

impl RemapProvider {
    /// Create an empty remap table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, replacing any previous one for `from`.
    pub fn with_mapping(mut self, from: Identity, to: Identity) -> Self {
        self.map.insert(from, to);
        self
    }
}

impl IdentityProvider for RemapProvider {
    fn resolve(&self, raw: Identity) -> Identity {
        self.map.get(&raw).copied().unwrap_or(raw)
    }
}

// =============================================================================
// TESTS
// =============================================================================
