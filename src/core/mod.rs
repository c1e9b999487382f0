//! Core providers and primitives.
//!
//! The two interfaces the game consumes (clock, identity) plus the hashing
//! primitives everything is built on. Nothing in here knows about rounds.

pub mod clock;
pub mod identity;
pub mod hash;

// Re-export core types
pub use clock::{Clock, SystemClock, ManualClock, Timestamp};
pub use identity::{Identity, IdentityProvider, Passthrough, RemapProvider};
pub use hash::{Hash32, DomainHasher, hash_with_domain};
