//! # Quizpot Game Engine
//!
//! Commit-reveal prize game with an epoch-gated payout ledger.
//! Participants commit hidden guesses, the operator reveals a salted
//! answer, and the pooled stake is paid out exactly once per participant.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUIZPOT                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Providers and primitives                  │
//! │  ├── clock.rs    - Clock provider (system + manual)          │
//! │  ├── identity.rs - Identity provider (passthrough + remap)   │
//! │  └── hash.rs     - Domain-separated SHA-256                  │
//! │                                                              │
//! │  game/           - Round logic (deterministic)               │
//! │  ├── commitment.rs - Two-stage guess commitment scheme       │
//! │  ├── phase.rs    - Epoch schedule and phase derivation       │
//! │  ├── round.rs    - Guess registry and payout ledger          │
//! │  ├── treasury.rs - Value-transfer seam                       │
//! │  └── events.rs   - Round events for audit/observers          │
//! │                                                              │
//! │  service/        - Outer shell (non-deterministic)           │
//! │  ├── actor.rs    - Single-writer round actor                 │
//! │  └── auth.rs     - Bearer-token caller resolution            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Settlement Guarantees
//!
//! The `game/` module upholds, for every sequence of calls:
//! - conservation: payouts never exceed the original funding;
//! - at-most-once payout per identity, enforced by deleting the
//!   commitment before the value transfer runs;
//! - phase monotonicity along
//!   `Started → RevealPeriod → {Revealed | Scammed} → WinnerNoShow`;
//! - reveal integrity: only the pre-committed phrase/salt pair is accepted.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod service;

// Re-export commonly used types
pub use crate::core::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::core::hash::Hash32;
pub use crate::core::identity::{Identity, IdentityProvider, Passthrough, RemapProvider};
pub use crate::game::commitment::{create_winning_hash, hash_guess, winning_hash, Salt};
pub use crate::game::phase::{EpochSchedule, Phase};
pub use crate::game::round::{Round, RoundConfig, RoundError};
pub use crate::game::treasury::{Amount, CreditLedger, Treasury};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
