//! Round Logic Module
//!
//! The deterministic core of the game. Everything here is a pure function
//! of its inputs and the injected providers.
//!
//! ## Module Structure
//!
//! - `commitment`: two-stage hash commitment scheme
//! - `phase`: epoch schedule and lifecycle phase derivation
//! - `round`: guess registry and payout ledger
//! - `treasury`: value-transfer seam and in-memory credit ledger
//! - `events`: events emitted by mutating operations

pub mod commitment;
pub mod phase;
pub mod round;
pub mod treasury;
pub mod events;

// Re-export key types
pub use commitment::{Salt, hash_guess, winning_hash, create_winning_hash};
pub use phase::{Phase, EpochSchedule, ScheduleError};
pub use round::{Round, RoundConfig, RoundError, Commitment};
pub use treasury::{Amount, Treasury, TransferError, CreditLedger};
pub use events::{RoundEvent, RoundEventData, PayoutKind};
