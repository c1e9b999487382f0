//! Round Events
//!
//! Events generated by mutating operations, for audit logs and observers.
//! The round buffers them; callers drain with `Round::take_events`.

use serde::{Serialize, Deserialize};

use crate::core::clock::Timestamp;
use crate::core::hash::Hash32;
use crate::core::identity::Identity;
use crate::game::commitment::Salt;
use crate::game::treasury::Amount;

/// Which payout rule produced a payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutKind {
    /// Proportional share among matching guesses after a reveal.
    WinnerShare,
    /// Equal split after the operator failed to reveal in time.
    ScamRefund,
    /// Equal split after a reveal whose winners did not all show.
    NoShowShare,
}

/// Round event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RoundEventData {
    /// A participant committed a guess.
    GuessPlaced {
        /// Resolved committer identity.
        player: Identity,
        /// The committed guess hash.
        guess_hash: Hash32,
    },

    /// The operator disclosed the winning phrase and salt.
    AnswerRevealed {
        /// The plaintext winning phrase, now public for audit.
        phrase: String,
        /// The salt that was bound to the winning hash.
        salt: Salt,
    },

    /// A participant was paid out and left the round.
    PrizePaid {
        /// Paid identity.
        player: Identity,
        /// Units transferred.
        amount: Amount,
        /// Payout rule applied.
        kind: PayoutKind,
        /// Pool balance remaining after this payment.
        pool_remaining: Amount,
    },
}

/// A timestamped round event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundEvent {
    /// Provider time when the operation ran.
    pub at: Timestamp,
    /// What happened.
    pub data: RoundEventData,
}

impl RoundEvent {
    /// Create a guess-placed event.
    pub fn guess_placed(at: Timestamp, player: Identity, guess_hash: Hash32) -> Self {
        Self {
            at,
            data: RoundEventData::GuessPlaced { player, guess_hash },
        }
    }

    /// Create an answer-revealed event.
    pub fn answer_revealed(at: Timestamp, phrase: String, salt: Salt) -> Self {
        Self {
            at,
            data: RoundEventData::AnswerRevealed { phrase, salt },
        }
    }

    /// Create a prize-paid event.
    pub fn prize_paid(
        at: Timestamp,
        player: Identity,
        amount: Amount,
        kind: PayoutKind,
        pool_remaining: Amount,
    ) -> Self {
        Self {
            at,
            data: RoundEventData::PrizePaid {
                player,
                amount,
                kind,
                pool_remaining,
            },
        }
    }
}
