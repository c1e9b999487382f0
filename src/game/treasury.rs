//! Value Transfer Seam
//!
//! The round decides how much goes to whom; an injected `Treasury`
//! performs the actual transfer. The round has already deleted the
//! claimant's commitment by the time a transfer runs, so a failing or
//! misbehaving sink can never re-trigger payout logic.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::identity::Identity;

/// Indivisible units of pooled stake.
pub type Amount = u64;

/// Transfer failure reported by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The sink refused or could not complete the transfer.
    #[error("transfer of {amount} to {recipient} rejected: {reason}")]
    Rejected {
        /// Recipient identity (uuid form).
        recipient: String,
        /// Units that failed to move.
        amount: Amount,
        /// Sink-supplied reason.
        reason: String,
    },
}

/// Pays prize money out of the pool.
///
/// Implementations must not call back into the round.
pub trait Treasury: Send {
    /// Move `amount` units to `to`.
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferError>;
}

/// In-memory treasury accumulating credits per identity.
///
/// Infallible; used by the demo binary and tests to observe payouts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[derive(Default)]
pub struct CreditLedger {
    credits: BTreeMap<Identity, Amount>,
}

impl CreditLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units credited to `id` so far.
    pub fn credit_of(&self, id: &Identity) -> Amount {
        self.credits.get(id).copied().unwrap_or(0)
    }

    /// Sum of all credits ever paid.
    pub fn total_paid(&self) -> Amount {
        self.credits.values().copied().sum()
    }

    /// All credited identities with their amounts, in identity order.
    pub fn entries(&self) -> impl Iterator<Item = (&Identity, &Amount)> {
        self.credits.iter()
    }
}

impl Treasury for CreditLedger {
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferError> {
        *self.credits.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
