//! Round Lifecycle Phases
//!
//! Derives the current phase from the clock and the revealed flag.
//! Derivation is recomputed on every query. It is purely a function of its
//! inputs, so there is no cached phase to go stale.

use std::fmt;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::clock::Timestamp;

/// Lifecycle phase of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Accepting guesses.
    Started,
    /// Guessing closed, waiting for the operator to reveal.
    RevealPeriod,
    /// Answer revealed, winners may claim proportional shares.
    Revealed,
    /// The operator failed to reveal in time; equal-split refunds.
    Scammed,
    /// Revealed but prizes went unclaimed; equal-split claims for everyone.
    WinnerNoShow,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Started => "started",
            Phase::RevealPeriod => "reveal-period",
            Phase::Revealed => "revealed",
            Phase::Scammed => "scammed",
            Phase::WinnerNoShow => "winner-no-show",
        };
        write!(f, "{}", name)
    }
}

/// Schedule construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Scam epoch does not come strictly after the reveal epoch.
    #[error("scam epoch {scam} must be after reveal epoch {reveal}")]
    ScamNotAfterReveal {
        /// Configured reveal epoch.
        reveal: Timestamp,
        /// Configured scam epoch.
        scam: Timestamp,
    },
    /// Winner-no-show epoch does not come strictly after the scam epoch.
    #[error("winner no-show epoch {no_show} must be after scam epoch {scam}")]
    NoShowNotAfterScam {
        /// Configured scam epoch.
        scam: Timestamp,
        /// Configured (or defaulted) winner-no-show epoch.
        no_show: Timestamp,
    },
}

/// The three epoch thresholds separating round phases.
///
/// Strictly increasing, validated once at construction and immutable after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Guessing closes here; the reveal window opens.
    pub reveal_epoch: Timestamp,
    /// The reveal window closes here; an unrevealed round is scammed.
    pub scam_epoch: Timestamp,
    /// After a reveal, unclaimed prizes open up to everyone here.
    pub winner_no_show_epoch: Timestamp,
}

impl EpochSchedule {
    /// Build a validated schedule.
    ///
    /// When `winner_no_show_epoch` is absent it defaults to one
    /// reveal-window length past the scam epoch.
    pub fn new(
        reveal_epoch: Timestamp,
        scam_epoch: Timestamp,
        winner_no_show_epoch: Option<Timestamp>,
    ) -> Result<Self, ScheduleError> {
        if scam_epoch <= reveal_epoch {
            return Err(ScheduleError::ScamNotAfterReveal {
                reveal: reveal_epoch,
                scam: scam_epoch,
            });
        }

        let no_show = winner_no_show_epoch.unwrap_or_else(|| {
            scam_epoch.saturating_add(scam_epoch.saturating_since(reveal_epoch))
        });

        if no_show <= scam_epoch {
            return Err(ScheduleError::NoShowNotAfterScam {
                scam: scam_epoch,
                no_show,
            });
        }

        Ok(Self {
            reveal_epoch,
            scam_epoch,
            winner_no_show_epoch: no_show,
        })
    }

    /// Phase at `now`, given whether the answer has been revealed.
    pub fn phase_at(&self, now: Timestamp, revealed: bool) -> Phase {
        if revealed {
            if now < self.winner_no_show_epoch {
                Phase::Revealed
            } else {
                Phase::WinnerNoShow
            }
        } else if now < self.reveal_epoch {
            Phase::Started
        } else if now < self.scam_epoch {
            Phase::RevealPeriod
        } else {
            Phase::Scammed
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
