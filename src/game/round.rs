//! Guess Registry & Payout Ledger
//!
//! The round singleton. Records each participant's commitment exactly once,
//! tallies identical commitments, and on settlement disburses shares out of
//! a strictly shrinking pool.
//!
//! Two rules hold everywhere:
//! - validation precedes mutation: a rejected operation writes nothing;
//! - deletion precedes transfer: a claimant's commitment and tally entry are
//!   gone before the treasury runs, so the transfer step cannot re-enter
//!   payout logic for the same commitment.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::clock::Clock;
use crate::core::hash::Hash32;
use crate::core::identity::{Identity, IdentityProvider};
use crate::game::commitment::{self, Salt};
use crate::game::events::{PayoutKind, RoundEvent};
use crate::game::phase::{EpochSchedule, Phase, ScheduleError};
use crate::game::treasury::{Amount, Treasury, TransferError};

/// A participant's active, unpaid guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Committer and payout recipient.
    pub owner: Identity,
    /// One-way commitment of the plaintext guess.
    pub guess_hash: Hash32,
}

/// Rejected operations.
///
/// Every precondition is checked before any state write, so each of these
/// leaves the round exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// Guessing is only open during the started phase.
    #[error("guessing is closed (phase: {phase})")]
    GuessClosed {
        /// Phase the round was in.
        phase: Phase,
    },
    /// The caller already has an active commitment.
    #[error("caller already placed a guess")]
    AlreadyGuessed,
    /// Reveal attempted while guessing is still open.
    #[error("too early to reveal")]
    RevealTooEarly,
    /// Reveal attempted after the reveal window closed.
    #[error("too late to reveal")]
    RevealTooLate,
    /// The answer has already been revealed.
    #[error("answer already revealed")]
    AlreadyRevealed,
    /// The supplied phrase/salt pair does not hash to the committed target.
    #[error("phrase and salt do not match the committed winning hash")]
    RevealMismatch,
    /// Claim attempted by an identity with no active commitment.
    #[error("caller has no active guess")]
    NotAPlayer,
    /// Claim attempted before any settlement phase.
    #[error("game still running (phase: {phase})")]
    StillRunning {
        /// Phase the round was in.
        phase: Phase,
    },
    /// Claim during the revealed phase by a non-matching guess.
    #[error("guess does not match the revealed answer")]
    NotAWinner,
    /// The treasury failed after the commitment was already settled.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Immutable parameters of a round, fixed at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Initial funding; becomes the starting pool balance.
    pub funding: Amount,
    /// Epoch schedule gating the lifecycle.
    pub schedule: EpochSchedule,
    /// Pre-committed target: `create_winning_hash(phrase, salt)`.
    pub winning_hash: Hash32,
}

/// A single commit-reveal prize round.
///
/// Exclusively owns its commitment set and tally; all mutation goes through
/// the three operations below.
pub struct Round {
    schedule: EpochSchedule,
    winning_hash: Hash32,
    revealed: bool,
    salt: Option<Salt>,
    pool_balance: Amount,

    /// Active commitments keyed by owner (BTreeMap for deterministic
    /// iteration).
    commitments: BTreeMap<Identity, Commitment>,
    /// Count of active commitments per guess hash.
    tally: BTreeMap<Hash32, u32>,

    clock: Arc<dyn Clock>,
    identity: Arc<dyn IdentityProvider>,

    /// Events generated by mutating operations (drained by `take_events`).
    pending_events: Vec<RoundEvent>,
}

impl Round {
    /// Open a round from its immutable parameters and providers.
    ///
    /// The schedule is re-validated here: a config that arrived through
    /// deserialization never went through [`EpochSchedule::new`].
    pub fn new(
        config: RoundConfig,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ScheduleError> {
        let schedule = EpochSchedule::new(
            config.schedule.reveal_epoch,
            config.schedule.scam_epoch,
            Some(config.schedule.winner_no_show_epoch),
        )?;

        Ok(Self {
            schedule,
            winning_hash: config.winning_hash,
            revealed: false,
            salt: None,
            pool_balance: config.funding,
            commitments: BTreeMap::new(),
            tally: BTreeMap::new(),
            clock,
            identity,
            pending_events: Vec::new(),
        })
    }

    /// Current lifecycle phase, recomputed from provider time.
    pub fn phase(&self) -> Phase {
        self.schedule.phase_at(self.clock.now(), self.revealed)
    }

    /// Undistributed pool balance.
    pub fn pool_balance(&self) -> Amount {
        self.pool_balance
    }

    /// Has the answer been revealed?
    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// The disclosed salt, if revealed.
    pub fn salt(&self) -> Option<Salt> {
        self.salt
    }

    /// The pre-committed winning hash.
    pub fn winning_hash(&self) -> Hash32 {
        self.winning_hash
    }

    /// The epoch schedule.
    pub fn schedule(&self) -> EpochSchedule {
        self.schedule
    }

    /// Total active commitments.
    pub fn guess_count(&self) -> u32 {
        self.commitments.len() as u32
    }

    /// Active commitments sharing `guess_hash`.
    pub fn tally_of(&self, guess_hash: &Hash32) -> u32 {
        self.tally.get(guess_hash).copied().unwrap_or(0)
    }

    /// The active commitment of `owner`, if any.
    pub fn commitment_of(&self, owner: &Identity) -> Option<&Commitment> {
        self.commitments.get(owner)
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Record the caller's commitment.
    ///
    /// Only while guessing is open, and at most once per resolved identity.
    pub fn make_guess(&mut self, caller: Identity, guess_hash: Hash32) -> Result<(), RoundError> {
        let now = self.clock.now();
        let owner = self.identity.resolve(caller);

        if self.commitments.contains_key(&owner) {
            return Err(RoundError::AlreadyGuessed);
        }

        let phase = self.schedule.phase_at(now, self.revealed);
        if phase != Phase::Started {
            return Err(RoundError::GuessClosed { phase });
        }

        self.commitments.insert(owner, Commitment { owner, guess_hash });
        *self.tally.entry(guess_hash).or_insert(0) += 1;

        debug!(
            player = %owner.short_hex(),
            hash = %hex::encode(&guess_hash[..4]),
            "guess committed"
        );
        self.pending_events
            .push(RoundEvent::guess_placed(now, owner, guess_hash));
        Ok(())
    }

    /// Disclose the winning phrase and salt.
    ///
    /// Accepted only during the reveal period, and only when the pair
    /// hashes to the pre-committed target. This is the only path that can
    /// ever set the revealed flag.
    pub fn reveal_answer(&mut self, phrase: &str, salt: Salt) -> Result<(), RoundError> {
        let now = self.clock.now();

        match self.schedule.phase_at(now, self.revealed) {
            Phase::Started => return Err(RoundError::RevealTooEarly),
            Phase::Scammed => return Err(RoundError::RevealTooLate),
            Phase::Revealed | Phase::WinnerNoShow => return Err(RoundError::AlreadyRevealed),
            Phase::RevealPeriod => {}
        }

        if commitment::create_winning_hash(phrase, &salt) != self.winning_hash {
            return Err(RoundError::RevealMismatch);
        }

        self.revealed = true;
        self.salt = Some(salt);

        info!(phrase, "answer revealed");
        self.pending_events
            .push(RoundEvent::answer_revealed(now, phrase.to_string(), salt));
        Ok(())
    }

    /// Pay the caller their share of the pool.
    ///
    /// Phase decides the rule: proportional split among matching guesses
    /// after a reveal, equal split for everyone once the round is scammed
    /// or winners failed to show. Floor division runs over the balance held
    /// right now, so claim order can shift individual payouts by one unit;
    /// the total never exceeds the original funding.
    ///
    /// Returns the amount paid. A `Transfer` error reports a failed sink
    /// after the commitment is already settled; the claim is spent either
    /// way.
    pub fn claim_prize(
        &mut self,
        caller: Identity,
        treasury: &mut dyn Treasury,
    ) -> Result<Amount, RoundError> {
        let now = self.clock.now();
        let owner = self.identity.resolve(caller);

        let claimed = match self.commitments.get(&owner) {
            Some(c) => *c,
            None => return Err(RoundError::NotAPlayer),
        };

        let phase = self.schedule.phase_at(now, self.revealed);
        let (payout, kind) = match phase {
            Phase::Started | Phase::RevealPeriod => {
                return Err(RoundError::StillRunning { phase });
            }
            Phase::Revealed => {
                let salt = self
                    .salt
                    .unwrap_or_else(|| panic!("revealed round carries no salt"));
                if commitment::winning_hash(&claimed.guess_hash, &salt) != self.winning_hash {
                    return Err(RoundError::NotAWinner);
                }
                let tally = self.tally_of(&claimed.guess_hash);
                assert!(tally > 0, "live commitment with zero tally");
                (self.pool_balance / Amount::from(tally), PayoutKind::WinnerShare)
            }
            Phase::Scammed | Phase::WinnerNoShow => {
                let count = self.guess_count();
                assert!(count > 0, "claim admitted with zero active guesses");
                let kind = if phase == Phase::Scammed {
                    PayoutKind::ScamRefund
                } else {
                    PayoutKind::NoShowShare
                };
                (self.pool_balance / Amount::from(count), kind)
            }
        };

        // Settle first, transfer last.
        self.remove_commitment(&claimed);
        self.pool_balance = self
            .pool_balance
            .checked_sub(payout)
            .unwrap_or_else(|| panic!("payout {} exceeds pool {}", payout, self.pool_balance));

        info!(
            player = %owner.short_hex(),
            amount = payout,
            kind = ?kind,
            pool = self.pool_balance,
            "prize paid"
        );
        self.pending_events
            .push(RoundEvent::prize_paid(now, owner, payout, kind, self.pool_balance));

        treasury.transfer(owner, payout)?;
        Ok(payout)
    }

    /// Remove a paid commitment and decrement its tally entry.
    fn remove_commitment(&mut self, claimed: &Commitment) {
        self.commitments.remove(&claimed.owner);
        match self.tally.get_mut(&claimed.guess_hash) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                self.tally.remove(&claimed.guess_hash);
            }
            None => panic!("commitment without matching tally entry"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::core::clock::{ManualClock, Timestamp};
    use crate::core::identity::{Passthrough, RemapProvider};
    use crate::game::commitment::{create_winning_hash, hash_guess};
    use crate::game::events::RoundEventData;
    use crate::game::treasury::CreditLedger;

    const PHRASE: &str = "lima";
    const SALT: Salt = [7; 32];

    const T_REVEAL: u64 = 100;
    const T_SCAM: u64 = 200;
    const T_NO_SHOW: u64 = 300;

    fn player(n: u8) -> Identity {
        Identity::new([n; 16])
    }

    fn open_round(funding: Amount) -> (Round, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_secs(0));
        let config = RoundConfig {
            funding,
            schedule: EpochSchedule::new(
                Timestamp::from_secs(T_REVEAL),
                Timestamp::from_secs(T_SCAM),
                Some(Timestamp::from_secs(T_NO_SHOW)),
            )
            .unwrap(),
            winning_hash: create_winning_hash(PHRASE, &SALT),
        };
        let round = Round::new(config, Arc::new(clock.clone()), Arc::new(Passthrough)).unwrap();
        (round, clock)
    }

    #[test]
    fn test_single_winner_takes_full_pool() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();

        clock.advance(T_REVEAL + 50);
        round.reveal_answer(PHRASE, SALT).unwrap();
        assert_eq!(round.phase(), Phase::Revealed);

        let paid = round.claim_prize(player(1), &mut ledger).unwrap();
        assert_eq!(paid, 5);
        assert_eq!(round.pool_balance(), 0);
        assert_eq!(ledger.credit_of(&player(1)), 5);
    }

    #[test]
    fn test_three_winners_split_in_claim_order() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        for n in 1..=3 {
            round.make_guess(player(n), hash_guess(PHRASE)).unwrap();
        }

        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();

        // First claimant absorbs the floor-division shortfall; later
        // claimants re-divide the shrinking remainder.
        assert_eq!(round.claim_prize(player(1), &mut ledger).unwrap(), 1);
        assert_eq!(round.claim_prize(player(2), &mut ledger).unwrap(), 2);
        assert_eq!(round.claim_prize(player(3), &mut ledger).unwrap(), 2);

        assert_eq!(ledger.total_paid(), 5);
        assert_eq!(round.pool_balance(), 0);
    }

    #[test]
    fn test_loser_rejected_while_winners_split() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();
        round.make_guess(player(2), hash_guess(PHRASE)).unwrap();
        round.make_guess(player(3), hash_guess("cusco")).unwrap();

        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();

        let err = round.claim_prize(player(3), &mut ledger).unwrap_err();
        assert_eq!(err, RoundError::NotAWinner);
        assert_eq!(round.pool_balance(), 5);
        assert_eq!(ledger.total_paid(), 0);

        // Winners divide by their own tally, not the head count.
        assert_eq!(round.claim_prize(player(1), &mut ledger).unwrap(), 2);
        assert_eq!(round.claim_prize(player(2), &mut ledger).unwrap(), 3);
        assert_eq!(ledger.total_paid(), 5);
    }

    #[test]
    fn test_scam_refunds_equal_share() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();
        round.make_guess(player(2), hash_guess("cusco")).unwrap();
        round.make_guess(player(3), hash_guess("arequipa")).unwrap();

        // No reveal before the scam epoch.
        clock.advance(T_SCAM);
        assert_eq!(round.phase(), Phase::Scammed);

        assert_eq!(round.claim_prize(player(2), &mut ledger).unwrap(), 1);
        assert_eq!(round.claim_prize(player(1), &mut ledger).unwrap(), 2);
        assert_eq!(round.claim_prize(player(3), &mut ledger).unwrap(), 2);

        assert_eq!(ledger.total_paid(), 5);
        assert_eq!(round.pool_balance(), 0);
    }

    #[test]
    fn test_claim_while_running_rejected() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();

        let err = round.claim_prize(player(1), &mut ledger).unwrap_err();
        assert!(matches!(err, RoundError::StillRunning { phase: Phase::Started }));

        clock.advance(T_REVEAL);
        let err = round.claim_prize(player(1), &mut ledger).unwrap_err();
        assert!(matches!(err, RoundError::StillRunning { phase: Phase::RevealPeriod }));

        assert_eq!(round.pool_balance(), 5);
        assert_eq!(ledger.total_paid(), 0);
        assert!(round.commitment_of(&player(1)).is_some());
    }

    #[test]
    fn test_duplicate_guess_rejected() {
        let (mut round, _clock) = open_round(5);

        round.make_guess(player(1), hash_guess("a")).unwrap();
        let err = round.make_guess(player(1), hash_guess("b")).unwrap_err();

        assert_eq!(err, RoundError::AlreadyGuessed);
        assert_eq!(round.guess_count(), 1);
        assert_eq!(round.commitment_of(&player(1)).unwrap().guess_hash, hash_guess("a"));
    }

    #[test]
    fn test_guess_after_window_rejected() {
        let (mut round, clock) = open_round(5);

        clock.advance(T_REVEAL);
        let err = round.make_guess(player(1), hash_guess("a")).unwrap_err();
        assert!(matches!(err, RoundError::GuessClosed { phase: Phase::RevealPeriod }));
        assert_eq!(round.guess_count(), 0);
    }

    #[test]
    fn test_claim_without_guess_rejected() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        clock.advance(T_SCAM);
        let err = round.claim_prize(player(1), &mut ledger).unwrap_err();
        assert_eq!(err, RoundError::NotAPlayer);
    }

    #[test]
    fn test_reveal_gating() {
        let (mut round, clock) = open_round(5);

        // Too early.
        let err = round.reveal_answer(PHRASE, SALT).unwrap_err();
        assert_eq!(err, RoundError::RevealTooEarly);
        assert!(!round.revealed());

        // Mismatch inside the window mutates nothing.
        clock.advance(T_REVEAL);
        let err = round.reveal_answer(PHRASE, [8; 32]).unwrap_err();
        assert_eq!(err, RoundError::RevealMismatch);
        let err = round.reveal_answer("wrong phrase", SALT).unwrap_err();
        assert_eq!(err, RoundError::RevealMismatch);
        assert!(!round.revealed());
        assert_eq!(round.salt(), None);

        // Success, then a second reveal is rejected.
        round.reveal_answer(PHRASE, SALT).unwrap();
        assert!(round.revealed());
        assert_eq!(round.salt(), Some(SALT));
        let err = round.reveal_answer(PHRASE, SALT).unwrap_err();
        assert_eq!(err, RoundError::AlreadyRevealed);
    }

    #[test]
    fn test_reveal_after_scam_epoch_rejected() {
        let (mut round, clock) = open_round(5);

        clock.advance(T_SCAM);
        let err = round.reveal_answer(PHRASE, SALT).unwrap_err();
        assert_eq!(err, RoundError::RevealTooLate);
        assert!(!round.revealed());
    }

    #[test]
    fn test_at_most_one_payout_per_identity() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();
        round.make_guess(player(2), hash_guess(PHRASE)).unwrap();

        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();

        round.claim_prize(player(1), &mut ledger).unwrap();
        let err = round.claim_prize(player(1), &mut ledger).unwrap_err();
        assert_eq!(err, RoundError::NotAPlayer);

        // A paid guess no longer counts toward the tally.
        assert_eq!(round.tally_of(&hash_guess(PHRASE)), 1);
        assert_eq!(round.guess_count(), 1);
    }

    #[test]
    fn test_loser_collects_no_show_share() {
        let (mut round, clock) = open_round(6);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();
        round.make_guess(player(2), hash_guess("cusco")).unwrap();

        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();

        // Rejected as a loser while the winner-claim window is open...
        let err = round.claim_prize(player(2), &mut ledger).unwrap_err();
        assert_eq!(err, RoundError::NotAWinner);

        // ...but the commitment survives into the no-show phase, where
        // everyone remaining takes an equal cut.
        clock.advance_to(Timestamp::from_secs(T_NO_SHOW));
        assert_eq!(round.phase(), Phase::WinnerNoShow);
        assert_eq!(round.claim_prize(player(2), &mut ledger).unwrap(), 3);
        assert_eq!(round.claim_prize(player(1), &mut ledger).unwrap(), 3);
        assert_eq!(ledger.total_paid(), 6);
    }

    #[test]
    fn test_identity_provider_resolves_caller() {
        let alice = player(1);
        let bob = player(2);

        let clock = ManualClock::new(Timestamp::from_secs(0));
        let config = RoundConfig {
            funding: 5,
            schedule: EpochSchedule::new(
                Timestamp::from_secs(T_REVEAL),
                Timestamp::from_secs(T_SCAM),
                None,
            )
            .unwrap(),
            winning_hash: create_winning_hash(PHRASE, &SALT),
        };
        let provider = RemapProvider::new().with_mapping(alice, bob);
        let mut round =
            Round::new(config, Arc::new(clock.clone()), Arc::new(provider)).unwrap();

        round.make_guess(alice, hash_guess(PHRASE)).unwrap();

        // The commitment landed under the resolved identity.
        assert!(round.commitment_of(&bob).is_some());
        assert!(round.commitment_of(&alice).is_none());

        // And the resolved identity is the payout recipient.
        let mut ledger = CreditLedger::new();
        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();
        round.claim_prize(alice, &mut ledger).unwrap();
        assert_eq!(ledger.credit_of(&bob), 5);
        assert_eq!(ledger.credit_of(&alice), 0);
    }

    #[test]
    fn test_events_trace_the_round() {
        let (mut round, clock) = open_round(5);
        let mut ledger = CreditLedger::new();

        round.make_guess(player(1), hash_guess(PHRASE)).unwrap();
        clock.advance(T_REVEAL);
        round.reveal_answer(PHRASE, SALT).unwrap();
        round.claim_prize(player(1), &mut ledger).unwrap();

        let events = round.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].data, RoundEventData::GuessPlaced { .. }));
        assert!(matches!(events[1].data, RoundEventData::AnswerRevealed { .. }));
        assert!(matches!(
            events[2].data,
            RoundEventData::PrizePaid {
                amount: 5,
                kind: PayoutKind::WinnerShare,
                pool_remaining: 0,
                ..
            }
        ));

        // Draining is destructive.
        assert!(round.take_events().is_empty());
    }

    proptest! {
        /// Conservation: no sequence of guesses and claims pays out more
        /// than the original funding, and the pool equals funding minus
        /// everything paid.
        #[test]
        fn prop_payouts_never_exceed_funding(
            funding in 0u64..10_000,
            winner_flags in proptest::collection::vec(proptest::bool::ANY, 1..8),
        ) {
            let (mut round, clock) = open_round(funding);
            let mut ledger = CreditLedger::new();

            for (i, is_winner) in winner_flags.iter().enumerate() {
                let guess = if *is_winner {
                    hash_guess(PHRASE)
                } else {
                    hash_guess(&format!("miss-{}", i))
                };
                round.make_guess(player(i as u8 + 1), guess).unwrap();
            }

            clock.advance(T_REVEAL);
            round.reveal_answer(PHRASE, SALT).unwrap();

            // Winners claim during the revealed window; losers bounce.
            for (i, is_winner) in winner_flags.iter().enumerate() {
                let result = round.claim_prize(player(i as u8 + 1), &mut ledger);
                prop_assert_eq!(result.is_ok(), *is_winner);
            }

            // Everyone left claims the no-show split.
            clock.advance_to(Timestamp::from_secs(T_NO_SHOW));
            for (i, is_winner) in winner_flags.iter().enumerate() {
                if !is_winner {
                    round.claim_prize(player(i as u8 + 1), &mut ledger).unwrap();
                }
            }

            prop_assert!(ledger.total_paid() <= funding);
            prop_assert_eq!(round.pool_balance(), funding - ledger.total_paid());
            prop_assert_eq!(round.guess_count(), 0);
        }
    }
}
