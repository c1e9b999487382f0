//! Single-Writer Round Actor
//!
//! Owns a `Round` and its treasury on one tokio task and serializes every
//! call through a command channel. Concurrent callers therefore observe
//! guess insertion, tally updates, and payout deletion atomically, and the
//! settle-then-transfer ordering inside the round is never interleaved.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::core::clock::Clock;
use crate::core::hash::Hash32;
use crate::core::identity::{Identity, IdentityProvider};
use crate::game::commitment::Salt;
use crate::game::events::RoundEvent;
use crate::game::phase::{Phase, ScheduleError};
use crate::game::round::{Round, RoundConfig, RoundError};
use crate::game::treasury::{Amount, Treasury};

/// Command channel depth.
const COMMAND_BUFFER: usize = 64;

/// Errors surfaced by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The round rejected the operation.
    #[error(transparent)]
    Round(#[from] RoundError),
    /// The actor task has shut down.
    #[error("round service is closed")]
    Closed,
}

/// Read-only snapshot of the round, taken on the actor task.
#[derive(Clone, Copy, Debug)]
pub struct RoundStatus {
    /// Phase at snapshot time.
    pub phase: Phase,
    /// Undistributed pool balance.
    pub pool_balance: Amount,
    /// Active commitments.
    pub guess_count: u32,
    /// Has the answer been revealed?
    pub revealed: bool,
}

enum Command {
    MakeGuess {
        caller: Identity,
        guess_hash: Hash32,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    RevealAnswer {
        phrase: String,
        salt: Salt,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    ClaimPrize {
        caller: Identity,
        reply: oneshot::Sender<Result<Amount, RoundError>>,
    },
    Status {
        reply: oneshot::Sender<RoundStatus>,
    },
    TakeEvents {
        reply: oneshot::Sender<Vec<RoundEvent>>,
    },
}

/// Cloneable handle onto a spawned round actor.
///
/// The actor exits when every handle is dropped.
#[derive(Clone)]
pub struct RoundHandle {
    tx: mpsc::Sender<Command>,
}

/// Spawn the actor that exclusively owns a round and its treasury.
pub fn spawn_round(
    config: RoundConfig,
    clock: Arc<dyn Clock>,
    identity: Arc<dyn IdentityProvider>,
    treasury: Box<dyn Treasury>,
) -> Result<RoundHandle, ScheduleError> {
    let round = Round::new(config, clock, identity)?;
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(run_round(round, treasury, rx));
    Ok(RoundHandle { tx })
}

async fn run_round(
    mut round: Round,
    mut treasury: Box<dyn Treasury>,
    mut rx: mpsc::Receiver<Command>,
) {
    info!("round actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::MakeGuess { caller, guess_hash, reply } => {
                let _ = reply.send(round.make_guess(caller, guess_hash));
            }
            Command::RevealAnswer { phrase, salt, reply } => {
                let _ = reply.send(round.reveal_answer(&phrase, salt));
            }
            Command::ClaimPrize { caller, reply } => {
                let _ = reply.send(round.claim_prize(caller, treasury.as_mut()));
            }
            Command::Status { reply } => {
                let _ = reply.send(RoundStatus {
                    phase: round.phase(),
                    pool_balance: round.pool_balance(),
                    guess_count: round.guess_count(),
                    revealed: round.revealed(),
                });
            }
            Command::TakeEvents { reply } => {
                let _ = reply.send(round.take_events());
            }
        }
    }

    debug!("round actor stopped");
}

impl RoundHandle {
    async fn call<T>(
        &self,
        cmd: Command,
        rx: oneshot::Receiver<Result<T, RoundError>>,
    ) -> Result<T, ServiceError> {
        self.tx.send(cmd).await.map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)?.map_err(ServiceError::Round)
    }

    /// Record the caller's commitment.
    pub async fn make_guess(
        &self,
        caller: Identity,
        guess_hash: Hash32,
    ) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.call(Command::MakeGuess { caller, guess_hash, reply }, rx).await
    }

    /// Disclose the winning phrase and salt.
    pub async fn reveal_answer(
        &self,
        phrase: impl Into<String>,
        salt: Salt,
    ) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.call(
            Command::RevealAnswer { phrase: phrase.into(), salt, reply },
            rx,
        )
        .await
    }

    /// Pay the caller their share of the pool.
    pub async fn claim_prize(&self, caller: Identity) -> Result<Amount, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.call(Command::ClaimPrize { caller, reply }, rx).await
    }

    /// Snapshot the round.
    pub async fn status(&self) -> Result<RoundStatus, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status { reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Drain buffered round events.
    pub async fn take_events(&self) -> Result<Vec<RoundEvent>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::TakeEvents { reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
