//! Quizpot Demo Server
//!
//! Drives one full commit-reveal round through the single-writer actor,
//! then shows the refund path of a round whose operator never reveals.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use quizpot::{
    VERSION,
    core::clock::{ManualClock, Timestamp},
    core::identity::{Identity, Passthrough},
    game::commitment::{create_winning_hash, hash_guess, Salt},
    game::events::RoundEventData,
    game::phase::EpochSchedule,
    game::round::RoundConfig,
    game::treasury::{Amount, CreditLedger},
    service::actor::{spawn_round, RoundHandle},
};

const PHRASE: &str = "the answer is quizpot";
const SALT: Salt = [42; 32];

const FUNDING: Amount = 1_000;
const T_REVEAL: u64 = 100;
const T_SCAM: u64 = 200;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Quizpot Server v{}", VERSION);

    demo_revealed_round().await?;
    demo_scammed_round().await?;

    Ok(())
}

fn spawn_demo_round(clock: &ManualClock) -> Result<RoundHandle> {
    let config = RoundConfig {
        funding: FUNDING,
        schedule: EpochSchedule::new(
            Timestamp::from_secs(T_REVEAL),
            Timestamp::from_secs(T_SCAM),
            None,
        )?,
        winning_hash: create_winning_hash(PHRASE, &SALT),
    };

    let handle = spawn_round(
        config,
        Arc::new(clock.clone()),
        Arc::new(Passthrough),
        Box::new(CreditLedger::new()),
    )?;
    Ok(handle)
}

/// Happy path: guesses, a reveal, winner and loser claims.
async fn demo_revealed_round() -> Result<()> {
    info!("=== Demo: revealed round ===");

    let clock = ManualClock::new(Timestamp::from_secs(0));
    let handle = spawn_demo_round(&clock)?;

    let players: Vec<Identity> = (0..3).map(|_| Identity::random()).collect();

    // Two winners, one loser.
    handle.make_guess(players[0], hash_guess(PHRASE)).await?;
    handle.make_guess(players[1], hash_guess(PHRASE)).await?;
    handle.make_guess(players[2], hash_guess("a wrong guess")).await?;

    for p in &players {
        info!("player {} committed", p.short_hex());
    }

    clock.advance(T_REVEAL);
    handle.reveal_answer(PHRASE, SALT).await?;

    let status = handle.status().await?;
    info!("phase: {}, pool: {}", status.phase, status.pool_balance);

    for p in &players {
        match handle.claim_prize(*p).await {
            Ok(amount) => info!("player {} paid {}", p.short_hex(), amount),
            Err(err) => info!("player {} claim rejected: {}", p.short_hex(), err),
        }
    }

    print_round_summary(&handle).await?;
    Ok(())
}

/// Refund path: the operator never reveals, everyone splits the pool.
async fn demo_scammed_round() -> Result<()> {
    info!("=== Demo: scammed round ===");

    let clock = ManualClock::new(Timestamp::from_secs(0));
    let handle = spawn_demo_round(&clock)?;

    let players: Vec<Identity> = (0..3).map(|_| Identity::random()).collect();
    for (i, p) in players.iter().enumerate() {
        handle.make_guess(*p, hash_guess(&format!("guess-{}", i))).await?;
    }

    // Straight past the reveal window.
    clock.advance(T_SCAM);

    let status = handle.status().await?;
    info!("phase: {}, pool: {}", status.phase, status.pool_balance);

    for p in &players {
        let amount = handle.claim_prize(*p).await?;
        info!("player {} refunded {}", p.short_hex(), amount);
    }

    print_round_summary(&handle).await?;
    Ok(())
}

async fn print_round_summary(handle: &RoundHandle) -> Result<()> {
    let status = handle.status().await?;
    info!(
        "final phase: {}, pool remaining: {}, open guesses: {}",
        status.phase, status.pool_balance, status.guess_count
    );

    let mut paid_total: Amount = 0;
    for event in handle.take_events().await? {
        if let RoundEventData::PrizePaid { player, amount, kind, .. } = event.data {
            info!(
                "[{}] paid {} to {} ({:?})",
                event.at,
                amount,
                player.short_hex(),
                kind
            );
            paid_total += amount;
        }
    }
    info!("total paid: {} of {}", paid_total, FUNDING);
    Ok(())
}
