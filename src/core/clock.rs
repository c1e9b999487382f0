//! Clock Provider
//!
//! Supplies the logical time that drives every phase computation.
//! The game never reads time from anywhere else; whoever constructs a round
//! decides whether that time is the wall clock or a test-controlled value.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// Logical time as Unix seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create from Unix seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Raw Unix seconds.
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Timestamp `secs` later, saturating at the maximum.
    pub const fn saturating_add(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds from `earlier` to `self`, zero if `earlier` is later.
    pub const fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Convert to a chrono UTC datetime for display and interop.
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0 as i64, 0).unwrap_or_default()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

/// Supplies the current logical time.
///
/// Implementations must be monotonic for the round's phase invariants to
/// hold; the core trusts what it is given.
pub trait Clock: Send + Sync {
    /// Current logical time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(Utc::now().timestamp().max(0) as u64)
    }
}

/// Manually driven clock, shared between a driver and the round under it.
///
/// Cloning yields handles onto the same underlying instant. `advance` only
/// moves forward; there is no way to rewind, matching the monotonicity the
/// round expects.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at the given instant.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.as_secs())),
        }
    }

    /// Advance the clock by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an instant, ignored if it is in the past.
    pub fn advance_to(&self, instant: Timestamp) {
        self.now.fetch_max(instant.as_secs(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.now.load(Ordering::SeqCst))
    }
}

// =============================================================================
// TESTS
// =============================================================================
