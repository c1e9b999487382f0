//! Guess Commitment Scheme
//!
//! Two-stage hash commitment binding guesses to a salted answer.
//!
//! Participants publish `hash_guess(plaintext)` and keep the plaintext to
//! themselves, so nobody can test guesses against the raw target before the
//! reveal. The operator pre-commits to `winning_hash(hash_guess(phrase),
//! salt)`; fixing the salt alongside the target hash means the winning
//! guess cannot be re-chosen after commitments start arriving.
//!
//! Pure functions, no side effects.

use crate::core::hash::{Hash32, DomainHasher};

/// Domain separator for guess commitments.
const GUESS_DOMAIN: &[u8] = b"QUIZPOT_GUESS_V1";

/// Domain separator for the salted winning hash.
const WINNING_DOMAIN: &[u8] = b"QUIZPOT_WINNING_V1";

/// Salt paired with the winning hash at construction, disclosed at reveal.
pub type Salt = [u8; 32];

/// One-way commitment of a plaintext guess.
pub fn hash_guess(plaintext: &str) -> Hash32 {
    let mut hasher = DomainHasher::new(GUESS_DOMAIN);
    hasher.update_bytes(plaintext.as_bytes());
    hasher.finalize()
}

/// Combine a guess commitment with a salt into the final comparison hash.
pub fn winning_hash(guess_hash: &Hash32, salt: &Salt) -> Hash32 {
    let mut hasher = DomainHasher::new(WINNING_DOMAIN);
    hasher.update_hash(guess_hash);
    hasher.update_hash(salt);
    hasher.finalize()
}

/// Winning hash straight from the plaintext phrase.
///
/// Used by the operator to pre-compute the target at construction time and
/// by the reveal step to check a claimed phrase/salt pair against it.
pub fn create_winning_hash(winning_phrase: &str, salt: &Salt) -> Hash32 {
    winning_hash(&hash_guess(winning_phrase), salt)
}

// =============================================================================
// TESTS
// =============================================================================
