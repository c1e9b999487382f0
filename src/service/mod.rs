//! Service Layer
//!
//! The non-deterministic outer shell: a single-writer actor that owns the
//! round, and bearer-token resolution for callers arriving from outside.
//! All game logic runs through `game/`.

pub mod actor;
pub mod auth;

pub use actor::{spawn_round, RoundHandle, RoundStatus, ServiceError};
pub use auth::{AuthConfig, TokenClaims, AuthError, resolve_caller, validate_token};
