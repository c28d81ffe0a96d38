//! Error taxonomy for the pet engine.
//!
//! Nothing in here is fatal: every variant maps to a degrade-and-continue
//! path in the sampler loops. The binary boundary uses `anyhow`; these typed
//! errors exist so callers can tell a skipped tick from a rejected spend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    /// The foreground activity query timed out, was denied, or returned
    /// nothing usable. The current tick keeps the previous category/state.
    #[error("foreground activity query unavailable: {0}")]
    ActivityQueryUnavailable(String),

    /// A snapshot write failed. Logged and retried on the next tick.
    #[error("failed to persist session snapshot: {0}")]
    PersistenceWriteFailed(String),

    /// The persisted snapshot could not be decoded. Callers fall back to a
    /// default session instead of crashing.
    #[error("persisted session snapshot is corrupt: {0}")]
    PersistenceReadCorrupt(String),

    /// A spend action was rejected; no state was mutated.
    #[error("not enough dumplings: need {needed:.1}, have {available:.1}")]
    InsufficientFunds { needed: f64, available: f64 },

    /// Leaderboard push/fetch failed. The session continues local-only.
    #[error("leaderboard sync failed: {0}")]
    RemoteSyncFailed(String),
}

pub type Result<T, E = PetError> = std::result::Result<T, E>;
