//! Error types for the game layer.

use prowl_protocol::PlayerId;

/// Errors that can occur during roster and collection operations.
///
/// All of these are per-request failures reported back to the originating
/// player; none of them take the session down. Stale-event races (moving
/// a player who already left, removing an absent player) are deliberately
/// *not* errors — those paths are silent no-ops.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The roster is at its configured player cap.
    #[error("session is full ({0} players)")]
    CapacityExceeded(usize),

    /// No player with this id is in the roster.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The collectible index is outside `0..count`.
    #[error("collectible index {0} out of range")]
    InvalidIndex(usize),

    /// The collectible was already taken — somebody else won the race.
    #[error("collectible {0} already collected")]
    AlreadyCollected(usize),

    /// The reported position is too far from the collectible.
    #[error("too far from collectible {0}")]
    TooFar(usize),
}
