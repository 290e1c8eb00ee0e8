//! Error types for the room layer.

use prowl_protocol::{PlayerId, RoomId};

/// Errors that can occur during room directory operations.
///
/// All are per-request failures reported back to the requester only;
/// none take the directory down or get broadcast.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room is full — no more member slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The requester is not the room's creator.
    #[error("player {player} is not authorized in room {room}")]
    NotAuthorized { room: RoomId, player: PlayerId },

    /// The target player is not a member of this room.
    #[error("player {0} not in room {1}")]
    PlayerNotInRoom(PlayerId, RoomId),

    /// Kicking yourself is always rejected, creator included.
    #[error("player {0} cannot kick themselves")]
    SelfKick(PlayerId),

    /// The room's game is already running.
    #[error("room {0} game already active")]
    AlreadyActive(RoomId),

    /// The room's game is not running.
    #[error("room {0} game not active")]
    NotActive(RoomId),
}
