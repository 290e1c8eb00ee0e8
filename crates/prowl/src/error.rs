//! Unified error type for the Prowl server.

use prowl_game::GameError;
use prowl_protocol::ProtocolError;
use prowl_room::RoomError;
use prowl_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ProwlError {
    /// A connection-layer error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-layer error (capacity, collection).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A room-layer error (full, not found, unauthorized).
    #[error(transparent)]
    Room(#[from] RoomError),
}
