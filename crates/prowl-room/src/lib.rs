//! # prowl-room
//!
//! Room membership and directory management for Prowl.
//!
//! A [`Room`] is a named group of players with a creator, a member cap,
//! creator-mutable settings, and game-activity flags. The
//! [`RoomDirectory`] owns every room plus the reverse player-to-room
//! index, and enforces the one-room-per-player invariant: joining a new
//! room releases the old membership in the same operation, an emptied
//! room is deleted on the spot, and a departing creator hands ownership
//! to a remaining member.
//!
//! The directory is synchronous by design. It never runs its own tasks;
//! the coordinator calls into it from behind a single-writer boundary,
//! which is what makes the cross-map updates atomic.

mod config;
mod directory;
mod error;
mod room;

pub use config::DirectoryConfig;
pub use directory::{JoinOutcome, LeaveOutcome, RoomDirectory};
pub use error::RoomError;
pub use room::Room;
