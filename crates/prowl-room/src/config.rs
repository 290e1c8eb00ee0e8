//! Room directory configuration.

use std::time::Duration;

/// Tunables for a [`RoomDirectory`](crate::RoomDirectory).
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Member cap applied to every room.
    pub max_players: usize,

    /// A room with no membership or settings activity for this long is
    /// deleted by the maintenance sweep.
    pub room_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            room_timeout: Duration::from_secs(30 * 60),
        }
    }
}
