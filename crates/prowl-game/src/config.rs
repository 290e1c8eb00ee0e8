//! Game session configuration.

use std::time::Duration;

/// Tunables for one [`GameSession`](crate::GameSession).
///
/// The defaults describe the shipped game; tests shrink the timeouts to
/// zero (or stretch them to an hour) to make time-dependent behavior
/// deterministic without sleeping.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Maximum players in the session roster.
    pub max_players: usize,

    /// Number of collectibles spawned per session (ids `0..count`).
    pub collectible_count: usize,

    /// Score credited per collectible.
    pub collectible_value: u32,

    /// A position update within this distance of an uncollected
    /// collectible picks it up automatically.
    pub auto_pickup_radius: f32,

    /// An explicit collect request farther than this is rejected.
    pub pickup_radius: f32,

    /// A player silent for this long is pruned from the roster.
    pub inactivity_timeout: Duration,

    /// Delay between the session ending (field exhausted) and the
    /// automatic reset.
    pub restart_delay: Duration,

    /// Collectibles and spawn points are placed within ±extent on the
    /// horizontal axes. Zero places everything at the origin.
    pub world_extent: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            collectible_count: 15,
            collectible_value: 10,
            auto_pickup_radius: 1.0,
            pickup_radius: 2.0,
            inactivity_timeout: Duration::from_secs(30),
            restart_delay: Duration::from_secs(10),
            world_extent: 20.0,
        }
    }
}
