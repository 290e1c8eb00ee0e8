//! The player roster: per-connection player records and activity tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use prowl_protocol::{PlayerId, PlayerSnapshot, Rotation, Vec3};

use crate::GameError;

/// One connected player's record.
///
/// Created on join, mutated on every position/collect event, destroyed on
/// leave, disconnect, or inactivity prune.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vec3,
    pub rotation: Rotation,
    pub score: u32,
    /// 0–100. Reserved for damage events; players spawn at full health.
    pub health: u8,
    pub joined_at: Instant,
    /// Bumped by every inbound update from this player. Drives the
    /// inactivity prune.
    pub last_update: Instant,
}

impl Player {
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            position: self.position,
            rotation: self.rotation,
            score: self.score,
            health: self.health,
        }
    }
}

/// Registry of all players in one session, keyed by id.
///
/// Plain `HashMap`, single owner — the session mutates it behind the
/// coordinator boundary.
#[derive(Debug)]
pub struct Roster {
    players: HashMap<PlayerId, Player>,
    max_players: usize,
    inactivity_timeout: Duration,
}

impl Roster {
    pub fn new(max_players: usize, inactivity_timeout: Duration) -> Self {
        Self {
            players: HashMap::new(),
            max_players,
            inactivity_timeout,
        }
    }

    /// Inserts a fresh player at `spawn`.
    ///
    /// # Errors
    /// Returns [`GameError::CapacityExceeded`] when the roster is full.
    /// Re-joining an existing id resets that player's record.
    pub fn insert(
        &mut self,
        id: PlayerId,
        spawn: Vec3,
    ) -> Result<&Player, GameError> {
        if !self.players.contains_key(&id)
            && self.players.len() >= self.max_players
        {
            return Err(GameError::CapacityExceeded(self.max_players));
        }

        let now = Instant::now();
        let player = Player {
            id,
            position: spawn,
            rotation: Rotation::default(),
            score: 0,
            health: 100,
            joined_at: now,
            last_update: now,
        };
        self.players.insert(id, player);
        tracing::info!(%id, "player joined roster");

        Ok(self.players.get(&id).expect("just inserted"))
    }

    /// Removes a player. Idempotent: removing an absent id is a no-op,
    /// because a leave may race a prune or a duplicate disconnect.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            tracing::info!(%id, "player left roster");
        }
        removed
    }

    /// Overwrites position/rotation and bumps `last_update`.
    ///
    /// Returns `false` (silent no-op) when the player already left —
    /// a stale in-flight event, not an error.
    pub fn update(
        &mut self,
        id: PlayerId,
        position: Vec3,
        rotation: Rotation,
    ) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.position = position;
                player.rotation = rotation;
                player.last_update = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Whether the player has reported anything within the activity window.
    pub fn is_active(&self, id: PlayerId) -> bool {
        self.players
            .get(&id)
            .is_some_and(|p| p.last_update.elapsed() < self.inactivity_timeout)
    }

    /// Removes every player whose activity window elapsed and returns
    /// their ids so the caller can cascade the removal (rooms, broadcasts).
    pub fn prune_inactive(&mut self) -> Vec<PlayerId> {
        let timeout = self.inactivity_timeout;
        let stale: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.last_update.elapsed() >= timeout)
            .map(|p| p.id)
            .collect();

        for id in &stale {
            self.players.remove(id);
            tracing::info!(%id, "pruned inactive player");
        }
        stale
    }

    /// Zeroes every player's score (session reset).
    pub fn zero_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }
}

// =========================================================================
// Tests
// =========================================================================
