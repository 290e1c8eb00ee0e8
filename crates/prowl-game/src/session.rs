//! The shared game session: roster + collectible field + aggregate score,
//! with the `Active → Ended → (delay) → Active` lifecycle.

use std::time::Instant;

use prowl_protocol::{PlayerId, Rotation, SessionSnapshot, Vec3};
use rand::Rng;

use crate::{CollectibleField, GameConfig, GameError, Roster};

/// Where the session is in its lifecycle.
///
/// There are no other states: a session can only leave `Active` through
/// the win path (field exhausted) or an explicit reset, and `Ended` only
/// through the delayed (or explicit) reset back to `Active`.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Active,
    Ended { since: Instant },
}

/// A lifecycle transition observed by [`GameSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// The last collectible was taken; the session is now Ended and a
    /// reset is due after the configured delay.
    Ended,
    /// The restart delay elapsed (or a reset was requested); the session
    /// is Active again with a fresh field and zeroed scores.
    Restarted,
}

/// The record of one successful collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub index: usize,
    pub value: u32,
    /// The collector's score after crediting.
    pub player_score: u32,
    /// The session aggregate after crediting.
    pub session_score: u32,
}

/// The scored, timed game instance shared by every connected player.
///
/// Invariant: `score` equals the sum of every credited collection since
/// the last reset. Players who leave keep their contribution in the
/// aggregate, so it is monotonically non-decreasing between resets.
pub struct GameSession {
    config: GameConfig,
    roster: Roster,
    field: CollectibleField,
    score: u32,
    started_at: Instant,
    phase: Phase,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let roster = Roster::new(config.max_players, config.inactivity_timeout);
        let field = CollectibleField::spawn(
            config.collectible_count,
            config.collectible_value,
            config.world_extent,
        );
        Self {
            config,
            roster,
            field,
            score: 0,
            started_at: Instant::now(),
            phase: Phase::Active,
        }
    }

    // -- Roster operations --------------------------------------------------

    /// Adds a player at `spawn` with score 0 and full health.
    ///
    /// # Errors
    /// [`GameError::CapacityExceeded`] when the roster is full.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        spawn: Vec3,
    ) -> Result<&crate::Player, GameError> {
        self.roster.insert(id, spawn)
    }

    /// Removes a player. Idempotent; their credited score stays in the
    /// session aggregate.
    pub fn remove_player(&mut self, id: PlayerId) {
        self.roster.remove(id);
    }

    /// Applies a position report and attempts automatic proximity
    /// collection.
    ///
    /// Silent no-op (returns `None`) when the player already left. On a
    /// pickup, returns the credit record; at most one collectible is
    /// taken per update — the scan stops at the first uncollected item
    /// within the auto radius, in index order, even if several qualify.
    pub fn update_player(
        &mut self,
        id: PlayerId,
        position: Vec3,
        rotation: Rotation,
    ) -> Option<Pickup> {
        if !self.roster.update(id, position, rotation) {
            return None;
        }

        let radius = self.config.auto_pickup_radius;
        let hit = self
            .field
            .items()
            .iter()
            .position(|c| !c.collected && c.position.distance(&position) < radius);

        hit.map(|index| self.credit(id, index))
    }

    /// Explicit pickup attempt for the collectible at `index`.
    ///
    /// The check-set-credit sequence runs to completion before any other
    /// mutation (single-owner state), so concurrent attempts on the same
    /// index have exactly one winner; the loser sees `AlreadyCollected`.
    pub fn collect(
        &mut self,
        id: PlayerId,
        index: usize,
    ) -> Result<Pickup, GameError> {
        let position = self
            .roster
            .get(id)
            .ok_or(GameError::PlayerNotFound(id))?
            .position;

        let item = self
            .field
            .get(index)
            .ok_or(GameError::InvalidIndex(index))?;
        if item.collected {
            return Err(GameError::AlreadyCollected(index));
        }
        if position.distance(&item.position) >= self.config.pickup_radius {
            return Err(GameError::TooFar(index));
        }

        Ok(self.credit(id, index))
    }

    /// Marks the item taken and credits its value to the player and the
    /// session aggregate. Callers have already validated the pickup.
    fn credit(&mut self, id: PlayerId, index: usize) -> Pickup {
        let value = self
            .field
            .get(index)
            .expect("pickup was just validated")
            .value;
        self.field.mark_collected(index);
        self.score += value;

        let player = self
            .roster
            .get_mut(id)
            .expect("collector was just validated");
        player.score += value;
        let player_score = player.score;

        tracing::info!(
            %id,
            index,
            player_score,
            session_score = self.score,
            "collectible credited"
        );

        Pickup {
            index,
            value,
            player_score,
            session_score: self.score,
        }
    }

    /// Whether the player has reported within the activity window.
    pub fn player_is_active(&self, id: PlayerId) -> bool {
        self.roster.is_active(id)
    }

    /// Removes players whose activity window elapsed; the caller cascades
    /// the removal into rooms and broadcasts.
    pub fn prune_inactive(&mut self) -> Vec<PlayerId> {
        self.roster.prune_inactive()
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Advances the session state machine. Called once per tick.
    ///
    /// While Active: transitions to Ended when the field is exhausted.
    /// While Ended: resets once the restart delay has elapsed. An explicit
    /// [`reset`](Self::reset) in between returns the session to Active, so
    /// the delayed path naturally becomes a no-op — no cancellation.
    pub fn tick(&mut self) -> Option<SessionTransition> {
        match self.phase {
            Phase::Active => {
                if self.field.remaining() == 0 && !self.field.is_empty() {
                    self.phase = Phase::Ended { since: Instant::now() };
                    tracing::info!(
                        score = self.score,
                        "field exhausted — session ended, restart pending"
                    );
                    Some(SessionTransition::Ended)
                } else {
                    None
                }
            }
            Phase::Ended { since } => {
                if since.elapsed() >= self.config.restart_delay {
                    self.reset();
                    Some(SessionTransition::Restarted)
                } else {
                    None
                }
            }
        }
    }

    /// Immediate reset: fresh collectible field, all scores zeroed,
    /// timers restarted, session Active.
    pub fn reset(&mut self) {
        self.field = CollectibleField::spawn(
            self.config.collectible_count,
            self.config.collectible_value,
            self.config.world_extent,
        );
        self.roster.zero_scores();
        self.score = 0;
        self.started_at = Instant::now();
        self.phase = Phase::Active;
        tracing::info!("session reset");
    }

    // -- Reads --------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active)
    }

    /// Session aggregate score.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn collectibles_remaining(&self) -> usize {
        self.field.remaining()
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&crate::Player> {
        self.roster.get(id)
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.roster.contains(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &crate::Player> {
        self.roster.iter()
    }

    /// A random spawn point within the world extent.
    pub fn spawn_point(&self) -> Vec3 {
        let e = self.config.world_extent;
        let mut rng = rand::rng();
        Vec3::new(rng.random_range(-e..=e), 0.0, rng.random_range(-e..=e))
    }

    /// A consistent snapshot of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score,
            game_time_secs: self.started_at.elapsed().as_secs_f64(),
            is_active: self.is_active(),
            players: self.roster.iter().map(|p| p.snapshot()).collect(),
            collectibles: self.field.snapshot(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
