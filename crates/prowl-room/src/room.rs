//! A single room: membership, ownership, settings, and game-activity flags.

use std::time::Instant;

use prowl_protocol::{PlayerId, RoomId, RoomSettings, RoomSnapshot, SettingsPatch};

/// A named group of players sharing settings and one game lifecycle.
///
/// Invariants maintained by the [`RoomDirectory`](crate::RoomDirectory):
/// `creator` is always a current member, and `members` is non-empty for
/// as long as the room exists (an emptied room is deleted immediately).
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub creator: PlayerId,
    /// Members in join order. Ownership transfers pick the front, which
    /// makes the handoff deterministic for the tests without promising
    /// callers anything beyond "some remaining member".
    pub members: Vec<PlayerId>,
    pub max_players: usize,
    pub is_private: bool,
    pub settings: RoomSettings,
    pub is_active: bool,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub created_at: Instant,
    /// Bumped by any membership or settings change. Drives the sweep.
    pub last_activity: Instant,
}

impl Room {
    /// A fresh room with the creator as sole member, game not started.
    pub(crate) fn new(
        id: RoomId,
        name: String,
        creator: PlayerId,
        max_players: usize,
        is_private: bool,
    ) -> Self {
        let now = Instant::now();
        Self {
            id,
            name,
            creator,
            members: vec![creator],
            max_players,
            is_private,
            settings: RoomSettings::default(),
            is_active: false,
            started_at: None,
            ended_at: None,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Merges the provided fields into the settings; absent fields keep
    /// their current values.
    pub(crate) fn apply_patch(&mut self, patch: SettingsPatch) {
        if let Some(game_mode) = patch.game_mode {
            self.settings.game_mode = game_mode;
        }
        if let Some(time_limit_secs) = patch.time_limit_secs {
            self.settings.time_limit_secs = time_limit_secs;
        }
        if let Some(collectibles_needed) = patch.collectibles_needed {
            self.settings.collectibles_needed = collectibles_needed;
        }
        self.touch();
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            name: self.name.clone(),
            creator: self.creator,
            members: self.members.clone(),
            max_players: self.max_players,
            is_private: self.is_private,
            settings: self.settings.clone(),
            is_active: self.is_active,
        }
    }
}
