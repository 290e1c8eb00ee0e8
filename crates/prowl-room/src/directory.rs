//! Room directory: creates, tracks, and deletes rooms, and enforces the
//! one-room-per-player invariant through a reverse index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use prowl_protocol::{PlayerId, RoomId, RoomSnapshot, SettingsPatch};

use crate::{DirectoryConfig, Room, RoomError};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// The side effects of one player leaving one room, for the caller to
/// broadcast. Produced by explicit leaves, kicks, implicit leaves during
/// a room switch, and inactivity prunes alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room_id: RoomId,
    pub player: PlayerId,
    /// Set when the departing player was the creator and ownership
    /// moved to a remaining member.
    pub new_creator: Option<PlayerId>,
    /// True when the room emptied and was deleted.
    pub closed: bool,
}

/// The result of a join, including any implicit leave from the player's
/// previous room.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub room: RoomSnapshot,
    /// Set when the player switched rooms and their old membership was
    /// released as part of this operation.
    pub left: Option<LeaveOutcome>,
}

/// Tracks all rooms and which player is in which room.
///
/// Exclusively owned by the coordinator — every mutation runs behind its
/// single-writer boundary, so the cross-map invariants here (a player in
/// at most one room, reverse index agreeing with every member set) hold
/// atomically. They are still checked after every mutation, not assumed.
pub struct RoomDirectory {
    config: DirectoryConfig,
    rooms: HashMap<RoomId, Room>,
    /// Reverse index. A player appears here iff exactly one room's
    /// member list contains them.
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    // -- Creation / membership ----------------------------------------------

    /// Creates a room with the creator as sole member. Never fails; there
    /// is no cap on the number of rooms.
    ///
    /// The creator must not currently be in a room — callers release any
    /// existing membership first (the coordinator does this as part of
    /// handling the create event).
    pub fn create_room(
        &mut self,
        name: String,
        creator: PlayerId,
        is_private: bool,
    ) -> RoomSnapshot {
        debug_assert!(
            !self.player_rooms.contains_key(&creator),
            "creator must leave their current room before creating"
        );

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let room = Room::new(
            room_id,
            name,
            creator,
            self.config.max_players,
            is_private,
        );
        let snapshot = room.snapshot();
        self.rooms.insert(room_id, room);
        self.player_rooms.insert(creator, room_id);

        tracing::info!(%room_id, %creator, "room created");
        self.assert_consistent();
        snapshot
    }

    /// Adds a player to a room.
    ///
    /// Idempotent when the player is already a member (returns the room
    /// unchanged, no implicit leave). If the player is in a *different*
    /// room, that membership is released first, as part of this same
    /// operation.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`], [`RoomError::RoomFull`].
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<JoinOutcome, RoomError> {
        let room = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;

        if room.contains(player) {
            return Ok(JoinOutcome {
                room: room.snapshot(),
                left: None,
            });
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(room_id));
        }

        // Switching rooms: release the old membership first. The old
        // room may close or change creator; the caller broadcasts that.
        let left = self.leave_room(player);

        let room = self
            .rooms
            .get_mut(&room_id)
            .expect("room presence checked above");
        room.members.push(player);
        room.touch();
        self.player_rooms.insert(player, room_id);

        tracing::info!(%room_id, %player, members = room.members.len(), "player joined room");
        let snapshot = room.snapshot();
        self.assert_consistent();
        Ok(JoinOutcome {
            room: snapshot,
            left,
        })
    }

    /// Removes a player from whichever room they are in.
    ///
    /// Returns `None` (no-op) when the player is in no room. An emptied
    /// room is deleted immediately; otherwise a departing creator hands
    /// ownership to the first remaining member.
    pub fn leave_room(&mut self, player: PlayerId) -> Option<LeaveOutcome> {
        let room_id = self.player_rooms.remove(&player)?;

        let room = self
            .rooms
            .get_mut(&room_id)
            .expect("reverse index pointed at a live room");
        room.members.retain(|m| *m != player);

        let outcome = if room.members.is_empty() {
            self.rooms.remove(&room_id);
            // Cascade: drop any lingering reverse entries for this room.
            self.player_rooms.retain(|_, rid| *rid != room_id);
            tracing::info!(%room_id, %player, "last member left, room closed");
            LeaveOutcome {
                room_id,
                player,
                new_creator: None,
                closed: true,
            }
        } else {
            let new_creator = if room.creator == player {
                let next = room.members[0];
                room.creator = next;
                tracing::info!(%room_id, old = %player, new = %next, "room ownership transferred");
                Some(next)
            } else {
                None
            };
            room.touch();
            tracing::info!(%room_id, %player, members = room.members.len(), "player left room");
            LeaveOutcome {
                room_id,
                player,
                new_creator,
                closed: false,
            }
        };

        self.assert_consistent();
        Some(outcome)
    }

    /// Removes a target from a room on the creator's request.
    ///
    /// The target leaves exactly as [`leave_room`](Self::leave_room) would
    /// (same empty-room deletion rule). The target cannot be the creator,
    /// so no ownership transfer can occur here.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`], [`RoomError::NotAuthorized`],
    /// [`RoomError::SelfKick`], [`RoomError::PlayerNotInRoom`].
    pub fn kick_player(
        &mut self,
        room_id: RoomId,
        target: PlayerId,
        requester: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        let room = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;
        if room.creator != requester {
            return Err(RoomError::NotAuthorized {
                room: room_id,
                player: requester,
            });
        }
        if target == requester {
            return Err(RoomError::SelfKick(target));
        }
        if !room.contains(target) {
            return Err(RoomError::PlayerNotInRoom(target, room_id));
        }

        let outcome = self
            .leave_room(target)
            .expect("membership checked above");
        tracing::info!(%room_id, %target, %requester, "player kicked");
        Ok(outcome)
    }

    // -- Settings / game flags ----------------------------------------------

    /// Merges a settings patch. Creator only.
    pub fn update_settings(
        &mut self,
        room_id: RoomId,
        patch: SettingsPatch,
        requester: PlayerId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.authorized_room(room_id, requester)?;
        room.apply_patch(patch);
        tracing::info!(%room_id, %requester, "room settings updated");
        Ok(room.snapshot())
    }

    /// Flips the private flag. Same authorization rule as settings.
    pub fn set_private(
        &mut self,
        room_id: RoomId,
        private: bool,
        requester: PlayerId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.authorized_room(room_id, requester)?;
        room.is_private = private;
        room.touch();
        Ok(room.snapshot())
    }

    /// Starts the room's game. Creator only; fails if already running.
    pub fn start_game(
        &mut self,
        room_id: RoomId,
        requester: PlayerId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.authorized_room(room_id, requester)?;
        if room.is_active {
            return Err(RoomError::AlreadyActive(room_id));
        }
        room.is_active = true;
        room.started_at = Some(std::time::Instant::now());
        room.ended_at = None;
        room.touch();
        tracing::info!(%room_id, "room game started");
        Ok(room.snapshot())
    }

    /// Ends the room's game. Fails if not running.
    pub fn end_game(
        &mut self,
        room_id: RoomId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;
        if !room.is_active {
            return Err(RoomError::NotActive(room_id));
        }
        room.is_active = false;
        room.ended_at = Some(std::time::Instant::now());
        room.touch();
        tracing::info!(%room_id, "room game ended");
        Ok(room.snapshot())
    }

    // -- Maintenance --------------------------------------------------------

    /// Deletes rooms that are empty or whose activity window elapsed,
    /// returning their ids so the caller can broadcast the closures.
    pub fn sweep(&mut self) -> Vec<RoomId> {
        let timeout = self.config.room_timeout;
        let stale: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|r| {
                r.members.is_empty() || r.last_activity.elapsed() >= timeout
            })
            .map(|r| r.id)
            .collect();

        for room_id in &stale {
            self.rooms.remove(room_id);
            self.player_rooms.retain(|_, rid| rid != room_id);
            tracing::info!(%room_id, "stale room swept");
        }

        self.assert_consistent();
        stale
    }

    // -- Reads --------------------------------------------------------------

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player: PlayerId) -> Option<RoomId> {
        self.player_rooms.get(&player).copied()
    }

    /// Members of a room, for broadcast targeting.
    pub fn members(&self, room_id: RoomId) -> Option<&[PlayerId]> {
        self.rooms.get(&room_id).map(|r| r.members.as_slice())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Snapshots of all non-private rooms, for the lobby listing.
    pub fn list_public(&self) -> Vec<RoomSnapshot> {
        self.rooms
            .values()
            .filter(|r| !r.is_private)
            .map(|r| r.snapshot())
            .collect()
    }

    // -- Invariant checks ---------------------------------------------------

    fn authorized_room(
        &mut self,
        room_id: RoomId,
        requester: PlayerId,
    ) -> Result<&mut Room, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;
        if room.creator != requester {
            return Err(RoomError::NotAuthorized {
                room: room_id,
                player: requester,
            });
        }
        Ok(room)
    }

    /// Verifies the cross-map invariants after a mutation (debug builds).
    ///
    /// Every reverse-index entry must point at a room whose member list
    /// contains the player, every member must be indexed back to exactly
    /// that room, every room must be non-empty, and every creator must
    /// be a member. Public so test suites can check the index directly;
    /// not part of the stable API.
    #[doc(hidden)]
    pub fn assert_consistent(&self) {
        if cfg!(debug_assertions) {
            for (player, room_id) in &self.player_rooms {
                let room = self.rooms.get(room_id);
                debug_assert!(
                    room.is_some_and(|r| r.contains(*player)),
                    "index entry {player} -> {room_id} has no backing membership"
                );
            }
            for room in self.rooms.values() {
                debug_assert!(
                    !room.members.is_empty(),
                    "room {} persisted with no members",
                    room.id
                );
                debug_assert!(
                    room.contains(room.creator),
                    "room {} creator {} is not a member",
                    room.id,
                    room.creator
                );
                for member in &room.members {
                    debug_assert_eq!(
                        self.player_rooms.get(member),
                        Some(&room.id),
                        "member {member} of room {} not indexed to it",
                        room.id
                    );
                }
            }
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(DirectoryConfig::default())
    }
}
