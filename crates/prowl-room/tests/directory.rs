//! Integration tests for the room directory: membership cascades,
//! ownership transfer, authorization, and the maintenance sweep.

use std::time::Duration;

use prowl_protocol::{PlayerId, RoomId, SettingsPatch};
use prowl_room::{DirectoryConfig, RoomDirectory, RoomError};

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn directory() -> RoomDirectory {
    RoomDirectory::new(DirectoryConfig::default())
}

/// A directory where every room is immediately stale.
fn directory_with_instant_timeout() -> RoomDirectory {
    RoomDirectory::new(DirectoryConfig {
        room_timeout: Duration::ZERO,
        ..DirectoryConfig::default()
    })
}

// =========================================================================
// Creation and capacity
// =========================================================================

#[test]
fn test_create_room_seeds_creator_as_sole_member() {
    let mut dir = directory();

    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    assert_eq!(room.name, "Alpha");
    assert_eq!(room.creator, pid(1));
    assert_eq!(room.members, vec![pid(1)]);
    assert_eq!(dir.player_room(pid(1)), Some(room.id));
}

#[test]
fn test_create_room_ids_are_unique() {
    let mut dir = directory();
    let a = dir.create_room("A".to_string(), pid(1), false);
    let b = dir.create_room("B".to_string(), pid(2), false);
    assert_ne!(a.id, b.id);
    assert_eq!(dir.room_count(), 2);
}

#[test]
fn test_join_room_ninth_player_rejected() {
    // Scenario: P1 creates, P2..P8 join, the 9th attempt fails RoomFull.
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    for id in 2..=8 {
        dir.join_room(room.id, pid(id)).expect("under cap");
    }

    let result = dir.join_room(room.id, pid(9));
    assert!(matches!(result, Err(RoomError::RoomFull(r)) if r == room.id));
    assert_eq!(dir.room(room.id).unwrap().members.len(), 8);
}

#[test]
fn test_join_unknown_room_fails() {
    let mut dir = directory();
    let result = dir.join_room(RoomId(999_999), pid(1));
    assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
}

// =========================================================================
// Join idempotence and room switching
// =========================================================================

#[test]
fn test_join_room_twice_is_idempotent() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();

    let outcome = dir.join_room(room.id, pid(2)).expect("idempotent");

    assert!(outcome.left.is_none());
    assert_eq!(outcome.room.members, vec![pid(1), pid(2)]);
    assert_eq!(dir.room(room.id).unwrap().members.len(), 2);
}

#[test]
fn test_join_different_room_releases_old_membership() {
    let mut dir = directory();
    let alpha = dir.create_room("Alpha".to_string(), pid(1), false);
    let beta = dir.create_room("Beta".to_string(), pid(2), false);
    dir.join_room(alpha.id, pid(3)).unwrap();

    let outcome = dir.join_room(beta.id, pid(3)).expect("switch");

    let left = outcome.left.expect("implicit leave");
    assert_eq!(left.room_id, alpha.id);
    assert!(!left.closed);
    assert!(!dir.room(alpha.id).unwrap().contains(pid(3)));
    assert_eq!(dir.player_room(pid(3)), Some(beta.id));
}

#[test]
fn test_switching_out_of_solo_room_closes_it() {
    let mut dir = directory();
    let alpha = dir.create_room("Alpha".to_string(), pid(1), false);
    let beta = dir.create_room("Beta".to_string(), pid(2), false);

    let outcome = dir.join_room(beta.id, pid(1)).expect("switch");

    let left = outcome.left.expect("implicit leave");
    assert!(left.closed);
    assert!(dir.room(alpha.id).is_none());
}

// =========================================================================
// Leaving: ownership transfer and empty-room deletion
// =========================================================================

#[test]
fn test_creator_leaving_transfers_ownership() {
    // Scenario: P1 (creator) leaves a room still containing P2.
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();
    dir.join_room(room.id, pid(3)).unwrap();

    let outcome = dir.leave_room(pid(1)).expect("was a member");

    assert_eq!(outcome.new_creator, Some(pid(2)));
    assert!(!outcome.closed);
    let room = dir.room(room.id).expect("room persists");
    assert_eq!(room.creator, pid(2));
    assert!(!room.contains(pid(1)));
}

#[test]
fn test_non_creator_leaving_keeps_ownership() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();

    let outcome = dir.leave_room(pid(2)).expect("was a member");

    assert_eq!(outcome.new_creator, None);
    assert_eq!(dir.room(room.id).unwrap().creator, pid(1));
}

#[test]
fn test_last_member_leaving_deletes_room() {
    // Scenario: last member leaves, room vanishes from the directory.
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let outcome = dir.leave_room(pid(1)).expect("was a member");

    assert!(outcome.closed);
    assert!(dir.room(room.id).is_none());
    assert_eq!(dir.player_room(pid(1)), None);
    assert_eq!(dir.room_count(), 0);
}

#[test]
fn test_leave_room_when_in_none_is_noop() {
    let mut dir = directory();
    assert!(dir.leave_room(pid(7)).is_none());
}

// =========================================================================
// Kick
// =========================================================================

#[test]
fn test_kick_by_creator_removes_target() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();

    let outcome = dir.kick_player(room.id, pid(2), pid(1)).expect("creator");

    assert_eq!(outcome.player, pid(2));
    assert!(!outcome.closed);
    assert!(!dir.room(room.id).unwrap().contains(pid(2)));
    assert_eq!(dir.player_room(pid(2)), None);
}

#[test]
fn test_kick_by_non_creator_is_unauthorized() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();
    dir.join_room(room.id, pid(3)).unwrap();

    let result = dir.kick_player(room.id, pid(3), pid(2));
    assert!(matches!(result, Err(RoomError::NotAuthorized { .. })));
}

#[test]
fn test_kick_self_rejected_even_for_creator() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let result = dir.kick_player(room.id, pid(1), pid(1));
    assert!(matches!(result, Err(RoomError::SelfKick(p)) if p == pid(1)));
}

#[test]
fn test_kick_non_member_fails() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let result = dir.kick_player(room.id, pid(9), pid(1));
    assert!(matches!(result, Err(RoomError::PlayerNotInRoom(p, _)) if p == pid(9)));
}

// =========================================================================
// Settings, privacy, game flags
// =========================================================================

#[test]
fn test_update_settings_merges_patch() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let snap = dir
        .update_settings(
            room.id,
            SettingsPatch {
                game_mode: Some("blitz".to_string()),
                ..SettingsPatch::default()
            },
            pid(1),
        )
        .expect("creator");

    assert_eq!(snap.settings.game_mode, "blitz");
    assert_eq!(snap.settings.time_limit_secs, 300);
}

#[test]
fn test_update_settings_by_non_creator_is_unauthorized() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.join_room(room.id, pid(2)).unwrap();

    let result = dir.update_settings(room.id, SettingsPatch::default(), pid(2));
    assert!(matches!(result, Err(RoomError::NotAuthorized { .. })));
}

#[test]
fn test_set_private_hides_room_from_listing() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    assert_eq!(dir.list_public().len(), 1);

    dir.set_private(room.id, true, pid(1)).expect("creator");

    assert!(dir.list_public().is_empty());
    assert!(dir.room(room.id).unwrap().is_private);
}

#[test]
fn test_start_game_sets_active_flags() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let snap = dir.start_game(room.id, pid(1)).expect("creator");

    assert!(snap.is_active);
    let room = dir.room(room.id).unwrap();
    assert!(room.started_at.is_some());
    assert!(room.ended_at.is_none());
}

#[test]
fn test_start_game_twice_fails_already_active() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.start_game(room.id, pid(1)).unwrap();

    let result = dir.start_game(room.id, pid(1));
    assert!(matches!(result, Err(RoomError::AlreadyActive(_))));
}

#[test]
fn test_end_game_requires_active() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let result = dir.end_game(room.id);
    assert!(matches!(result, Err(RoomError::NotActive(_))));

    dir.start_game(room.id, pid(1)).unwrap();
    let snap = dir.end_game(room.id).expect("was active");
    assert!(!snap.is_active);
    assert!(dir.room(room.id).unwrap().ended_at.is_some());
}

// =========================================================================
// Maintenance sweep
// =========================================================================

#[test]
fn test_sweep_removes_stale_rooms() {
    let mut dir = directory_with_instant_timeout();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    let swept = dir.sweep();

    assert_eq!(swept, vec![room.id]);
    assert!(dir.room(room.id).is_none());
    // Reverse index entries for the swept room are cascaded away.
    assert_eq!(dir.player_room(pid(1)), None);
}

#[test]
fn test_sweep_keeps_active_rooms() {
    let mut dir = directory();
    let room = dir.create_room("Alpha".to_string(), pid(1), false);

    assert!(dir.sweep().is_empty());
    assert!(dir.room(room.id).is_some());
}

// =========================================================================
// Index consistency
// =========================================================================

#[test]
fn test_index_stays_consistent_through_mutation_sequence() {
    // Every mutating operation must leave the rooms map and the reverse
    // player index agreeing; assert_consistent checks that directly.
    let mut dir = directory();

    let alpha = dir.create_room("Alpha".to_string(), pid(1), false);
    dir.assert_consistent();

    dir.join_room(alpha.id, pid(2)).unwrap();
    dir.join_room(alpha.id, pid(3)).unwrap();
    dir.assert_consistent();

    // Switching rooms releases the old membership atomically.
    let beta = dir.create_room("Beta".to_string(), pid(4), false);
    dir.join_room(beta.id, pid(3)).unwrap();
    dir.assert_consistent();

    dir.kick_player(alpha.id, pid(2), pid(1)).unwrap();
    dir.assert_consistent();

    // Alpha is down to its creator: leaving dissolves it. Beta's creator
    // leaving instead hands the room to the remaining member.
    dir.leave_room(pid(1)).expect("was a member");
    dir.assert_consistent();
    dir.leave_room(pid(4)).expect("was a member");
    dir.assert_consistent();

    assert_eq!(dir.room(beta.id).unwrap().creator, pid(3));

    assert_eq!(dir.player_room(pid(1)), None);
    assert_eq!(dir.player_room(pid(4)), None);
}
