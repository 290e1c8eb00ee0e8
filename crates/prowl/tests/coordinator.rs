//! Integration tests for the coordinator: event dispatch, broadcast
//! resolution, collection arbitration, and the tick/sweep cascades.
//!
//! All coordinators here use `world_extent: 0.0` so spawn points and
//! collectibles sit at the origin, making proximity checks exact, and
//! zero/huge durations in place of real timeouts wherever a test can
//! avoid sleeping.

use std::time::Duration;

use prowl::{
    Audience, ClientEvent, Coordinator, CoordinatorConfig, Delivery,
    DirectoryConfig, GameConfig, PlayerId, RoomId, ServerEvent,
};
use prowl_protocol::{Rotation, Vec3};

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn game_config() -> GameConfig {
    GameConfig {
        collectible_count: 3,
        world_extent: 0.0,
        inactivity_timeout: Duration::from_secs(3600),
        restart_delay: Duration::from_secs(3600),
        ..GameConfig::default()
    }
}

fn coordinator() -> Coordinator {
    Coordinator::new(CoordinatorConfig {
        game: game_config(),
        rooms: DirectoryConfig::default(),
    })
}

/// Joins a player and returns nothing; panics if the join is rejected.
fn join(c: &mut Coordinator, id: PlayerId) {
    let outcome = c.handle_event(id, ClientEvent::Join);
    assert!(
        matches!(outcome.reply, Some(ServerEvent::Welcome { .. })),
        "join should be welcomed"
    );
}

/// Creates a room and returns its id.
fn create_room(c: &mut Coordinator, creator: PlayerId, name: &str) -> RoomId {
    let outcome = c.handle_event(
        creator,
        ClientEvent::CreateRoom {
            name: name.to_string(),
            is_private: false,
        },
    );
    let created = outcome
        .deliveries
        .iter()
        .find_map(|d| match &d.event {
            ServerEvent::RoomCreated { room } => Some(room.id),
            _ => None,
        })
        .expect("public create broadcasts RoomCreated");
    created
}

fn events(deliveries: &[Delivery]) -> Vec<&ServerEvent> {
    deliveries.iter().map(|d| &d.event).collect()
}

// =========================================================================
// Join / leave / move
// =========================================================================

#[test]
fn test_join_welcomes_and_announces() {
    let mut c = coordinator();

    let outcome = c.handle_event(pid(1), ClientEvent::Join);

    match outcome.reply {
        Some(ServerEvent::Welcome { player, session }) => {
            assert_eq!(player.id, pid(1));
            assert_eq!(player.score, 0);
            assert!(session.is_active);
            assert_eq!(session.collectibles.len(), 3);
        }
        other => panic!("expected Welcome, got {other:?}"),
    }
    assert!(matches!(
        outcome.deliveries.as_slice(),
        [Delivery {
            audience: Audience::All,
            event: ServerEvent::PlayerJoined { .. }
        }]
    ));
}

#[test]
fn test_join_over_capacity_gets_error_reply() {
    let mut c = Coordinator::new(CoordinatorConfig {
        game: GameConfig {
            max_players: 1,
            ..game_config()
        },
        rooms: DirectoryConfig::default(),
    });
    join(&mut c, pid(1));

    let outcome = c.handle_event(pid(2), ClientEvent::Join);

    assert!(matches!(
        outcome.reply,
        Some(ServerEvent::Error { code: 503, .. })
    ));
    assert!(outcome.deliveries.is_empty(), "failures are never broadcast");
}

#[test]
fn test_move_broadcasts_position() {
    let mut c = coordinator();
    join(&mut c, pid(1));

    let pos = Vec3::new(5.0, 0.0, 5.0);
    let outcome = c.handle_event(
        pid(1),
        ClientEvent::Move {
            position: pos,
            rotation: Rotation::default(),
        },
    );

    match events(&outcome.deliveries).as_slice() {
        [ServerEvent::PlayerMoved {
            player_id,
            position,
            ..
        }] => {
            assert_eq!(*player_id, pid(1));
            assert_eq!(*position, pos);
        }
        other => panic!("expected PlayerMoved only, got {other:?}"),
    }
}

#[test]
fn test_move_from_departed_player_is_silent() {
    let mut c = coordinator();

    let outcome = c.handle_event(
        pid(9),
        ClientEvent::Move {
            position: Vec3::default(),
            rotation: Rotation::default(),
        },
    );

    assert!(outcome.reply.is_none());
    assert!(outcome.deliveries.is_empty());
}

#[test]
fn test_leave_closes_connection_and_announces() {
    let mut c = coordinator();
    join(&mut c, pid(1));

    let outcome = c.handle_event(pid(1), ClientEvent::Leave);

    assert!(outcome.close);
    assert!(matches!(
        events(&outcome.deliveries).as_slice(),
        [ServerEvent::PlayerLeft { player_id }] if *player_id == pid(1)
    ));
}

#[test]
fn test_disconnect_after_leave_is_silent() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    c.handle_event(pid(1), ClientEvent::Leave);

    let outcome = c.handle_disconnect(pid(1));

    assert!(outcome.deliveries.is_empty(), "nothing left to clean up");
}

// =========================================================================
// Collection
// =========================================================================

#[test]
fn test_explicit_collect_broadcasts_credit() {
    let mut c = coordinator();
    join(&mut c, pid(1)); // spawns at origin (world_extent 0)

    let outcome = c.handle_event(pid(1), ClientEvent::Collect { index: 0 });

    match events(&outcome.deliveries).as_slice() {
        [ServerEvent::Collected {
            player_id,
            index,
            value,
            player_score,
            session_score,
        }] => {
            assert_eq!(*player_id, pid(1));
            assert_eq!(*index, 0);
            assert_eq!(*value, 10);
            assert_eq!(*player_score, 10);
            assert_eq!(*session_score, 10);
        }
        other => panic!("expected Collected, got {other:?}"),
    }
}

#[test]
fn test_collect_race_one_winner_one_conflict() {
    // Scenario: two collect requests for index 1 arrive back to back.
    // The single-writer boundary serializes them; the loser gets a 409
    // reply and no broadcast.
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));

    let first = c.handle_event(pid(1), ClientEvent::Collect { index: 1 });
    let second = c.handle_event(pid(2), ClientEvent::Collect { index: 1 });

    assert!(matches!(
        events(&first.deliveries).as_slice(),
        [ServerEvent::Collected { .. }]
    ));
    assert!(matches!(
        second.reply,
        Some(ServerEvent::Error { code: 409, .. })
    ));
    assert!(second.deliveries.is_empty());
    assert_eq!(c.session().score(), 10);
}

#[test]
fn test_move_onto_collectible_auto_collects() {
    let mut c = coordinator();
    join(&mut c, pid(1));

    // Step away, then step back onto the origin pile.
    c.handle_event(
        pid(1),
        ClientEvent::Move {
            position: Vec3::new(10.0, 0.0, 10.0),
            rotation: Rotation::default(),
        },
    );
    let outcome = c.handle_event(
        pid(1),
        ClientEvent::Move {
            position: Vec3::default(),
            rotation: Rotation::default(),
        },
    );

    let evs = events(&outcome.deliveries);
    assert_eq!(evs.len(), 2);
    assert!(matches!(evs[0], ServerEvent::PlayerMoved { .. }));
    // Only the first eligible collectible is taken per update.
    assert!(
        matches!(evs[1], ServerEvent::Collected { index: 0, .. }),
        "got {:?}",
        evs[1]
    );
    assert_eq!(c.session().collectibles_remaining(), 2);
}

#[test]
fn test_aggregate_score_keeps_leavers_contribution() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    c.handle_event(pid(1), ClientEvent::Collect { index: 0 });
    c.handle_event(pid(2), ClientEvent::Collect { index: 1 });

    c.handle_event(pid(1), ClientEvent::Leave);

    assert_eq!(c.session().score(), 20);
}

// =========================================================================
// Session lifecycle through tick
// =========================================================================

#[test]
fn test_win_then_delayed_reset_cycle() {
    // Scenario: the field empties, the next tick ends the session, and
    // once the restart delay (zero here) elapses the following tick
    // resets everything.
    let mut c = Coordinator::new(CoordinatorConfig {
        game: GameConfig {
            restart_delay: Duration::ZERO,
            ..game_config()
        },
        rooms: DirectoryConfig::default(),
    });
    join(&mut c, pid(1));
    for index in 0..3 {
        c.handle_event(pid(1), ClientEvent::Collect { index });
    }

    let ended = c.tick();
    match events(&ended).as_slice() {
        [ServerEvent::SessionEnded { session }] => {
            assert!(!session.is_active);
            assert_eq!(session.score, 30);
        }
        other => panic!("expected SessionEnded, got {other:?}"),
    }

    let reset = c.tick();
    match events(&reset).as_slice() {
        [ServerEvent::SessionReset { session }] => {
            assert!(session.is_active);
            assert_eq!(session.score, 0);
            assert!(session.collectibles.iter().all(|col| !col.collected));
        }
        other => panic!("expected SessionReset, got {other:?}"),
    }
    assert_eq!(c.session().player(pid(1)).unwrap().score, 0);
}

#[test]
fn test_admin_reset_is_immediate() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    c.handle_event(pid(1), ClientEvent::Collect { index: 0 });

    let outcome = c.handle_event(pid(1), ClientEvent::ResetSession);

    assert!(matches!(
        events(&outcome.deliveries).as_slice(),
        [ServerEvent::SessionReset { .. }]
    ));
    assert_eq!(c.session().score(), 0);
    assert_eq!(c.session().collectibles_remaining(), 3);
}

#[test]
fn test_tick_is_quiet_midgame() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    assert!(c.tick().is_empty());
}

// =========================================================================
// Rooms through the event surface
// =========================================================================

#[test]
fn test_create_room_while_in_room_switches() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    let alpha = create_room(&mut c, pid(1), "Alpha");

    let outcome = c.handle_event(
        pid(1),
        ClientEvent::CreateRoom {
            name: "Beta".to_string(),
            is_private: false,
        },
    );

    // Solo creator switching away closes the old room first.
    let evs = events(&outcome.deliveries);
    assert!(
        matches!(evs[0], ServerEvent::RoomClosed { room_id } if *room_id == alpha)
    );
    assert!(matches!(evs[1], ServerEvent::RoomCreated { .. }));
    assert_eq!(c.rooms().room_count(), 1);
}

#[test]
fn test_private_room_replies_without_announcing() {
    let mut c = coordinator();
    join(&mut c, pid(1));

    let outcome = c.handle_event(
        pid(1),
        ClientEvent::CreateRoom {
            name: "Hideout".to_string(),
            is_private: true,
        },
    );

    assert!(matches!(
        outcome.reply,
        Some(ServerEvent::RoomCreated { .. })
    ));
    assert!(outcome.deliveries.is_empty());
    assert!(c.rooms().list_public().is_empty());
}

#[test]
fn test_join_room_targets_members_only() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    let room = create_room(&mut c, pid(1), "Alpha");

    let outcome =
        c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    match outcome.deliveries.as_slice() {
        [Delivery {
            audience: Audience::Players(targets),
            event: ServerEvent::RoomJoined { room: snap, player_id },
        }] => {
            assert_eq!(*player_id, pid(2));
            assert_eq!(snap.members, vec![pid(1), pid(2)]);
            assert_eq!(targets, &vec![pid(1), pid(2)]);
        }
        other => panic!("expected RoomJoined to members, got {other:?}"),
    }
}

#[test]
fn test_kick_reaches_remaining_members_and_target() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    join(&mut c, pid(3));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });
    c.handle_event(pid(3), ClientEvent::JoinRoom { room_id: room });

    let outcome = c.handle_event(
        pid(1),
        ClientEvent::KickPlayer {
            room_id: room,
            target: pid(2),
        },
    );

    match outcome.deliveries.as_slice() {
        [Delivery {
            audience: Audience::Players(targets),
            event: ServerEvent::PlayerKicked { player_id, .. },
        }] => {
            assert_eq!(*player_id, pid(2));
            // Remaining members plus the kicked player.
            assert!(targets.contains(&pid(1)));
            assert!(targets.contains(&pid(3)));
            assert!(targets.contains(&pid(2)));
        }
        other => panic!("expected PlayerKicked, got {other:?}"),
    }
    assert_eq!(c.rooms().player_room(pid(2)), None);
}

#[test]
fn test_kick_by_non_creator_rejected_with_403() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    let outcome = c.handle_event(
        pid(2),
        ClientEvent::KickPlayer {
            room_id: room,
            target: pid(1),
        },
    );

    assert!(matches!(
        outcome.reply,
        Some(ServerEvent::Error { code: 403, .. })
    ));
}

#[test]
fn test_creator_leave_transfers_ownership_in_broadcast() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    let outcome = c.handle_event(pid(1), ClientEvent::LeaveRoom);

    match events(&outcome.deliveries).as_slice() {
        [ServerEvent::RoomLeft {
            player_id,
            new_creator,
            ..
        }] => {
            assert_eq!(*player_id, pid(1));
            assert_eq!(*new_creator, Some(pid(2)));
        }
        other => panic!("expected RoomLeft, got {other:?}"),
    }
    assert_eq!(c.rooms().room(room).unwrap().creator, pid(2));
}

#[test]
fn test_chat_stays_within_room() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    join(&mut c, pid(3));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    let outcome = c.handle_event(
        pid(1),
        ClientEvent::Chat {
            message: "psst".to_string(),
        },
    );

    match outcome.deliveries.as_slice() {
        [Delivery {
            audience: Audience::Players(targets),
            event: ServerEvent::Chat { message, .. },
        }] => {
            assert_eq!(message, "psst");
            assert_eq!(targets, &vec![pid(1), pid(2)]);
        }
        other => panic!("expected room chat, got {other:?}"),
    }
}

#[test]
fn test_roomless_chat_goes_to_everyone() {
    let mut c = coordinator();
    join(&mut c, pid(1));

    let outcome = c.handle_event(
        pid(1),
        ClientEvent::Chat {
            message: "hello all".to_string(),
        },
    );

    assert!(matches!(
        outcome.deliveries.as_slice(),
        [Delivery {
            audience: Audience::All,
            event: ServerEvent::Chat { .. }
        }]
    ));
}

// =========================================================================
// Inactivity prune (tick) and stale-room sweep
// =========================================================================

#[test]
fn test_tick_prunes_silent_players_and_their_rooms() {
    // Scenario: every player goes silent; the next tick removes them
    // from the roster and cascades through their room, which empties
    // and closes.
    let mut c = Coordinator::new(CoordinatorConfig {
        game: GameConfig {
            inactivity_timeout: Duration::ZERO,
            ..game_config()
        },
        rooms: DirectoryConfig::default(),
    });
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    let deliveries = c.tick();

    let evs = events(&deliveries);
    let left = evs
        .iter()
        .filter(|e| matches!(e, ServerEvent::PlayerLeft { .. }))
        .count();
    assert_eq!(left, 2);
    assert!(
        evs.iter()
            .any(|e| matches!(e, ServerEvent::RoomClosed { room_id } if *room_id == room))
    );
    assert_eq!(c.session().player_count(), 0);
    assert_eq!(c.rooms().room_count(), 0);
}

#[test]
fn test_tick_prune_transfers_ownership_to_surviving_member() {
    // Scenario: the room's creator goes silent while another member
    // keeps reporting. The prune removes only the creator; the room
    // stays open and ownership passes to the survivor. This one needs a
    // short real timeout so the survivor's report can be newer than the
    // creator's last one.
    let mut c = Coordinator::new(CoordinatorConfig {
        game: GameConfig {
            inactivity_timeout: Duration::from_millis(100),
            ..game_config()
        },
        rooms: DirectoryConfig::default(),
    });
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    let room = create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::JoinRoom { room_id: room });

    std::thread::sleep(Duration::from_millis(150));
    c.handle_event(
        pid(2),
        ClientEvent::Move {
            position: Vec3::new(10.0, 0.0, 10.0),
            rotation: Rotation::default(),
        },
    );

    let deliveries = c.tick();

    let evs = events(&deliveries);
    assert!(evs.iter().any(
        |e| matches!(e, ServerEvent::PlayerLeft { player_id } if *player_id == pid(1))
    ));
    assert!(evs.iter().any(|e| matches!(
        e,
        ServerEvent::RoomLeft { player_id, new_creator, .. }
            if *player_id == pid(1) && *new_creator == Some(pid(2))
    )));
    assert!(c.session().contains_player(pid(2)));
    assert_eq!(c.rooms().room(room).unwrap().creator, pid(2));
    assert_eq!(c.rooms().player_room(pid(2)), Some(room));
}

#[test]
fn test_sweep_announces_stale_room_closures() {
    let mut c = Coordinator::new(CoordinatorConfig {
        game: game_config(),
        rooms: DirectoryConfig {
            room_timeout: Duration::ZERO,
            ..DirectoryConfig::default()
        },
    });
    join(&mut c, pid(1));
    let room = create_room(&mut c, pid(1), "Alpha");

    let deliveries = c.sweep();

    assert!(matches!(
        events(&deliveries).as_slice(),
        [ServerEvent::RoomClosed { room_id }] if *room_id == room
    ));
    assert_eq!(c.rooms().room_count(), 0);
    assert_eq!(c.rooms().player_room(pid(1)), None);
}

// =========================================================================
// Stats
// =========================================================================

#[test]
fn test_stats_reflect_current_state() {
    let mut c = coordinator();
    join(&mut c, pid(1));
    join(&mut c, pid(2));
    create_room(&mut c, pid(1), "Alpha");
    c.handle_event(pid(2), ClientEvent::Collect { index: 0 });

    let stats = c.stats();

    assert_eq!(stats.players, 2);
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.collectibles_remaining, 2);
}
