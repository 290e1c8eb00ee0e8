//! The coordinator: single owner of all mutable game state.
//!
//! Every inbound event, the fixed-rate session tick, and the maintenance
//! sweep funnel through one `Coordinator` behind one lock, so no two
//! mutations ever interleave and every cross-map invariant (one room per
//! player, exactly-once collection) holds atomically. Broadcast
//! recipients are resolved here, from the same consistent state the
//! mutation produced; the server delivers them after the lock is
//! released.

use std::time::Instant;

use prowl_game::{GameConfig, GameError, GameSession, SessionTransition};
use prowl_protocol::{
    ClientEvent, PlayerId, Recipient, RoomId, ServerEvent, StatsSnapshot,
};
use prowl_room::{DirectoryConfig, LeaveOutcome, RoomDirectory, RoomError};

/// Configuration for one coordinator instance.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub game: GameConfig,
    pub rooms: DirectoryConfig,
}

/// Who receives one outbound event, resolved at mutation time.
///
/// Room recipients are resolved to player lists immediately because the
/// room may no longer exist by delivery time (a leave can close it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    Players(Vec<PlayerId>),
}

/// One outbound event plus its resolved audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: ServerEvent,
}

/// The result of handling one inbound event.
///
/// `reply` goes to the originating connection only — failures are never
/// broadcast. `deliveries` are fanned out by the server after the
/// coordinator lock is released.
#[derive(Debug, Default)]
pub struct Outcome {
    pub reply: Option<ServerEvent>,
    pub deliveries: Vec<Delivery>,
    /// The connection should close after this outcome is flushed.
    pub close: bool,
}

impl Outcome {
    fn reply(event: ServerEvent) -> Self {
        Self {
            reply: Some(event),
            ..Self::default()
        }
    }

    fn broadcast(deliveries: Vec<Delivery>) -> Self {
        Self {
            deliveries,
            ..Self::default()
        }
    }
}

/// The authoritative multiplayer coordinator.
///
/// Owns the shared game session, the room directory, and the reverse
/// player-to-room index (inside the directory). No other component holds
/// a mutable reference to any of them.
pub struct Coordinator {
    session: GameSession,
    rooms: RoomDirectory,
    started_at: Instant,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            session: GameSession::new(config.game),
            rooms: RoomDirectory::new(config.rooms),
            started_at: Instant::now(),
        }
    }

    /// Dispatches one inbound event from `player`.
    ///
    /// Never panics and never returns an error across this boundary:
    /// per-request failures come back as [`ServerEvent::Error`] replies,
    /// and stale-event races (a move from a player who already left) are
    /// silent no-ops.
    pub fn handle_event(
        &mut self,
        player: PlayerId,
        event: ClientEvent,
    ) -> Outcome {
        match event {
            ClientEvent::Join => self.on_join(player),
            ClientEvent::Leave => Outcome {
                close: true,
                deliveries: self.remove_player(player),
                ..Outcome::default()
            },
            ClientEvent::Move { position, rotation } => {
                self.on_move(player, position, rotation)
            }
            ClientEvent::Collect { index } => self.on_collect(player, index),
            ClientEvent::Chat { message } => self.on_chat(player, message),
            ClientEvent::CreateRoom { name, is_private } => {
                self.on_create_room(player, name, is_private)
            }
            ClientEvent::JoinRoom { room_id } => {
                self.on_join_room(player, room_id)
            }
            ClientEvent::LeaveRoom => {
                let deliveries = match self.rooms.leave_room(player) {
                    Some(outcome) => self.leave_deliveries(outcome),
                    None => Vec::new(),
                };
                Outcome::broadcast(deliveries)
            }
            ClientEvent::UpdateSettings { room_id, patch } => {
                match self.rooms.update_settings(room_id, patch, player) {
                    Ok(room) => Outcome::broadcast(vec![self.to_room(
                        room_id,
                        ServerEvent::RoomSettingsChanged { room },
                    )]),
                    Err(e) => room_failure(e),
                }
            }
            ClientEvent::StartGame { room_id } => {
                match self.rooms.start_game(room_id, player) {
                    Ok(_) => Outcome::broadcast(vec![self.to_room(
                        room_id,
                        ServerEvent::GameStarted { room_id },
                    )]),
                    Err(e) => room_failure(e),
                }
            }
            ClientEvent::EndGame { room_id, reason } => {
                match self.rooms.end_game(room_id) {
                    Ok(_) => Outcome::broadcast(vec![self.to_room(
                        room_id,
                        ServerEvent::GameEnded { room_id, reason },
                    )]),
                    Err(e) => room_failure(e),
                }
            }
            ClientEvent::KickPlayer { room_id, target } => {
                self.on_kick(player, room_id, target)
            }
            ClientEvent::SetPrivate { room_id, private } => {
                match self.rooms.set_private(room_id, private, player) {
                    Ok(room) => Outcome::broadcast(vec![self.to_room(
                        room_id,
                        ServerEvent::RoomSettingsChanged { room },
                    )]),
                    Err(e) => room_failure(e),
                }
            }
            ClientEvent::ResetSession => {
                self.session.reset();
                Outcome::broadcast(vec![Delivery {
                    audience: Audience::All,
                    event: ServerEvent::SessionReset {
                        session: self.session.snapshot(),
                    },
                }])
            }
        }
    }

    /// Cleans up after a vanished connection.
    ///
    /// Fired exactly once per connection by the handler's drop guard.
    /// Idempotent anyway: a disconnect racing an explicit `Leave` finds
    /// nothing left to remove and produces no broadcasts.
    pub fn handle_disconnect(&mut self, player: PlayerId) -> Outcome {
        Outcome::broadcast(self.remove_player(player))
    }

    /// Advances session timers and prunes inactive players. One call per
    /// session tick.
    pub fn tick(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        // Roster-driven prune: silent players leave their room and the
        // session exactly as an explicit leave would.
        for id in self.session.prune_inactive() {
            if let Some(outcome) = self.rooms.leave_room(id) {
                deliveries.extend(self.leave_deliveries(outcome));
            }
            deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::PlayerLeft { player_id: id },
            });
        }

        match self.session.tick() {
            Some(SessionTransition::Ended) => deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::SessionEnded {
                    session: self.session.snapshot(),
                },
            }),
            Some(SessionTransition::Restarted) => deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::SessionReset {
                    session: self.session.snapshot(),
                },
            }),
            None => {}
        }

        deliveries
    }

    /// Deletes empty and stale rooms. One call per maintenance period.
    pub fn sweep(&mut self) -> Vec<Delivery> {
        self.rooms
            .sweep()
            .into_iter()
            .map(|room_id| Delivery {
                audience: Audience::All,
                event: ServerEvent::RoomClosed { room_id },
            })
            .collect()
    }

    /// Aggregate counts for the status surface.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            players: self.session.player_count(),
            rooms: self.rooms.room_count(),
            collectibles_remaining: self.session.collectibles_remaining(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    // -- Event handlers -----------------------------------------------------

    fn on_join(&mut self, player: PlayerId) -> Outcome {
        let spawn = self.session.spawn_point();
        let snapshot = match self.session.add_player(player, spawn) {
            Ok(p) => p.snapshot(),
            Err(e) => return game_failure(e),
        };

        Outcome {
            reply: Some(ServerEvent::Welcome {
                player: snapshot.clone(),
                session: self.session.snapshot(),
            }),
            deliveries: vec![Delivery {
                audience: Audience::All,
                event: ServerEvent::PlayerJoined { player: snapshot },
            }],
            close: false,
        }
    }

    fn on_move(
        &mut self,
        player: PlayerId,
        position: prowl_protocol::Vec3,
        rotation: prowl_protocol::Rotation,
    ) -> Outcome {
        let pickup = self.session.update_player(player, position, rotation);
        if !self.session.contains_player(player) {
            // Stale in-flight move from a player who already left.
            return Outcome::default();
        }

        let mut deliveries = vec![Delivery {
            audience: Audience::All,
            event: ServerEvent::PlayerMoved {
                player_id: player,
                position,
                rotation,
            },
        }];
        if let Some(p) = pickup {
            deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::Collected {
                    player_id: player,
                    index: p.index,
                    value: p.value,
                    player_score: p.player_score,
                    session_score: p.session_score,
                },
            });
        }
        Outcome::broadcast(deliveries)
    }

    fn on_collect(&mut self, player: PlayerId, index: usize) -> Outcome {
        match self.session.collect(player, index) {
            Ok(p) => Outcome::broadcast(vec![Delivery {
                audience: Audience::All,
                event: ServerEvent::Collected {
                    player_id: player,
                    index: p.index,
                    value: p.value,
                    player_score: p.player_score,
                    session_score: p.session_score,
                },
            }]),
            Err(e) => game_failure(e),
        }
    }

    fn on_chat(&mut self, player: PlayerId, message: String) -> Outcome {
        if !self.session.contains_player(player) {
            return Outcome::default();
        }
        // Room members only when the sender is in one, everyone otherwise.
        let audience = match self.rooms.player_room(player) {
            Some(room_id) => self.audience(Recipient::Room(room_id)),
            None => Audience::All,
        };
        Outcome::broadcast(vec![Delivery {
            audience,
            event: ServerEvent::Chat {
                player_id: player,
                message,
            },
        }])
    }

    fn on_create_room(
        &mut self,
        player: PlayerId,
        name: String,
        is_private: bool,
    ) -> Outcome {
        // Directory invariants require the creator to be roomless; any
        // current membership is released as part of this operation.
        let mut deliveries = match self.rooms.leave_room(player) {
            Some(outcome) => self.leave_deliveries(outcome),
            None => Vec::new(),
        };

        let room = self.rooms.create_room(name, player, is_private);
        let reply = if is_private {
            // Private rooms are not announced; only the creator hears.
            Some(ServerEvent::RoomCreated { room })
        } else {
            deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::RoomCreated { room },
            });
            None
        };

        Outcome {
            reply,
            deliveries,
            close: false,
        }
    }

    fn on_join_room(&mut self, player: PlayerId, room_id: RoomId) -> Outcome {
        match self.rooms.join_room(room_id, player) {
            Ok(outcome) => {
                let mut deliveries = match outcome.left {
                    Some(left) => self.leave_deliveries(left),
                    None => Vec::new(),
                };
                deliveries.push(Delivery {
                    audience: Audience::Players(outcome.room.members.clone()),
                    event: ServerEvent::RoomJoined {
                        room: outcome.room,
                        player_id: player,
                    },
                });
                Outcome::broadcast(deliveries)
            }
            Err(e) => room_failure(e),
        }
    }

    fn on_kick(
        &mut self,
        requester: PlayerId,
        room_id: RoomId,
        target: PlayerId,
    ) -> Outcome {
        match self.rooms.kick_player(room_id, target, requester) {
            Ok(_) => {
                // The requester (creator) is still a member, so the room
                // survived. Tell the remaining members and the target.
                let mut delivery = self.to_room(
                    room_id,
                    ServerEvent::PlayerKicked {
                        room_id,
                        player_id: target,
                    },
                );
                if let Audience::Players(targets) = &mut delivery.audience {
                    targets.push(target);
                }
                Outcome::broadcast(vec![delivery])
            }
            Err(e) => room_failure(e),
        }
    }

    // -- Helpers ------------------------------------------------------------

    /// Removes a player from their room and the session, producing the
    /// cascade of broadcasts. Idempotent.
    fn remove_player(&mut self, player: PlayerId) -> Vec<Delivery> {
        let mut deliveries = match self.rooms.leave_room(player) {
            Some(outcome) => self.leave_deliveries(outcome),
            None => Vec::new(),
        };
        if self.session.contains_player(player) {
            self.session.remove_player(player);
            deliveries.push(Delivery {
                audience: Audience::All,
                event: ServerEvent::PlayerLeft { player_id: player },
            });
        }
        deliveries
    }

    /// Broadcasts for one leave cascade: a closure goes to everyone (the
    /// lobby listing changed), a plain departure to the remaining members
    /// plus the leaver.
    fn leave_deliveries(&self, outcome: LeaveOutcome) -> Vec<Delivery> {
        if outcome.closed {
            return vec![Delivery {
                audience: Audience::All,
                event: ServerEvent::RoomClosed {
                    room_id: outcome.room_id,
                },
            }];
        }

        let mut delivery = self.to_room(
            outcome.room_id,
            ServerEvent::RoomLeft {
                room_id: outcome.room_id,
                player_id: outcome.player,
                new_creator: outcome.new_creator,
            },
        );
        if let Audience::Players(targets) = &mut delivery.audience {
            targets.push(outcome.player);
        }
        vec![delivery]
    }

    /// Resolves a recipient to a concrete audience from current state.
    fn audience(&self, recipient: Recipient) -> Audience {
        match recipient {
            Recipient::All => Audience::All,
            Recipient::Player(id) => Audience::Players(vec![id]),
            Recipient::Room(room_id) => Audience::Players(
                self.rooms
                    .members(room_id)
                    .map(<[PlayerId]>::to_vec)
                    .unwrap_or_default(),
            ),
        }
    }

    fn to_room(&self, room_id: RoomId, event: ServerEvent) -> Delivery {
        Delivery {
            audience: self.audience(Recipient::Room(room_id)),
            event,
        }
    }
}

// -- Error-to-reply mapping -----------------------------------------------

fn game_failure(e: GameError) -> Outcome {
    let code = match e {
        GameError::CapacityExceeded(_) => 503,
        GameError::PlayerNotFound(_) | GameError::InvalidIndex(_) => 404,
        GameError::AlreadyCollected(_) => 409,
        GameError::TooFar(_) => 400,
    };
    tracing::debug!(code, error = %e, "request rejected");
    Outcome::reply(ServerEvent::Error {
        code,
        message: e.to_string(),
    })
}

fn room_failure(e: RoomError) -> Outcome {
    let code = match e {
        RoomError::RoomNotFound(_) | RoomError::PlayerNotInRoom(..) => 404,
        RoomError::RoomFull(_)
        | RoomError::AlreadyActive(_)
        | RoomError::NotActive(_) => 409,
        RoomError::NotAuthorized { .. } => 403,
        RoomError::SelfKick(_) => 400,
    };
    tracing::debug!(code, error = %e, "request rejected");
    Outcome::reply(ServerEvent::Error {
        code,
        message: e.to_string(),
    })
}
