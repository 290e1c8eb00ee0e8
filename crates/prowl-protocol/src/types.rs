//! Core protocol types: identities, math primitives, the client event
//! taxonomy, and the server broadcast events with their snapshots.
//!
//! Everything here is serde-serializable — these are the exact shapes the
//! connection layer puts on the wire, so changing a field name here is a
//! protocol change.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Newtype over `u64` so a `PlayerId` can never be confused with a
/// [`RoomId`] at a call site. `#[serde(transparent)]` keeps the JSON
/// representation a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Math primitives
// ---------------------------------------------------------------------------

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A view orientation (yaw around the vertical axis, pitch up/down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a broadcast?
// ---------------------------------------------------------------------------

/// Specifies who should receive a [`ServerEvent`].
///
/// The coordinator pairs every outbound event with a `Recipient`; the
/// connection layer resolves it to concrete connections and delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected player.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Every current member of a room.
    Room(RoomId),
}

// ---------------------------------------------------------------------------
// Room settings
// ---------------------------------------------------------------------------

/// Creator-mutable room settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    /// Named rule set (free-form, interpreted by clients).
    pub game_mode: String,
    /// Match time limit in seconds.
    pub time_limit_secs: u32,
    /// Collectibles required to win under this rule set.
    pub collectibles_needed: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            game_mode: "standard".to_string(),
            time_limit_secs: 300,
            collectibles_needed: 15,
        }
    }
}

/// A partial settings update: only the provided fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub game_mode: Option<String>,
    pub time_limit_secs: Option<u32>,
    pub collectibles_needed: Option<u32>,
}

// ---------------------------------------------------------------------------
// Snapshots — consistent read-only views sent to clients
// ---------------------------------------------------------------------------

/// One player's public state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: Vec3,
    pub rotation: Rotation,
    pub score: u32,
    pub health: u8,
}

/// One collectible's public state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectibleSnapshot {
    pub id: usize,
    pub position: Vec3,
    pub value: u32,
    pub collected: bool,
}

/// The shared game session, as observed after a mutation completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Aggregate score: sum of every credited collection this session.
    pub score: u32,
    /// Seconds elapsed since the session (re)started.
    pub game_time_secs: f64,
    pub is_active: bool,
    pub players: Vec<PlayerSnapshot>,
    pub collectibles: Vec<CollectibleSnapshot>,
}

/// One room's public state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub creator: PlayerId,
    pub members: Vec<PlayerId>,
    pub max_players: usize,
    pub is_private: bool,
    pub settings: RoomSettings,
    pub is_active: bool,
}

/// Aggregate counts for the status surface. Pure function of state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub players: usize,
    pub rooms: usize,
    pub collectibles_remaining: usize,
    pub uptime_secs: u64,
}

// ---------------------------------------------------------------------------
// ClientEvent — inbound event taxonomy
// ---------------------------------------------------------------------------

/// Events a client may send.
///
/// Internally tagged (`{"type": "Move", ...}`) so the connection layer can
/// dispatch on a single field, and clients in dynamic languages get flat
/// objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Enter the shared game session.
    Join,

    /// Leave the session (the transport-level disconnect implies this too).
    Leave,

    /// Position/orientation report. Untrusted; the coordinator applies it
    /// and may award an automatic proximity pickup.
    Move { position: Vec3, rotation: Rotation },

    /// Explicit pickup attempt for the collectible at `index`.
    Collect { index: usize },

    /// Chat line, relayed to the sender's room (or everyone when roomless).
    Chat { message: String },

    // -- Room administration --
    /// Create a room; the sender becomes its creator and sole member.
    CreateRoom {
        name: String,
        #[serde(default)]
        is_private: bool,
    },

    /// Join an existing room (implicitly leaving any current one).
    JoinRoom { room_id: RoomId },

    /// Leave the current room.
    LeaveRoom,

    /// Merge a settings patch into a room (creator only).
    UpdateSettings {
        room_id: RoomId,
        #[serde(default)]
        patch: SettingsPatch,
    },

    /// Flip a room's match-active flag on (creator only).
    StartGame { room_id: RoomId },

    /// Flip a room's match-active flag off.
    EndGame { room_id: RoomId, reason: String },

    /// Remove another member from a room (creator only, never self).
    KickPlayer { room_id: RoomId, target: PlayerId },

    /// Toggle room visibility (creator only).
    SetPrivate { room_id: RoomId, private: bool },

    /// Administrative immediate session reset.
    ResetSession,
}

// ---------------------------------------------------------------------------
// ServerEvent — outbound broadcasts and replies
// ---------------------------------------------------------------------------

/// Events the coordinator emits.
///
/// Failures are always delivered as [`ServerEvent::Error`] to the
/// originating player only, never broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to a successful `Join`: who you are plus the full session.
    Welcome {
        player: PlayerSnapshot,
        session: SessionSnapshot,
    },

    PlayerJoined { player: PlayerSnapshot },
    PlayerLeft { player_id: PlayerId },
    PlayerMoved {
        player_id: PlayerId,
        position: Vec3,
        rotation: Rotation,
    },

    /// A collectible was credited (explicit or automatic pickup).
    Collected {
        player_id: PlayerId,
        index: usize,
        value: u32,
        player_score: u32,
        session_score: u32,
    },

    Chat { player_id: PlayerId, message: String },

    RoomCreated { room: RoomSnapshot },
    RoomJoined { room: RoomSnapshot, player_id: PlayerId },
    RoomLeft {
        room_id: RoomId,
        player_id: PlayerId,
        /// Set when the departing player was the creator and ownership
        /// moved to a remaining member.
        new_creator: Option<PlayerId>,
    },
    /// The room was deleted (last member left, or maintenance pruned it).
    RoomClosed { room_id: RoomId },
    RoomSettingsChanged { room: RoomSnapshot },
    GameStarted { room_id: RoomId },
    GameEnded { room_id: RoomId, reason: String },
    PlayerKicked { room_id: RoomId, player_id: PlayerId },

    /// All collectibles gone; a reset is scheduled.
    SessionEnded { session: SessionSnapshot },
    /// The session restarted with a fresh field and zeroed scores.
    SessionReset { session: SessionSnapshot },

    /// A request failed. `code` follows HTTP-style conventions.
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================
