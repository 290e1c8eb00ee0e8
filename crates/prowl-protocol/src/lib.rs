//! Wire protocol for Prowl.
//!
//! Defines the "language" that clients and the coordinator speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], snapshots, ids) — the
//!   structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the
//! coordinator (game semantics). It knows nothing about connections,
//! rooms, or scoring rules — only about message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, CollectibleSnapshot, PlayerId, PlayerSnapshot, Recipient,
    Rotation, RoomId, RoomSettings, RoomSnapshot, ServerEvent,
    SessionSnapshot, SettingsPatch, StatsSnapshot, Vec3,
};
