//! # Prowl
//!
//! Authoritative multiplayer game coordinator.
//!
//! Prowl tracks connected players, groups them into rooms, advances a
//! shared game-session state machine, and arbitrates score-affecting
//! events (collectible pickups) against concurrent, untrusted client
//! reports. All mutable state lives in one [`Coordinator`] behind a
//! single lock: inbound events, the fixed-rate session tick, and the
//! maintenance sweep all funnel through it, which is what keeps global
//! invariants (one room per player, exactly-once collection, ownership
//! continuity) intact under arbitrarily-ordered events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prowl::ProwlServer;
//!
//! # async fn run() -> Result<(), prowl::ProwlError> {
//! let server = ProwlServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod coordinator;
mod error;
mod handler;
mod server;

pub use coordinator::{
    Audience, Coordinator, CoordinatorConfig, Delivery, Outcome,
};
pub use error::ProwlError;
pub use server::{ProwlServer, ProwlServerBuilder};

pub use prowl_game::{GameConfig, GameError};
pub use prowl_protocol::{ClientEvent, PlayerId, RoomId, ServerEvent};
pub use prowl_room::{DirectoryConfig, RoomError};
