//! The shared game session for Prowl.
//!
//! This crate owns the hot state of the coordinator:
//!
//! 1. **Roster** — per-connection player records and activity tracking
//! 2. **Collectible field** — the scarce, exactly-once pickup set
//! 3. **Game session** — roster + field + aggregate score, with the
//!    `Active → Ended → (delay) → Active` lifecycle
//!
//! # Concurrency note
//!
//! Nothing in this crate is internally locked. A [`GameSession`] is owned
//! by a single coordinator and mutated behind one boundary at a higher
//! level, so every operation here is naturally atomic — including the
//! check-set-credit sequence that makes each collectible a one-winner
//! race.

mod config;
mod error;
mod field;
mod roster;
mod session;

pub use config::GameConfig;
pub use error::GameError;
pub use field::{Collectible, CollectibleField};
pub use roster::{Player, Roster};
pub use session::{GameSession, Pickup, SessionTransition};
