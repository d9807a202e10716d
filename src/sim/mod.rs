//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod arena;
pub mod autopilot;
pub mod collision;
pub mod combat;
pub mod director;
pub mod meter;
pub mod physics;
pub mod placement;
pub mod registry;
pub mod state;
pub mod tick;
pub mod timer;

pub use arena::{Arena, ArenaView, ExpansionAxis, Occupancy};
pub use collision::Aabb;
pub use director::{Director, Encounter};
pub use meter::{Meter, MeterBand};
pub use physics::{Contact, ContactKind};
pub use registry::{Entity, EntityClass, EntityId, EntityKind, Registry};
pub use state::{GameEvent, GameOverSummary, GamePhase, GameState, Hud, MusicTrack, Player};
pub use tick::{TickInput, tick};
pub use timer::{Scheduler, TimerAction, TimerId};
