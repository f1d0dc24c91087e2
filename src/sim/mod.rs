//! Simulation module
//!
//! All gameplay logic lives here. No rendering or platform dependencies:
//! - One tick per host frame
//! - Seeded RNG only
//! - Stable resolution order (by entity ID)

pub mod collision;
pub mod mode;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod trail;

pub use collision::{SlashOutcome, SlashProbe, resolve_slashes, segment_hits};
pub use mode::ModeMachine;
pub use spawn::spawn_interval;
pub use state::{
    Entity, EntityKind, GameEvent, Mode, Particle, SimContext, Snapshot, Viewport,
};
pub use tick::{TickInput, TickOutcome, tick};
pub use trail::{Segment, TrailPoint, TrailTracker};
