//! Hyslash - A pointer-slashing arcade game
//!
//! Core modules:
//! - `sim`: Simulation (spawning, physics, trail collision, mode state machine)
//! - `session`: Score, high score, countdown and game-over bookkeeping
//! - `sentiment`: Best-effort game-over commentary from an external generator
//! - `highscores`: Single-value high score persistence
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod platform;
pub mod sentiment;
pub mod session;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScore, HighScoreStore, MemoryStore};
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Downward acceleration applied to active entities (px/tick²)
    pub const GRAVITY: f32 = 0.28;

    /// Active entities spawn this far below the bottom edge
    pub const SPAWN_BELOW_EDGE: f32 = 60.0;
    /// Active entities are dropped once this far below the bottom edge
    pub const DESPAWN_MARGIN: f32 = 120.0;
    /// Fraction of the screen width (centered) used for active spawns
    pub const SPAWN_WIDTH_FRACTION: f32 = 0.7;
    /// Launch impulse: vy in [-(MIN + SPREAD), -MIN]
    pub const LAUNCH_VY_MIN: f32 = 16.0;
    pub const LAUNCH_VY_SPREAD: f32 = 9.0;
    /// Launch jitter: vx in [-SPREAD/2, SPREAD/2]
    pub const LAUNCH_VX_SPREAD: f32 = 7.0;

    /// Spawn cadence: N = max(MIN, BASE - floor(score / SCORE_STEP))
    pub const BASE_SPAWN_INTERVAL: u64 = 45;
    pub const MIN_SPAWN_INTERVAL: u64 = 8;
    pub const SCORE_PER_INTERVAL_STEP: u64 = 25_000;

    /// Attract mode spawns one entity per this many ticks
    pub const ATTRACT_SPAWN_INTERVAL: u64 = 40;
    /// Attract mode never holds more than this many entities
    pub const ATTRACT_MAX_ENTITIES: usize = 15;
    /// Attract velocity components are drawn from [-SPEED, SPEED]
    pub const ATTRACT_SPEED: f32 = 2.0;

    /// Rotation speed in [-SPREAD/2, SPREAD/2] radians/tick
    pub const ROTATION_SPEED_SPREAD: f32 = 0.12;

    /// Cumulative type thresholds, compared high to low on one draw
    pub const HYPE_THRESHOLD: f32 = 0.96;
    pub const HAZARD_THRESHOLD: f32 = 0.85;
    pub const SELL_THRESHOLD: f32 = 0.45;

    /// Entity sizes by kind
    pub const HYPE_SIZE: f32 = 45.0;
    pub const HAZARD_SIZE: f32 = 40.0;
    pub const ORDER_SIZE: f32 = 35.0;

    /// Midpoint distance must stay under this multiple of entity size
    pub const MIDPOINT_TOLERANCE: f32 = 1.8;

    /// Score for Buy/Sell and Hype hits
    pub const ORDER_POINTS: u64 = 1250;
    pub const HYPE_POINTS: u64 = 7500;

    /// Particles per hit burst
    pub const PARTICLE_BURST: usize = 15;
    /// Particle velocity components in [-SPREAD/2, SPREAD/2]
    pub const PARTICLE_SPEED_SPREAD: f32 = 12.0;
    /// Life lost per tick (1.0 -> 0 in 40 ticks)
    pub const PARTICLE_DECAY: f32 = 0.025;
    /// Absorbs f32 drift so a particle dies on exactly its 40th tick
    pub const PARTICLE_LIFE_EPSILON: f32 = 1e-4;

    /// Trail samples older than this are dropped
    pub const TRAIL_MAX_AGE_MS: f64 = 180.0;

    /// Countdown length in steps, one step per second
    pub const COUNTDOWN_STEPS: u8 = 3;
    pub const COUNTDOWN_STEP_MS: f64 = 1000.0;

    /// How long a slash flash stays visible
    pub const SLASH_FLASH_MS: f64 = 150.0;
}

/// Entity and particle colors
pub mod palette {
    pub const GREEN: &str = "#2af598";
    pub const PURPLE: &str = "#9d4edd";
    pub const REKT: &str = "#ff4d4d";
    pub const HYPE: &str = "#ffffff";
}
