//! Simulation state and core types
//!
//! Everything a tick reads or writes lives in [`SimContext`], which the mode
//! state machine owns and lends to each subsystem.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::trail::TrailTracker;
use crate::consts::*;
use crate::palette;
use crate::tuning::Tuning;

/// Entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    /// Green order, worth order points
    Buy,
    /// Purple order, worth order points
    Sell,
    /// Rare bonus
    Hype,
    /// Ends the session when slashed
    Hazard,
}

impl EntityKind {
    /// Map one uniform draw in [0, 1) to a kind.
    ///
    /// Thresholds are checked high to low: Hype 4%, Hazard 11%, Sell 40%,
    /// Buy 45%.
    pub fn from_roll(roll: f32) -> Self {
        if roll > HYPE_THRESHOLD {
            EntityKind::Hype
        } else if roll > HAZARD_THRESHOLD {
            EntityKind::Hazard
        } else if roll > SELL_THRESHOLD {
            EntityKind::Sell
        } else {
            EntityKind::Buy
        }
    }

    /// Radius used for hit tolerance and render scale
    pub fn size(self) -> f32 {
        match self {
            EntityKind::Hype => HYPE_SIZE,
            EntityKind::Hazard => HAZARD_SIZE,
            EntityKind::Buy | EntityKind::Sell => ORDER_SIZE,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            EntityKind::Buy => palette::GREEN,
            EntityKind::Sell => palette::PURPLE,
            EntityKind::Hype => palette::HYPE,
            EntityKind::Hazard => palette::REKT,
        }
    }

    /// Points awarded for a hit (None for Hazard)
    pub fn points(self, tuning: &Tuning) -> Option<u64> {
        match self {
            EntityKind::Buy | EntityKind::Sell => Some(tuning.order_points),
            EntityKind::Hype => Some(tuning.hype_points),
            EntityKind::Hazard => None,
        }
    }
}

/// A falling or drifting slashable object
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Cosmetic only
    pub rotation: f32,
    pub rotation_speed: f32,
    pub kind: EntityKind,
    /// Set once when slashed; resolved entities are inert
    pub resolved: bool,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            size: kind.size(),
            rotation: 0.0,
            rotation_speed: 0.0,
            kind,
            resolved: false,
        }
    }
}

/// A particle for hit feedback
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1.0 at birth, removed at 0
    pub life: f32,
    pub color: &'static str,
}

/// Current simulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Idle demo behind the start screen
    Attract,
    /// Pre-game countdown, no entities
    Countdown { remaining: u8 },
    /// Play in progress
    Active,
    /// Session ended by a hazard hit
    GameOver,
}

/// Signals the engine emits to the session controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameEvent {
    /// An entity was slashed; drives the transient screen flash
    Slash { color: &'static str },
    /// Score increase
    Score { delta: u64 },
    /// Hazard hit, carrying the score as it stood before the hit
    GameOver { final_score: u64 },
}

/// Screen-space bounds of the playfield
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Mutable simulation context
#[derive(Debug, Clone)]
pub struct SimContext {
    pub viewport: Viewport,
    pub tuning: Tuning,
    /// Live entities (sorted by id)
    pub entities: Vec<Entity>,
    pub particles: Vec<Particle>,
    pub trail: TrailTracker,
    /// Ticks elapsed in the current spawning mode
    pub frame: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl SimContext {
    /// `tuning` is sanitized on the way in
    pub fn new(seed: u64, viewport: Viewport, tuning: Tuning) -> Self {
        Self {
            viewport,
            tuning: tuning.sanitized(),
            entities: Vec::new(),
            particles: Vec::new(),
            trail: TrailTracker::new(),
            frame: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 0,
        }
    }

    /// Allocate a new entity ID (never reused, survives resets)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop all entities, particles and trail points
    pub fn purge(&mut self) {
        self.entities.clear();
        self.particles.clear();
        self.trail.clear();
        self.frame = 0;
    }

    /// Count of entities still in play
    pub fn live_entities(&self) -> usize {
        self.entities.iter().filter(|e| !e.resolved).count()
    }

    /// Ensure entities are sorted by ID for stable resolution order
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }
}

/// Render-facing copy of the simulation
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub viewport: Viewport,
    /// Unresolved entities only
    pub entities: Vec<Entity>,
    pub particles: Vec<Particle>,
    /// Trail polyline, oldest first
    pub trail: Vec<Vec2>,
}

impl Snapshot {
    pub fn capture(mode: Mode, ctx: &SimContext) -> Self {
        Self {
            mode,
            viewport: ctx.viewport,
            entities: ctx.entities.iter().filter(|e| !e.resolved).cloned().collect(),
            particles: ctx.particles.clone(),
            trail: ctx.trail.points().iter().map(|p| p.pos).collect(),
        }
    }
}
