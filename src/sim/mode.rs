//! Mode state machine
//!
//! Owns the simulation context and gates which subsystems run. Resets are
//! entry actions on transition edges:
//!
//! ```text
//! Attract ──start──▶ Countdown(3) ──step×3──▶ Active ──hazard──▶ GameOver
//!    ▲                    ▲                     │                   │
//!    └──────go_home───────┼─────────────────────┘                   │
//!    └──────go_home───────┼─────────────────────────────────────────┘
//!                         └──────────────start──────────────────────┘
//! ```

use glam::Vec2;

use super::state::{GameEvent, Mode, SimContext, Snapshot, Viewport};
use super::tick::{TickInput, tick};
use crate::tuning::Tuning;

/// The engine: current mode plus the context it gates
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    ctx: SimContext,
}

impl ModeMachine {
    /// Create an engine idling in Attract mode
    pub fn new(seed: u64, viewport: Viewport, tuning: Tuning) -> Self {
        Self {
            mode: Mode::Attract,
            ctx: SimContext::new(seed, viewport, tuning),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Countdown steps left, if counting down
    pub fn countdown_remaining(&self) -> Option<u8> {
        match self.mode {
            Mode::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Request a new session (valid from Attract or GameOver)
    pub fn start(&mut self) -> bool {
        match self.mode {
            Mode::Attract | Mode::GameOver => {
                let remaining = self.ctx.tuning.countdown_steps;
                self.enter(Mode::Countdown { remaining });
                true
            }
            _ => {
                log::debug!("Ignoring start request in {:?}", self.mode);
                false
            }
        }
    }

    /// Advance the countdown by one step (valid only in Countdown)
    pub fn countdown_step(&mut self) -> bool {
        match self.mode {
            Mode::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.enter(Mode::Active);
                } else {
                    self.mode = Mode::Countdown { remaining };
                }
                true
            }
            _ => {
                log::debug!("Ignoring countdown step in {:?}", self.mode);
                false
            }
        }
    }

    /// Return to the attract screen (valid from Active or GameOver)
    pub fn go_home(&mut self) -> bool {
        match self.mode {
            Mode::Active | Mode::GameOver => {
                self.enter(Mode::Attract);
                true
            }
            _ => {
                log::debug!("Ignoring go-home request in {:?}", self.mode);
                false
            }
        }
    }

    /// Switch modes and run the destination's entry action
    fn enter(&mut self, next: Mode) {
        log::info!("Mode {:?} -> {:?}", self.mode, next);
        match next {
            Mode::Countdown { .. } => self.ctx.purge(),
            Mode::Attract => {
                let cap = self.ctx.tuning.attract_max_entities;
                self.ctx.entities.retain(|e| !e.resolved);
                if self.ctx.entities.len() > cap {
                    let excess = self.ctx.entities.len() - cap;
                    self.ctx.normalize_order();
                    self.ctx.entities.drain(..excess);
                }
                self.ctx.frame = 0;
            }
            Mode::Active => self.ctx.frame = 0,
            Mode::GameOver => {}
        }
        self.mode = next;
    }

    /// Run one simulation tick
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let outcome = tick(&mut self.ctx, self.mode, input);
        if outcome.game_over && self.mode == Mode::Active {
            self.enter(Mode::GameOver);
        }
        outcome.events
    }

    // --- Pointer input: only ever touches the trail ---

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.ctx.trail.press(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2, time_ms: f64) {
        self.ctx.trail.record(pos, time_ms);
    }

    pub fn pointer_up(&mut self) {
        self.ctx.trail.release();
    }

    /// Track a canvas resize
    pub fn resize(&mut self, viewport: Viewport) {
        self.ctx.viewport = viewport;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.mode, &self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::spawn_active;
    use crate::sim::state::{EntityKind, Entity, Particle};

    fn machine() -> ModeMachine {
        ModeMachine::new(99, Viewport::new(800.0, 600.0), Tuning::default())
    }

    fn to_active(m: &mut ModeMachine) {
        assert!(m.start());
        for _ in 0..3 {
            assert!(m.countdown_step());
        }
        assert_eq!(m.mode(), Mode::Active);
    }

    #[test]
    fn test_countdown_cannot_be_skipped() {
        let mut m = machine();
        assert_eq!(m.mode(), Mode::Attract);
        assert!(!m.countdown_step());
        assert!(!m.go_home());

        assert!(m.start());
        assert_eq!(m.countdown_remaining(), Some(3));
        assert!(!m.start());
        assert!(!m.go_home());

        assert!(m.countdown_step());
        assert!(m.countdown_step());
        assert_eq!(m.countdown_remaining(), Some(1));
        assert!(m.countdown_step());
        assert_eq!(m.mode(), Mode::Active);
        assert!(!m.start());
    }

    #[test]
    fn test_start_purges_everything() {
        let mut m = machine();
        for _ in 0..200 {
            m.tick(&TickInput::default());
        }
        let ctx = m.context_mut();
        ctx.particles.push(Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 1.0,
            color: crate::palette::GREEN,
        });
        ctx.trail.record(Vec2::ONE, 0.0);
        assert!(!m.context().entities.is_empty());

        m.start();
        m.tick(&TickInput::default());
        assert!(m.context().entities.is_empty());
        assert!(m.context().particles.is_empty());
        assert!(m.context().trail.is_empty());
    }

    #[test]
    fn test_hazard_hit_ends_game() {
        let mut m = machine();
        to_active(&mut m);

        let ctx = m.context_mut();
        let id = ctx.next_entity_id();
        ctx.entities.push(Entity::new(id, EntityKind::Hazard, Vec2::new(100.0, 100.0), Vec2::ZERO));

        m.pointer_down(Vec2::new(50.0, 100.0));
        m.pointer_move(Vec2::new(150.0, 100.0), 0.0);
        let events = m.tick(&TickInput { now_ms: 0.0, score: 5000 });

        assert!(events.contains(&GameEvent::GameOver { final_score: 5000 }));
        assert_eq!(m.mode(), Mode::GameOver);

        // Terminal until an explicit request
        m.tick(&TickInput::default());
        assert_eq!(m.mode(), Mode::GameOver);
        assert!(m.go_home());
        assert_eq!(m.mode(), Mode::Attract);
    }

    #[test]
    fn test_game_over_restart() {
        let mut m = machine();
        to_active(&mut m);
        m.enter(Mode::GameOver);
        assert!(m.start());
        assert_eq!(m.countdown_remaining(), Some(3));
    }

    #[test]
    fn test_go_home_trims_to_attract_cap() {
        let mut m = machine();
        to_active(&mut m);
        let ids: Vec<u32> = (0..25).map(|_| spawn_active(m.context_mut())).collect();

        assert!(m.go_home());
        let kept: Vec<u32> = m.context().entities.iter().map(|e| e.id).collect();
        assert_eq!(kept, ids[10..].to_vec());
    }
}
