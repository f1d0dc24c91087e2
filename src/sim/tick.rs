//! Per-frame simulation tick
//!
//! One tick runs per display refresh. The tick rate follows the host's frame
//! cadence; there is no fixed-timestep accumulator, so every rate below is
//! per tick.

use super::collision::resolve_slashes;
use super::spawn::maybe_spawn;
use super::state::{GameEvent, Mode, SimContext};
use crate::consts::PARTICLE_LIFE_EPSILON;

/// Inputs for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Host clock in milliseconds, same timebase as trail samples
    pub now_ms: f64,
    /// Authoritative score from the session controller
    pub score: u64,
}

/// What a tick produced
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub events: Vec<GameEvent>,
    /// A hazard was slashed this tick
    pub game_over: bool,
}

/// Advance the simulation by one tick in `mode`
pub fn tick(ctx: &mut SimContext, mode: Mode, input: &TickInput) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    // Always drain the stroke so a segment drawn outside play can't land later
    let segments = ctx.trail.take_segments();

    match mode {
        Mode::Active => {
            ctx.frame += 1;
            maybe_spawn(ctx, mode, input.score);
            integrate_active(ctx);

            let mut score = input.score;
            for segment in &segments {
                let slashes = resolve_slashes(ctx, segment, score);
                score = slashes.score;
                outcome.events.extend(slashes.events);
                if slashes.game_over {
                    outcome.game_over = true;
                    break;
                }
            }

            ctx.entities.retain(|e| !e.resolved);
        }
        Mode::Attract => {
            ctx.frame += 1;
            maybe_spawn(ctx, mode, input.score);
            integrate_attract(ctx);
        }
        // Entities stay frozen; only feedback decays
        Mode::Countdown { .. } | Mode::GameOver => {}
    }

    decay_particles(ctx);
    ctx.trail.expire(input.now_ms, ctx.tuning.trail_max_age_ms);

    outcome
}

/// Ballistic motion; drops entities that fell past the bottom margin
pub fn integrate_active(ctx: &mut SimContext) {
    let gravity = ctx.tuning.gravity;
    let floor = ctx.viewport.height + ctx.tuning.despawn_margin;

    for entity in ctx.entities.iter_mut().filter(|e| !e.resolved) {
        entity.pos += entity.vel;
        entity.vel.y += gravity;
        entity.rotation += entity.rotation_speed;
    }

    // A missed entity leaves silently
    ctx.entities.retain(|e| e.pos.y < floor);
}

/// Weightless drift with edge bounces; nothing is ever removed
pub fn integrate_attract(ctx: &mut SimContext) {
    let w = ctx.viewport.width;
    let h = ctx.viewport.height;

    for entity in ctx.entities.iter_mut().filter(|e| !e.resolved) {
        entity.pos += entity.vel;
        entity.rotation += entity.rotation_speed;

        // Only flip while heading outward so each contact inverts once
        if (entity.pos.x <= 0.0 && entity.vel.x < 0.0) || (entity.pos.x >= w && entity.vel.x > 0.0) {
            entity.vel.x = -entity.vel.x;
        }
        if (entity.pos.y <= 0.0 && entity.vel.y < 0.0) || (entity.pos.y >= h && entity.vel.y > 0.0) {
            entity.vel.y = -entity.vel.y;
        }
    }
}

/// Move particles and retire the dead ones
pub fn decay_particles(ctx: &mut SimContext) {
    let decay = ctx.tuning.particle_decay;
    for particle in ctx.particles.iter_mut() {
        particle.pos += particle.vel;
        particle.life -= decay;
    }
    ctx.particles.retain(|p| p.life > PARTICLE_LIFE_EPSILON);
}
