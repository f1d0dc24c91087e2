//! Entity spawning policy
//!
//! Active play launches entities up from below the screen at a cadence that
//! tightens with score. Attract mode drifts a capped population around the
//! whole screen.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::state::{Entity, EntityKind, Mode, SimContext};
use crate::tuning::Tuning;

/// Ticks between active spawns: max(min, base - floor(score / step))
pub fn spawn_interval(score: u64, tuning: &Tuning) -> u64 {
    let step = score / tuning.score_per_interval_step;
    tuning
        .base_spawn_interval
        .saturating_sub(step)
        .max(tuning.min_spawn_interval)
}

/// Pick an entity kind from a single uniform draw
pub fn roll_kind<R: Rng>(rng: &mut R) -> EntityKind {
    EntityKind::from_roll(rng.random::<f32>())
}

/// Run this tick's spawn attempt. Returns the new entity's ID, if any.
///
/// `ctx.frame` must already be advanced for this tick.
pub fn maybe_spawn(ctx: &mut SimContext, mode: Mode, score: u64) -> Option<u32> {
    match mode {
        Mode::Active => {
            let interval = spawn_interval(score, &ctx.tuning);
            if ctx.frame % interval == 0 {
                Some(spawn_active(ctx))
            } else {
                None
            }
        }
        Mode::Attract => {
            if ctx.frame % ctx.tuning.attract_spawn_interval == 0
                && ctx.entities.len() < ctx.tuning.attract_max_entities
            {
                Some(spawn_attract(ctx))
            } else {
                None
            }
        }
        Mode::Countdown { .. } | Mode::GameOver => None,
    }
}

/// Launch an entity from below the bottom edge
pub fn spawn_active(ctx: &mut SimContext) -> u32 {
    let id = ctx.next_entity_id();
    let Tuning {
        spawn_width_fraction,
        spawn_below_edge,
        launch_vx_spread,
        launch_vy_min,
        launch_vy_spread,
        ..
    } = ctx.tuning;
    let w = ctx.viewport.width;
    let h = ctx.viewport.height;

    let rng = &mut ctx.rng;
    let kind = roll_kind(rng);
    let x = w / 2.0 + (rng.random::<f32>() - 0.5) * (w * spawn_width_fraction);
    let vx = (rng.random::<f32>() - 0.5) * launch_vx_spread;
    let vy = -launch_vy_min - rng.random::<f32>() * launch_vy_spread;

    let mut entity = Entity::new(id, kind, Vec2::new(x, h + spawn_below_edge), Vec2::new(vx, vy));
    spin(&mut entity, rng, ctx.tuning.rotation_speed_spread);
    ctx.entities.push(entity);
    id
}

/// Drop an entity anywhere on screen with a slow drift
pub fn spawn_attract(ctx: &mut SimContext) -> u32 {
    let id = ctx.next_entity_id();
    let speed = ctx.tuning.attract_speed;
    let w = ctx.viewport.width;
    let h = ctx.viewport.height;

    let rng = &mut ctx.rng;
    let kind = roll_kind(rng);
    let pos = Vec2::new(rng.random::<f32>() * w, rng.random::<f32>() * h);
    let vel = Vec2::new(
        rng.random_range(-speed..=speed),
        rng.random_range(-speed..=speed),
    );

    let mut entity = Entity::new(id, kind, pos, vel);
    spin(&mut entity, rng, ctx.tuning.rotation_speed_spread);
    ctx.entities.push(entity);
    id
}

fn spin<R: Rng>(entity: &mut Entity, rng: &mut R, spread: f32) {
    entity.rotation = rng.random::<f32>() * TAU;
    entity.rotation_speed = (rng.random::<f32>() - 0.5) * spread;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;

    fn ctx() -> SimContext {
        SimContext::new(42, Viewport::new(1000.0, 800.0), Tuning::default())
    }

    #[test]
    fn test_spawn_interval_scales_with_score() {
        let tuning = Tuning::default();
        assert_eq!(spawn_interval(0, &tuning), 45);
        assert_eq!(spawn_interval(24_999, &tuning), 45);
        assert_eq!(spawn_interval(25_000, &tuning), 44);
        assert_eq!(spawn_interval(900_000, &tuning), 9);
        assert_eq!(spawn_interval(925_000, &tuning), 8);
        assert_eq!(spawn_interval(u64::MAX, &tuning), 8);
    }

    #[test]
    fn test_active_spawn_kinematics() {
        let mut ctx = ctx();
        for _ in 0..200 {
            spawn_active(&mut ctx);
        }
        for e in &ctx.entities {
            assert!(e.pos.x >= 150.0 && e.pos.x <= 850.0, "x out of band: {}", e.pos.x);
            assert_eq!(e.pos.y, 860.0);
            assert!(e.vel.x >= -3.5 && e.vel.x <= 3.5);
            assert!(e.vel.y >= -25.0 && e.vel.y <= -16.0);
            assert!(e.rotation_speed.abs() <= 0.06);
            assert_eq!(e.size, e.kind.size());
        }
    }

    #[test]
    fn test_attract_spawn_kinematics() {
        let mut ctx = ctx();
        for _ in 0..200 {
            spawn_attract(&mut ctx);
        }
        for e in &ctx.entities {
            assert!(e.pos.x >= 0.0 && e.pos.x <= 1000.0);
            assert!(e.pos.y >= 0.0 && e.pos.y <= 800.0);
            assert!(e.vel.x.abs() <= 2.0 && e.vel.y.abs() <= 2.0);
        }
    }

    #[test]
    fn test_active_cadence() {
        let mut ctx = ctx();
        let mut spawned = 0;
        for _ in 0..90 {
            ctx.frame += 1;
            if maybe_spawn(&mut ctx, Mode::Active, 0).is_some() {
                spawned += 1;
            }
        }
        assert_eq!(spawned, 2);
    }

    #[test]
    fn test_no_spawn_outside_play() {
        let mut ctx = ctx();
        ctx.frame = 45 * 40;
        assert!(maybe_spawn(&mut ctx, Mode::GameOver, 0).is_none());
        assert!(maybe_spawn(&mut ctx, Mode::Countdown { remaining: 2 }, 0).is_none());
    }

    #[test]
    fn test_attract_cap() {
        let mut ctx = ctx();
        for _ in 0..(40 * 30) {
            ctx.frame += 1;
            maybe_spawn(&mut ctx, Mode::Attract, 0);
        }
        assert_eq!(ctx.entities.len(), 15);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut ctx = ctx();
        let a = spawn_active(&mut ctx);
        let b = spawn_attract(&mut ctx);
        let c = spawn_active(&mut ctx);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_kind_distribution_roughly_matches_weights() {
        let mut ctx = ctx();
        let mut counts = [0u32; 4];
        for _ in 0..20_000 {
            let idx = match roll_kind(&mut ctx.rng) {
                EntityKind::Buy => 0,
                EntityKind::Sell => 1,
                EntityKind::Hazard => 2,
                EntityKind::Hype => 3,
            };
            counts[idx] += 1;
        }
        let share = |n: u32| n as f32 / 20_000.0;
        assert!((share(counts[0]) - 0.45).abs() < 0.02);
        assert!((share(counts[1]) - 0.40).abs() < 0.02);
        assert!((share(counts[2]) - 0.11).abs() < 0.02);
        assert!((share(counts[3]) - 0.04).abs() < 0.02);
    }
}
