//! Slash hit testing and hit consequences
//!
//! The test is an approximation of segment/circle intersection: an entity is
//! hit when its centre lies within `size` of the infinite line through the
//! stroke segment AND within `midpoint_tolerance * size` of the segment's
//! midpoint. The second bound keeps the infinite-line test near the stroke.

use glam::Vec2;
use rand::Rng;

use super::state::{EntityKind, GameEvent, Particle, SimContext};
use super::trail::Segment;

/// Segments shorter than this have no direction and hit nothing
const MIN_SEGMENT_LENGTH_SQ: f32 = 1e-6;

/// Distances from an entity centre to a stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashProbe {
    /// Distance to the infinite line through the segment
    pub perpendicular: f32,
    /// Distance to the segment midpoint
    pub midpoint: f32,
}

impl SlashProbe {
    /// Measure `center` against `segment`; None for a degenerate segment
    pub fn measure(segment: &Segment, center: Vec2) -> Option<Self> {
        let dir = segment.end - segment.start;
        let len_sq = dir.length_squared();
        if len_sq < MIN_SEGMENT_LENGTH_SQ {
            return None;
        }
        let perpendicular = dir.perp_dot(center - segment.start).abs() / len_sq.sqrt();
        let midpoint = center.distance(segment.midpoint());
        Some(Self {
            perpendicular,
            midpoint,
        })
    }

    #[inline]
    pub fn is_hit(&self, size: f32, midpoint_tolerance: f32) -> bool {
        self.perpendicular < size && self.midpoint < size * midpoint_tolerance
    }
}

/// Whether a stroke segment slashes a circle of radius `size` at `center`
pub fn segment_hits(segment: &Segment, center: Vec2, size: f32, midpoint_tolerance: f32) -> bool {
    SlashProbe::measure(segment, center)
        .map(|probe| probe.is_hit(size, midpoint_tolerance))
        .unwrap_or(false)
}

/// Result of one resolver pass
#[derive(Debug, Clone, Default)]
pub struct SlashOutcome {
    pub events: Vec<GameEvent>,
    /// Set when a hazard was hit during the pass
    pub game_over: bool,
    /// IDs resolved during the pass, in resolution order
    pub resolved: Vec<u32>,
    /// Running score after every scoring hit in the pass
    pub score: u64,
}

/// Test `segment` against every unresolved entity and apply consequences.
///
/// Entities are processed in ID (spawn) order. Every entity the segment
/// crosses resolves in the same pass. `score` is the authoritative score
/// going into the pass; a hazard hit reports it plus whatever earlier hits in
/// the same pass added.
pub fn resolve_slashes(ctx: &mut SimContext, segment: &Segment, score: u64) -> SlashOutcome {
    let mut outcome = SlashOutcome::default();
    let mut running_score = score;
    let mut bursts: Vec<(Vec2, &'static str)> = Vec::new();

    ctx.normalize_order();
    let tolerance = ctx.tuning.midpoint_tolerance;

    for entity in ctx.entities.iter_mut() {
        if entity.resolved || !segment_hits(segment, entity.pos, entity.size, tolerance) {
            continue;
        }

        entity.resolved = true;
        outcome.resolved.push(entity.id);

        let color = entity.kind.color();
        outcome.events.push(GameEvent::Slash { color });
        bursts.push((entity.pos, color));

        match entity.kind.points(&ctx.tuning) {
            Some(delta) => {
                running_score = running_score.saturating_add(delta);
                outcome.events.push(GameEvent::Score { delta });
            }
            None => {
                debug_assert_eq!(entity.kind, EntityKind::Hazard);
                log::info!("Hazard {} slashed at score {}", entity.id, running_score);
                outcome.events.push(GameEvent::GameOver {
                    final_score: running_score,
                });
                outcome.game_over = true;
            }
        }
    }

    outcome.score = running_score;

    for (pos, color) in bursts {
        emit_burst(ctx, pos, color);
    }

    outcome
}

/// Spray hit particles from `pos`
pub fn emit_burst(ctx: &mut SimContext, pos: Vec2, color: &'static str) {
    let spread = ctx.tuning.particle_speed_spread;
    for _ in 0..ctx.tuning.particle_burst {
        let vel = Vec2::new(
            (ctx.rng.random::<f32>() - 0.5) * spread,
            (ctx.rng.random::<f32>() - 0.5) * spread,
        );
        ctx.particles.push(Particle {
            pos,
            vel,
            life: 1.0,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;
    use crate::sim::state::{Entity, Viewport};
    use crate::tuning::Tuning;

    fn ctx_with(entities: &[(EntityKind, Vec2)]) -> SimContext {
        let mut ctx = SimContext::new(7, Viewport::new(800.0, 600.0), Tuning::default());
        for &(kind, pos) in entities {
            let id = ctx.next_entity_id();
            ctx.entities.push(Entity::new(id, kind, pos, Vec2::ZERO));
        }
        ctx
    }

    fn vertical() -> Segment {
        Segment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0))
    }

    #[test]
    fn test_probe_on_line() {
        let probe = SlashProbe::measure(&vertical(), Vec2::new(0.0, 50.0)).unwrap();
        assert_eq!(probe.perpendicular, 0.0);
        assert_eq!(probe.midpoint, 0.0);
        assert!(probe.is_hit(20.0, 1.8));
    }

    #[test]
    fn test_probe_off_line() {
        let probe = SlashProbe::measure(&vertical(), Vec2::new(100.0, 50.0)).unwrap();
        assert!((probe.perpendicular - 100.0).abs() < 1e-4);
        assert!(!probe.is_hit(20.0, 1.8));
    }

    #[test]
    fn test_midpoint_bound_limits_infinite_line() {
        // On the line's extension, far past the segment end
        assert!(!segment_hits(&vertical(), Vec2::new(0.0, 400.0), 20.0, 1.8));
        // Just past the end but within 1.8 * size of the midpoint
        assert!(segment_hits(&vertical(), Vec2::new(0.0, 85.0), 20.0, 1.8));
    }

    #[test]
    fn test_degenerate_segment_misses() {
        let dot = Segment::new(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert!(SlashProbe::measure(&dot, Vec2::new(5.0, 5.0)).is_none());
        assert!(!segment_hits(&dot, Vec2::new(5.0, 5.0), 40.0, 1.8));
    }

    #[test]
    fn test_order_hit_scores() {
        let mut ctx = ctx_with(&[(EntityKind::Buy, Vec2::new(0.0, 50.0))]);
        let outcome = resolve_slashes(&mut ctx, &vertical(), 0);

        assert!(!outcome.game_over);
        assert_eq!(
            outcome.events,
            vec![
                GameEvent::Slash { color: palette::GREEN },
                GameEvent::Score { delta: 1250 },
            ]
        );
        assert!(ctx.entities[0].resolved);
        assert_eq!(ctx.particles.len(), 15);
        assert!(ctx.particles.iter().all(|p| p.color == palette::GREEN && p.life == 1.0));
        assert!(ctx.particles.iter().all(|p| p.vel.x.abs() <= 6.0 && p.vel.y.abs() <= 6.0));
    }

    #[test]
    fn test_hype_hit_scores_bonus() {
        let mut ctx = ctx_with(&[(EntityKind::Hype, Vec2::new(0.0, 50.0))]);
        let outcome = resolve_slashes(&mut ctx, &vertical(), 0);
        assert!(outcome.events.contains(&GameEvent::Score { delta: 7500 }));
    }

    #[test]
    fn test_hazard_reports_prior_score() {
        let mut ctx = ctx_with(&[(EntityKind::Hazard, Vec2::new(0.0, 50.0))]);
        let outcome = resolve_slashes(&mut ctx, &vertical(), 31_250);

        assert!(outcome.game_over);
        assert_eq!(
            outcome.events,
            vec![
                GameEvent::Slash { color: palette::REKT },
                GameEvent::GameOver { final_score: 31_250 },
            ]
        );
    }

    #[test]
    fn test_already_resolved_is_inert() {
        let mut ctx = ctx_with(&[(EntityKind::Sell, Vec2::new(0.0, 50.0))]);
        let first = resolve_slashes(&mut ctx, &vertical(), 0);
        assert_eq!(first.resolved.len(), 1);

        let second = resolve_slashes(&mut ctx, &vertical(), 1250);
        assert!(second.events.is_empty());
        assert!(second.resolved.is_empty());
        assert_eq!(second.score, 1250);
        assert_eq!(ctx.particles.len(), 15);
    }

    #[test]
    fn test_multiple_hits_in_spawn_order() {
        let mut ctx = ctx_with(&[
            (EntityKind::Buy, Vec2::new(0.0, 40.0)),
            (EntityKind::Hazard, Vec2::new(5.0, 50.0)),
            (EntityKind::Hype, Vec2::new(-5.0, 60.0)),
            (EntityKind::Sell, Vec2::new(300.0, 50.0)),
        ]);
        let outcome = resolve_slashes(&mut ctx, &vertical(), 10_000);

        assert!(outcome.game_over);
        assert_eq!(outcome.resolved, vec![0, 1, 2]);
        assert_eq!(
            outcome.events,
            vec![
                GameEvent::Slash { color: palette::GREEN },
                GameEvent::Score { delta: 1250 },
                GameEvent::Slash { color: palette::REKT },
                GameEvent::GameOver { final_score: 11_250 },
                GameEvent::Slash { color: palette::HYPE },
                GameEvent::Score { delta: 7500 },
            ]
        );
        assert_eq!(outcome.score, 18_750);
        assert!(!ctx.entities[3].resolved);
        assert_eq!(ctx.particles.len(), 45);
    }
}
