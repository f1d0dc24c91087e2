//! Pointer trail tracking
//!
//! Samples arrive at whatever rate the input source delivers them. The whole
//! trail is only drawn; collision consumes every segment an armed stroke
//! formed since the previous tick, in the order the samples arrived.

use glam::Vec2;
use serde::Serialize;

/// A timestamped pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub time_ms: f64,
}

/// Line segment between two pointer samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        (self.end - self.start).length_squared()
    }
}

/// Recent pointer history plus the stroke cursor
#[derive(Debug, Clone, Default)]
pub struct TrailTracker {
    /// Samples, oldest first
    points: Vec<TrailPoint>,
    /// Last position of the current stroke; None while released
    cursor: Option<Vec2>,
    /// Segments formed since the last tick drained them, oldest first
    pending: Vec<Segment>,
}

impl TrailTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed: arm a new stroke at `pos`
    pub fn press(&mut self, pos: Vec2) {
        self.cursor = Some(pos);
    }

    /// Pointer released: no segment forms until the next press.
    /// Segments already formed stay queued for the next tick.
    pub fn release(&mut self) {
        self.cursor = None;
    }

    /// Record a pointer move
    pub fn record(&mut self, pos: Vec2, time_ms: f64) {
        self.points.push(TrailPoint { pos, time_ms });
        if let Some(prev) = self.cursor {
            self.pending.push(Segment::new(prev, pos));
            self.cursor = Some(pos);
        }
    }

    /// Drain the stroke segments formed since the last call, oldest first
    pub fn take_segments(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.pending)
    }

    /// Drop samples at least `max_age_ms` old
    pub fn expire(&mut self, now_ms: f64, max_age_ms: f64) {
        self.points.retain(|p| now_ms - p.time_ms < max_age_ms);
    }

    /// Forget all samples and the stroke state
    pub fn clear(&mut self) {
        self.points.clear();
        self.cursor = None;
        self.pending.clear();
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether a stroke is in progress
    pub fn is_armed(&self) -> bool {
        self.cursor.is_some()
    }
}
