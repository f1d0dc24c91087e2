//! Session controller
//!
//! Owns everything the engine deliberately does not: the score, the persisted
//! best score, the one-second countdown cadence, the slash flash and the
//! game-over commentary. It feeds the score back into each tick and consumes
//! the events the tick returns.

use glam::Vec2;
use serde::Serialize;

use crate::highscores::{HighScore, HighScoreStore};
use crate::sentiment::{AWAITING_TEXT, PENDING_TEXT, SentimentRequest};
use crate::sim::{GameEvent, Mode, ModeMachine, Snapshot, TickInput};

/// Deadline-driven repeating timer for the countdown
///
/// Plain data rather than a scheduled callback, so disarming it is all the
/// cleanup there is.
#[derive(Debug, Clone, Copy)]
pub struct CountdownTimer {
    interval_ms: f64,
    next_due_ms: Option<f64>,
}

impl CountdownTimer {
    /// Intervals below 1 ms (or NaN) are raised to 1 ms so `poll` terminates
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            next_due_ms: None,
        }
    }

    /// Start firing every interval from `now_ms`
    pub fn arm(&mut self, now_ms: f64) {
        self.next_due_ms = Some(now_ms + self.interval_ms);
    }

    pub fn disarm(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    /// Number of intervals that elapsed up to `now_ms`
    pub fn poll(&mut self, now_ms: f64) -> u32 {
        let Some(mut due) = self.next_due_ms else {
            return 0;
        };
        let mut fired = 0;
        while due <= now_ms {
            fired += 1;
            due += self.interval_ms;
        }
        self.next_due_ms = Some(due);
        fired
    }
}

/// Transient screen tint after a slash
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Flash {
    pub color: &'static str,
    pub until_ms: f64,
}

/// Everything a frontend needs to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub sim: Snapshot,
    pub score: u64,
    pub high_score: u64,
    pub countdown: Option<u8>,
    pub flash: Option<&'static str>,
    pub sentiment: String,
    pub sentiment_pending: bool,
}

/// Score/session controller wrapped around the engine
#[derive(Debug)]
pub struct Session<S> {
    engine: ModeMachine,
    high_score: HighScore<S>,
    score: u64,
    countdown: CountdownTimer,
    flash: Option<Flash>,
    sentiment: String,
    /// Commentary request still waiting for an answer
    pending: Option<SentimentRequest>,
}

impl<S: HighScoreStore> Session<S> {
    pub fn new(engine: ModeMachine, store: S) -> Self {
        let countdown = CountdownTimer::new(engine.context().tuning.countdown_step_ms);
        let high_score = HighScore::new(store);
        log::info!("Session ready, high score {}", high_score.best());
        Self {
            engine,
            high_score,
            score: 0,
            countdown,
            flash: None,
            sentiment: AWAITING_TEXT.to_string(),
            pending: None,
        }
    }

    pub fn engine(&self) -> &ModeMachine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ModeMachine {
        &mut self.engine
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best()
    }

    pub fn store(&self) -> &S {
        self.high_score.store()
    }

    pub fn sentiment(&self) -> &str {
        &self.sentiment
    }

    pub fn is_sentiment_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Flash color still visible at `now_ms`
    pub fn flash_color(&self, now_ms: f64) -> Option<&'static str> {
        self.flash
            .filter(|f| now_ms < f.until_ms)
            .map(|f| f.color)
    }

    /// Start a new session (from the attract or game-over screen)
    pub fn start(&mut self, now_ms: f64) -> bool {
        if !self.engine.start() {
            return false;
        }
        self.score = 0;
        self.pending = None;
        self.flash = None;
        self.countdown.arm(now_ms);
        true
    }

    /// Abandon the session and return to the attract screen
    pub fn go_home(&mut self) -> bool {
        if !self.engine.go_home() {
            return false;
        }
        self.score = 0;
        self.pending = None;
        self.flash = None;
        self.countdown.disarm();
        true
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.engine.pointer_down(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2, time_ms: f64) {
        self.engine.pointer_move(pos, time_ms);
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    /// Run one host frame. Returns a commentary request when the session
    /// ended during this frame; the caller resolves it outside the loop and
    /// hands the text to [`Session::complete_sentiment`].
    pub fn frame(&mut self, now_ms: f64) -> Option<SentimentRequest> {
        for _ in 0..self.countdown.poll(now_ms) {
            self.engine.countdown_step();
        }
        if self.engine.countdown_remaining().is_none() {
            self.countdown.disarm();
        }

        let events = self.engine.tick(&TickInput {
            now_ms,
            score: self.score,
        });
        self.apply_events(&events, now_ms)
    }

    /// Fold engine events into session state
    fn apply_events(&mut self, events: &[GameEvent], now_ms: f64) -> Option<SentimentRequest> {
        let mut ended = None;
        for event in events {
            match *event {
                GameEvent::Slash { color } => {
                    self.flash = Some(Flash {
                        color,
                        until_ms: now_ms + self.engine.context().tuning.slash_flash_ms,
                    });
                }
                GameEvent::Score { delta } => {
                    // Hits resolved after the hazard in the same pass don't count
                    if ended.is_none() {
                        self.score = self.score.saturating_add(delta);
                    }
                }
                GameEvent::GameOver { final_score } => {
                    if ended.is_some() {
                        continue;
                    }
                    let request = SentimentRequest {
                        final_score,
                        prior_high: self.high_score.best(),
                    };
                    self.score = final_score;
                    if self.high_score.record(final_score) {
                        log::info!("New high score: {}", final_score);
                    }
                    self.sentiment = PENDING_TEXT.to_string();
                    self.pending = Some(request);
                    ended = Some(request);
                }
            }
        }
        ended
    }

    /// Deliver commentary for `request`. Answers for a session that has
    /// since been restarted or abandoned are dropped.
    pub fn complete_sentiment(&mut self, request: SentimentRequest, text: String) -> bool {
        if self.pending != Some(request) {
            log::debug!("Dropping stale sentiment for score {}", request.final_score);
            return false;
        }
        self.sentiment = text;
        self.pending = None;
        true
    }

    pub fn view(&self, now_ms: f64) -> SessionView {
        SessionView {
            sim: self.engine.snapshot(),
            score: self.score,
            high_score: self.high_score.best(),
            countdown: self.engine.countdown_remaining(),
            flash: self.flash_color(now_ms),
            sentiment: self.sentiment.clone(),
            sentiment_pending: self.pending.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::MemoryStore;
    use crate::palette;
    use crate::sim::{Entity, EntityKind, Viewport};
    use crate::tuning::Tuning;

    fn session(best: u64) -> Session<MemoryStore> {
        let engine = ModeMachine::new(3, Viewport::new(800.0, 600.0), Tuning::default());
        Session::new(engine, MemoryStore::new(best))
    }

    fn place(s: &mut Session<MemoryStore>, kind: EntityKind, pos: Vec2) {
        let ctx = s.engine_mut().context_mut();
        let id = ctx.next_entity_id();
        ctx.entities.push(Entity::new(id, kind, pos, Vec2::ZERO));
    }

    /// Horizontal stroke from x=300 to x=500
    fn slash(s: &mut Session<MemoryStore>, y: f32, now: f64) {
        s.pointer_down(Vec2::new(300.0, y));
        s.pointer_move(Vec2::new(500.0, y), now);
    }

    /// Start and run the countdown to Active; returns the time reached
    fn play(s: &mut Session<MemoryStore>) -> f64 {
        assert!(s.start(0.0));
        s.frame(999.0);
        assert_eq!(s.engine().countdown_remaining(), Some(3));
        s.frame(1000.0);
        assert_eq!(s.engine().countdown_remaining(), Some(2));
        s.frame(3000.0);
        assert_eq!(s.mode(), Mode::Active);
        3000.0
    }

    #[test]
    fn test_countdown_timer_fires_per_interval() {
        let mut t = CountdownTimer::new(1000.0);
        assert_eq!(t.poll(5000.0), 0);
        t.arm(0.0);
        assert_eq!(t.poll(500.0), 0);
        assert_eq!(t.poll(1000.0), 1);
        assert_eq!(t.poll(3500.0), 2);
        t.disarm();
        assert_eq!(t.poll(10_000.0), 0);
    }

    #[test]
    fn test_countdown_timer_rejects_zero_interval() {
        for interval in [0.0, -250.0, f64::NAN] {
            let mut t = CountdownTimer::new(interval);
            t.arm(0.0);
            assert_eq!(t.poll(1.0), 1);
            assert_eq!(t.poll(5.0), 4);
        }
    }

    #[test]
    fn test_zero_step_tuning_still_counts_down() {
        let tuning = Tuning::from_json(r#"{ "countdown_step_ms": 0 }"#).unwrap();
        let engine = ModeMachine::new(3, Viewport::new(800.0, 600.0), tuning);
        let mut s = Session::new(engine, MemoryStore::new(0));

        assert!(s.start(0.0));
        s.frame(1.0);
        assert_eq!(s.engine().countdown_remaining(), Some(2));
        s.frame(3.0);
        assert_eq!(s.mode(), Mode::Active);
    }

    #[test]
    fn test_scoring_and_flash() {
        let mut s = session(0);
        let now = play(&mut s);

        place(&mut s, EntityKind::Buy, Vec2::new(370.0, 200.0));
        place(&mut s, EntityKind::Hype, Vec2::new(430.0, 200.0));
        slash(&mut s, 200.0, now);
        assert!(s.frame(now + 16.0).is_none());

        assert_eq!(s.score(), 8750);
        assert_eq!(s.flash_color(now + 20.0), Some(palette::HYPE));
        assert_eq!(s.flash_color(now + 200.0), None);
    }

    #[test]
    fn test_game_over_records_and_requests_sentiment() {
        let mut s = session(1000);
        let now = play(&mut s);

        place(&mut s, EntityKind::Sell, Vec2::new(360.0, 300.0));
        place(&mut s, EntityKind::Hazard, Vec2::new(400.0, 300.0));
        place(&mut s, EntityKind::Buy, Vec2::new(440.0, 300.0));
        slash(&mut s, 300.0, now);
        let request = s.frame(now + 16.0).unwrap();

        assert_eq!(
            request,
            SentimentRequest {
                final_score: 1250,
                prior_high: 1000
            }
        );
        assert_eq!(s.mode(), Mode::GameOver);
        assert_eq!(s.score(), 1250);
        assert_eq!(s.high_score(), 1250);
        assert_eq!(s.store().load(), 1250);
        assert_eq!(s.sentiment(), PENDING_TEXT);
        assert!(s.is_sentiment_pending());

        assert!(s.complete_sentiment(request, "LP king.".into()));
        assert_eq!(s.sentiment(), "LP king.");
        assert!(!s.is_sentiment_pending());
    }

    #[test]
    fn test_stale_sentiment_is_dropped() {
        let mut s = session(0);
        let now = play(&mut s);

        place(&mut s, EntityKind::Hazard, Vec2::new(400.0, 300.0));
        slash(&mut s, 300.0, now);
        let request = s.frame(now + 16.0).unwrap();

        assert!(s.start(now + 100.0));
        assert!(!s.complete_sentiment(request, "late".into()));
        assert_eq!(s.sentiment(), PENDING_TEXT);
    }

    #[test]
    fn test_go_home_clears_score_and_timer() {
        let mut s = session(0);
        let now = play(&mut s);
        place(&mut s, EntityKind::Buy, Vec2::new(400.0, 100.0));
        slash(&mut s, 100.0, now);
        s.frame(now + 16.0);
        assert_eq!(s.score(), 1250);

        assert!(s.go_home());
        assert_eq!(s.score(), 0);
        assert_eq!(s.mode(), Mode::Attract);

        // Countdown requests are invalid from Attract and the timer is gone
        s.frame(now + 5000.0);
        assert_eq!(s.mode(), Mode::Attract);
    }

    #[test]
    fn test_view_serializes() {
        let mut s = session(500);
        s.frame(16.0);
        let json = serde_json::to_string(&s.view(16.0)).unwrap();
        assert!(json.contains("\"high_score\":500"));
        assert!(json.contains("\"mode\":\"Attract\""));
        assert!(json.contains(AWAITING_TEXT));
    }
}
