//! Hyslash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use glam::Vec2;
    use hyslash::highscores::LocalStorageStore;
    use hyslash::platform::now_ms;
    use hyslash::sentiment::{self, SentimentError, SentimentRequest, SentimentSource};
    use hyslash::sim::{ModeMachine, Viewport};
    use hyslash::{Session, Tuning};

    // Rendering and the text generator live on the JS side
    #[wasm_bindgen(inline_js = "
        export function render_frame(json) {
            if (window.hyslashRender) {
                window.hyslashRender(JSON.parse(json));
            }
        }

        export function request_sentiment(score, highScore, prompt) {
            if (window.hyslashSentiment) {
                return Promise.resolve(window.hyslashSentiment(score, highScore, prompt));
            }
            return Promise.reject(new Error('no sentiment generator registered'));
        }
    ")]
    extern "C" {
        fn render_frame(json: &str);
        fn request_sentiment(score: f64, high_score: f64, prompt: &str) -> js_sys::Promise;
    }

    /// Sentiment generator backed by `window.hyslashSentiment`
    struct JsSentiment;

    impl SentimentSource for JsSentiment {
        async fn market_sentiment(
            &self,
            score: u64,
            high_score: u64,
        ) -> Result<String, SentimentError> {
            let prompt = sentiment::prompt(score, high_score);
            let promise = request_sentiment(score as f64, high_score as f64, &prompt);
            let value = wasm_bindgen_futures::JsFuture::from(promise)
                .await
                .map_err(|e| SentimentError::Transport(format!("{:?}", e)))?;
            value.as_string().ok_or_else(|| SentimentError::Api {
                status: 0,
                message: "generator returned a non-string value".to_string(),
            })
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session<LocalStorageStore>,
        canvas: HtmlCanvasElement,
        canvas_size: (u32, u32),
    }

    impl Game {
        fn new(seed: u64, canvas: HtmlCanvasElement) -> Self {
            let w = canvas.client_width().max(1) as f32;
            let h = canvas.client_height().max(1) as f32;
            let engine = ModeMachine::new(seed, Viewport::new(w, h), Tuning::load());
            Self {
                session: Session::new(engine, LocalStorageStore),
                canvas,
                canvas_size: (0, 0),
            }
        }

        /// Keep the backing store and the viewport in step with CSS size
        fn sync_size(&mut self) {
            let w = self.canvas.client_width().max(1) as u32;
            let h = self.canvas.client_height().max(1) as u32;
            if (w, h) != self.canvas_size {
                self.canvas.set_width(w);
                self.canvas.set_height(h);
                self.canvas_size = (w, h);
                self.session
                    .engine_mut()
                    .resize(Viewport::new(w as f32, h as f32));
                log::info!("Canvas resized to {}x{}", w, h);
            }
        }

        /// Canvas-relative position of a touch
        fn touch_pos(&self, event: &TouchEvent) -> Option<Vec2> {
            let touch = event.touches().get(0)?;
            let rect = self.canvas.get_bounding_client_rect();
            Some(Vec2::new(
                touch.client_x() as f32 - rect.left() as f32,
                touch.client_y() as f32 - rect.top() as f32,
            ))
        }
    }

    /// Owns the pending `requestAnimationFrame` id; stopping cancels it
    #[derive(Clone, Default)]
    struct FrameLoop {
        pending: Rc<Cell<Option<i32>>>,
        stopped: Rc<Cell<bool>>,
    }

    impl FrameLoop {
        fn stop(&self) {
            self.stopped.set(true);
            if let Some(id) = self.pending.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
                log::info!("Frame loop stopped");
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Hyslash starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let canvas = document
            .get_element_by_id("canvas")
            .expect("no #canvas element")
            .dyn_into::<HtmlCanvasElement>()
            .expect("#canvas is not a canvas");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, canvas.clone())));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());

        let frame_loop = FrameLoop::default();
        setup_teardown(frame_loop.clone());
        request_animation_frame(game, frame_loop);

        log::info!("Hyslash running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse down - arm a stroke
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().session.pointer_down(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move - extend the trail
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().session.pointer_move(pos, now_ms());
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up - end the stroke
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().session.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(pos) = g.touch_pos(&event) {
                    g.session.pointer_down(pos);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(pos) = g.touch_pos(&event) {
                    g.session.pointer_move(pos, now_ms());
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().session.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    if game.borrow_mut().session.start(now_ms()) {
                        log::info!("Countdown started");
                    }
                });
                let _ = btn
                    .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("home-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().session.go_home();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Cancel the pending frame when the page goes away
    fn setup_teardown(frame_loop: FrameLoop) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            frame_loop.stop();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, frame_loop: FrameLoop) {
        if frame_loop.stopped.get() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let next = frame_loop.clone();
        let closure = Closure::once(move |_time: f64| {
            next.pending.set(None);
            game_loop(game, next);
        });
        if let Ok(id) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            frame_loop.pending.set(Some(id));
        }
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, frame_loop: FrameLoop) {
        let now = now_ms();
        let request = {
            let mut g = game.borrow_mut();
            g.sync_size();
            let request = g.session.frame(now);
            match serde_json::to_string(&g.session.view(now)) {
                Ok(json) => render_frame(&json),
                Err(e) => log::warn!("Snapshot serialization failed: {}", e),
            }
            request
        };

        if let Some(request) = request {
            spawn_sentiment(game.clone(), request);
        }

        request_animation_frame(game, frame_loop);
    }

    /// Resolve commentary off the frame loop
    fn spawn_sentiment(game: Rc<RefCell<Game>>, request: SentimentRequest) {
        wasm_bindgen_futures::spawn_local(async move {
            let text = sentiment::resolve(&JsSentiment, request).await;
            game.borrow_mut().session.complete_sentiment(request, text);
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use hyslash::sentiment::{self, CannedSentiment};
    use hyslash::sim::{EntityKind, Mode, ModeMachine, Viewport};
    use hyslash::{MemoryStore, Session, Tuning};

    /// Simulated 60 Hz display
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const ATTRACT_FRAMES: u32 = 240;
    /// Two minutes of play at most
    const MAX_PLAY_FRAMES: u32 = 60 * 120;
    /// Half-length of the bot's slash strokes
    const STROKE_REACH: f32 = 30.0;

    pub fn run(seed: u64) {
        let viewport = Viewport::new(1280.0, 720.0);
        let engine = ModeMachine::new(seed, viewport, Tuning::load());
        let mut session = Session::new(engine, MemoryStore::default());
        let mut now = 0.0;

        for _ in 0..ATTRACT_FRAMES {
            now += FRAME_MS;
            session.frame(now);
        }
        log::info!(
            "Attract mode holding {} entities",
            session.engine().context().entities.len()
        );

        session.start(now);
        let mut request = None;
        for _ in 0..MAX_PLAY_FRAMES {
            now += FRAME_MS;
            if session.mode() == Mode::Active {
                autoplay(&mut session, viewport, now);
            }
            if let Some(r) = session.frame(now) {
                request = Some(r);
                break;
            }
        }

        match request {
            Some(request) => {
                log::info!("Game over at {} (best {})", request.final_score, session.high_score());
                let text = pollster::block_on(sentiment::resolve(&CannedSentiment, request));
                session.complete_sentiment(request, text);
            }
            None => log::info!("Bot survived with {} points", session.score()),
        }
        log::info!("Market sentiment: \"{}\"", session.sentiment());

        session.go_home();
        log::info!("Back in {:?}", session.mode());
    }

    /// Slash the highest on-screen order that has no hazard near it
    fn autoplay(session: &mut Session<MemoryStore>, viewport: Viewport, now: f64) {
        let ctx = session.engine().context();
        let hazards: Vec<Vec2> = ctx
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Hazard)
            .map(|e| e.pos)
            .collect();

        let target = ctx
            .entities
            .iter()
            .filter(|e| !e.resolved && e.kind != EntityKind::Hazard)
            .filter(|e| e.pos.y > 0.0 && e.pos.y < viewport.height)
            .filter(|e| hazards.iter().all(|h| h.distance(e.pos) > 150.0))
            .min_by(|a, b| {
                a.pos
                    .y
                    .partial_cmp(&b.pos.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.pos);

        match target {
            Some(pos) => {
                session.pointer_down(pos - Vec2::new(STROKE_REACH, 0.0));
                session.pointer_move(pos + Vec2::new(STROKE_REACH, 0.0), now);
            }
            None => session.pointer_up(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Hyslash (native) starting...");
    log::info!("Running a headless session - build for wasm32 to play in a browser");

    let seed = hyslash::platform::now_ms() as u64;
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
