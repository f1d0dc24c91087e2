//! Game balance knobs
//!
//! Every gameplay constant the simulation reads lives here so a build can be
//! retuned from JSON without recompiling. Missing fields fall back to the
//! values in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Active kinematics ===
    pub gravity: f32,
    pub spawn_below_edge: f32,
    pub despawn_margin: f32,
    pub spawn_width_fraction: f32,
    pub launch_vy_min: f32,
    pub launch_vy_spread: f32,
    pub launch_vx_spread: f32,

    // === Difficulty ===
    pub base_spawn_interval: u64,
    pub min_spawn_interval: u64,
    pub score_per_interval_step: u64,

    // === Attract mode ===
    pub attract_spawn_interval: u64,
    pub attract_max_entities: usize,
    pub attract_speed: f32,

    /// Cosmetic spin range
    pub rotation_speed_spread: f32,

    // === Hit testing and scoring ===
    pub midpoint_tolerance: f32,
    pub order_points: u64,
    pub hype_points: u64,

    // === Feedback ===
    pub particle_burst: usize,
    pub particle_speed_spread: f32,
    pub particle_decay: f32,
    pub trail_max_age_ms: f64,
    pub slash_flash_ms: f64,

    // === Session ===
    pub countdown_steps: u8,
    pub countdown_step_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            spawn_below_edge: SPAWN_BELOW_EDGE,
            despawn_margin: DESPAWN_MARGIN,
            spawn_width_fraction: SPAWN_WIDTH_FRACTION,
            launch_vy_min: LAUNCH_VY_MIN,
            launch_vy_spread: LAUNCH_VY_SPREAD,
            launch_vx_spread: LAUNCH_VX_SPREAD,

            base_spawn_interval: BASE_SPAWN_INTERVAL,
            min_spawn_interval: MIN_SPAWN_INTERVAL,
            score_per_interval_step: SCORE_PER_INTERVAL_STEP,

            attract_spawn_interval: ATTRACT_SPAWN_INTERVAL,
            attract_max_entities: ATTRACT_MAX_ENTITIES,
            attract_speed: ATTRACT_SPEED,

            rotation_speed_spread: ROTATION_SPEED_SPREAD,

            midpoint_tolerance: MIDPOINT_TOLERANCE,
            order_points: ORDER_POINTS,
            hype_points: HYPE_POINTS,

            particle_burst: PARTICLE_BURST,
            particle_speed_spread: PARTICLE_SPEED_SPREAD,
            particle_decay: PARTICLE_DECAY,
            trail_max_age_ms: TRAIL_MAX_AGE_MS,
            slash_flash_ms: SLASH_FLASH_MS,

            countdown_steps: COUNTDOWN_STEPS,
            countdown_step_ms: COUNTDOWN_STEP_MS,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Self = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Clamp values that would break simulation invariants
    ///
    /// Intervals and the countdown step must be positive, random ranges need
    /// finite non-negative spreads, and non-finite floats revert to defaults.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();

        self.gravity = self.gravity.finite_or(d.gravity);
        self.spawn_below_edge = self.spawn_below_edge.finite_or(d.spawn_below_edge);
        self.despawn_margin = self.despawn_margin.finite_or(d.despawn_margin).max(0.0);
        self.spawn_width_fraction =
            self.spawn_width_fraction.finite_or(d.spawn_width_fraction).clamp(0.0, 1.0);
        self.launch_vy_min = self.launch_vy_min.finite_or(d.launch_vy_min);
        self.launch_vy_spread = self.launch_vy_spread.finite_or(d.launch_vy_spread).max(0.0);
        self.launch_vx_spread = self.launch_vx_spread.finite_or(d.launch_vx_spread).max(0.0);

        self.base_spawn_interval = self.base_spawn_interval.max(1);
        self.min_spawn_interval = self.min_spawn_interval.max(1);
        self.score_per_interval_step = self.score_per_interval_step.max(1);
        self.attract_spawn_interval = self.attract_spawn_interval.max(1);
        self.attract_speed = self.attract_speed.finite_or(d.attract_speed).max(0.0);

        self.rotation_speed_spread =
            self.rotation_speed_spread.finite_or(d.rotation_speed_spread).max(0.0);
        self.midpoint_tolerance = self.midpoint_tolerance.finite_or(d.midpoint_tolerance).max(0.0);

        self.particle_speed_spread =
            self.particle_speed_spread.finite_or(d.particle_speed_spread).max(0.0);
        self.particle_decay = self.particle_decay.finite_or(d.particle_decay).max(f32::EPSILON);
        self.trail_max_age_ms = self.trail_max_age_ms.finite_or(d.trail_max_age_ms).max(0.0);
        self.slash_flash_ms = self.slash_flash_ms.finite_or(d.slash_flash_ms).max(0.0);

        self.countdown_steps = self.countdown_steps.max(1);
        self.countdown_step_ms = self.countdown_step_ms.finite_or(d.countdown_step_ms).max(1.0);
        self
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "hyslash_tuning";

    /// Environment variable naming a tuning JSON file
    #[cfg(not(target_arch = "wasm32"))]
    const ENV_PATH: &'static str = "HYSLASH_TUNING";

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Load tuning from the file named by `HYSLASH_TUNING`, if set
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_PATH) else {
            log::info!("Using default tuning");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                Err(e) => {
                    log::warn!("Ignoring tuning file {}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}", path, e);
                Self::default()
            }
        }
    }
}

/// Replace NaN and infinities with a fallback
trait FiniteOr: Copy {
    fn finite_or(self, fallback: Self) -> Self;
}

macro_rules! impl_finite_or {
    ($($t:ty),*) => {
        $(impl FiniteOr for $t {
            fn finite_or(self, fallback: Self) -> Self {
                if self.is_finite() { self } else { fallback }
            }
        })*
    };
}

impl_finite_or!(f32, f64);
