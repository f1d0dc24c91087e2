//! High score persistence
//!
//! A single best score, read once at startup and written whenever it is
//! beaten. Where it lives is up to the [`HighScoreStore`].

/// Backing storage for the best score
pub trait HighScoreStore {
    /// Read the stored best score (0 if none)
    fn load(&self) -> u64;
    /// Persist a new best score
    fn save(&mut self, score: u64);
}

/// In-memory store for native builds and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: u64,
    /// Number of saves performed
    pub writes: u32,
}

impl MemoryStore {
    pub fn new(initial: u64) -> Self {
        Self {
            value: initial,
            writes: 0,
        }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> u64 {
        self.value
    }

    fn save(&mut self, score: u64) {
        self.value = score;
        self.writes += 1;
    }
}

/// LocalStorage-backed store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const STORAGE_KEY: &'static str = "hyslash_high_score";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl HighScoreStore for LocalStorageStore {
    fn load(&self) -> u64 {
        let stored = Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|v| v.trim().parse::<u64>().ok());

        match stored {
            Some(score) => {
                log::info!("Loaded high score {}", score);
                score
            }
            None => {
                log::info!("No high score found, starting fresh");
                0
            }
        }
    }

    fn save(&mut self, score: u64) {
        if let Some(storage) = Self::storage() {
            match storage.set_item(Self::STORAGE_KEY, &score.to_string()) {
                Ok(()) => log::info!("High score saved ({})", score),
                Err(e) => log::warn!("Failed to save high score: {:?}", e),
            }
        }
    }
}

/// Best score tracker over a store
#[derive(Debug, Clone)]
pub struct HighScore<S> {
    best: u64,
    store: S,
}

impl<S: HighScoreStore> HighScore<S> {
    /// Load the current best from `store`
    pub fn new(store: S) -> Self {
        let best = store.load();
        Self { best, store }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Record a finished session's score. Returns true on a new record.
    pub fn record(&mut self, score: u64) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        self.store.save(score);
        true
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
