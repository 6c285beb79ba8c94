//! Best score tracking
//!
//! A single integer persisted through a `LocalStore`, never lowered.

use crate::persistence::LocalStore;

/// Best score across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u64,
}

impl HighScore {
    /// Storage key (LocalStorage on web)
    pub const STORAGE_KEY: &'static str = "onetaptoolate_highscore";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Current best score
    pub fn best(&self) -> u64 {
        self.best
    }

    /// Whether `score` would raise the best
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.best
    }

    /// Raise the best to `score` if it is higher
    ///
    /// Returns true when the best changed.
    pub fn record(&mut self, score: u64) -> bool {
        if self.qualifies(score) {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Load the best score, defaulting to 0 when absent or unreadable
    pub fn load<S: LocalStore + ?Sized>(store: &S) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Some(best) => {
                log::info!("Loaded high score {}", best);
                Self::new(best)
            }
            None => {
                log::info!("No high score found, starting fresh");
                Self::default()
            }
        }
    }

    /// Persist the best score; failures are logged and ignored
    pub fn save<S: LocalStore + ?Sized>(&self, store: &mut S) {
        match store.set(Self::STORAGE_KEY, self.best) {
            Ok(()) => log::debug!("High score saved ({})", self.best),
            Err(e) => log::warn!("Failed to save high score: {}", e),
        }
    }
}
