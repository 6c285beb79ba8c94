//! Game loop controller
//!
//! Owns the session and everything that hangs off it: pending timers, the
//! best score, transient feedback and the optional wallet link. The host
//! calls `tick` every frame and `tap`/`restart` on input, then renders a
//! `HudView` projection and handles the returned `GameEvent`s (audio,
//! ledger writes).

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::highscores::HighScore;
use crate::persistence::LocalStore;
use crate::platform::WalletAddress;
use crate::settings::Settings;
use crate::sim::{
    Feedback, GameEvent, LedgerRecord, PointsBreakdown, ScoringMode, Session, Span, TapOutcome,
    TimerKind, Timers, advance_marker, apply_tap, restart,
};

/// Transient presentation flags, driven by timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presentation {
    /// Text under the track
    pub feedback: Option<Feedback>,
    /// Track glow after a hit
    pub perfect_glow: bool,
    /// "N× COMBO!" banner
    pub combo_banner: bool,
    /// Miss shake
    pub shake: bool,
    /// Start-up instructions banner
    pub instructions: bool,
}

/// A linked wallet: the last known ledger record plus points not yet merged into it
#[derive(Debug, Clone, PartialEq)]
pub struct WalletLink {
    pub address: WalletAddress,
    pub cached: LedgerRecord,
    pub session_delta: PointsBreakdown,
}

impl WalletLink {
    /// Ledger total including unsynced points
    pub fn total_points(&self) -> u64 {
        self.cached.total_points + self.session_delta.total()
    }
}

/// The game loop controller
pub struct GameController<S: LocalStore> {
    session: Session,
    high_score: HighScore,
    store: S,
    scoring: ScoringMode,
    motion_effects: bool,
    timers: Timers,
    rng: Pcg32,
    tap_armed: bool,
    autoplay: bool,
    presentation: Presentation,
    wallet: Option<WalletLink>,
    wallet_status: Option<String>,
}

impl<S: LocalStore> GameController<S> {
    /// New controller with a fresh session; the best score is read from `store`
    pub fn new(seed: u64, store: S, settings: &Settings) -> Self {
        Self::with_session(seed, store, settings, Session::default())
    }

    /// New controller resuming `session`
    pub fn with_session(seed: u64, store: S, settings: &Settings, session: Session) -> Self {
        let high_score = HighScore::load(&store);
        let mut controller = Self {
            session,
            high_score,
            store,
            scoring: settings.scoring,
            motion_effects: settings.effective_motion(),
            timers: Timers::new(),
            rng: Pcg32::seed_from_u64(seed),
            tap_armed: true,
            autoplay: false,
            presentation: Presentation::default(),
            wallet: None,
            wallet_status: None,
        };

        if settings.show_instructions {
            controller.presentation.instructions = true;
            controller
                .timers
                .schedule(TimerKind::Instructions, INSTRUCTIONS_MS);
        }

        log::info!(
            "Controller ready (seed {}, scoring {}, best {})",
            seed,
            settings.scoring.as_str(),
            controller.high_score.best()
        );
        controller
    }

    // === Accessors ===

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn wallet(&self) -> Option<&WalletLink> {
        self.wallet.as_ref()
    }

    pub fn wallet_status(&self) -> Option<&str> {
        self.wallet_status.as_deref()
    }

    pub fn scoring(&self) -> ScoringMode {
        self.scoring
    }

    pub fn is_tap_armed(&self) -> bool {
        self.tap_armed
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Controller clock in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    // === Configuration ===

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay = enabled;
        log::info!("Autoplay: {}", enabled);
    }

    // === Actions ===

    /// Advance the clock by `dt_ms`: fire due timers, move the marker, autoplay
    pub fn tick(&mut self, dt_ms: f64) -> Vec<GameEvent> {
        for kind in self.timers.advance(dt_ms) {
            self.fire(kind);
        }

        advance_marker(&mut self.session, dt_ms);

        if self.autoplay && self.wants_autoplay_tap() {
            return self.tap();
        }
        Vec::new()
    }

    /// Player tap
    pub fn tap(&mut self) -> Vec<GameEvent> {
        if !self.tap_armed || !self.session.is_playing() {
            return Vec::new();
        }
        self.tap_armed = false;

        if self.presentation.instructions {
            self.presentation.instructions = false;
            self.timers.cancel(TimerKind::Instructions);
        }

        let mut events = Vec::new();
        let Some(outcome) = apply_tap(&mut self.session, self.scoring, &mut self.rng) else {
            return events;
        };

        match outcome {
            TapOutcome::Hit { combo, award } => {
                events.push(GameEvent::Hit { combo, award });

                if combo >= COMBO_BANNER_THRESHOLD {
                    self.presentation.combo_banner = true;
                    self.timers
                        .schedule(TimerKind::ComboBanner, COMBO_BANNER_MS);
                    events.push(GameEvent::ComboBanner(combo));
                }

                self.presentation.feedback = Some(Feedback::Perfect);
                self.presentation.perfect_glow = self.motion_effects;

                if self.high_score.record(self.session.score) {
                    self.high_score.save(&mut self.store);
                    events.push(GameEvent::NewHighScore(self.session.score));
                }

                if let Some(link) = self.wallet.as_mut() {
                    link.session_delta.add_award(&award);
                }

                self.timers
                    .schedule(TimerKind::FeedbackClear, FEEDBACK_CLEAR_MS);
                self.timers.schedule(TimerKind::Rearm, REARM_DELAY_MS);
            }
            TapOutcome::Miss { kind, distance } => {
                log::info!(
                    "Run over: {} ({:.1} off), score {}",
                    kind.as_str(),
                    distance,
                    self.session.score
                );
                events.push(GameEvent::Miss { kind, distance });

                // A clear scheduled by the last hit must not wipe the miss text
                self.timers.cancel(TimerKind::FeedbackClear);
                self.timers.cancel(TimerKind::Rearm);
                self.presentation.feedback = Some(Feedback::Miss(kind));
                self.presentation.perfect_glow = false;

                if self.motion_effects {
                    self.presentation.shake = true;
                    self.timers.schedule(TimerKind::Shake, SHAKE_MS);
                }

                events.extend(self.flush_wallet_delta());
            }
        }

        events
    }

    /// Start a fresh run
    pub fn restart(&mut self) -> Vec<GameEvent> {
        let mut events = self.flush_wallet_delta();

        self.timers.cancel_all();
        restart(&mut self.session, &mut self.rng);
        self.presentation = Presentation::default();
        self.tap_armed = true;
        if let Some(link) = self.wallet.as_mut() {
            link.session_delta = PointsBreakdown::default();
        }

        log::info!("Restarted (target at {:.1})", self.session.target_position);
        events.push(GameEvent::Restarted);
        events
    }

    // === Wallet ===

    /// Link a wallet; `record` is what the ledger returned (None for a new wallet)
    ///
    /// Linking the wallet that is already linked keeps its unsynced points.
    /// Linking a different one flushes the old link first, so the returned
    /// events may carry its final `LedgerSync`.
    pub fn attach_wallet(
        &mut self,
        address: WalletAddress,
        record: Option<LedgerRecord>,
    ) -> Vec<GameEvent> {
        let cached = record.unwrap_or_default();
        self.wallet_status = Some(format!("Connected {}", address.short()));

        if let Some(link) = self.wallet.as_mut().filter(|l| l.address == address) {
            if cached.total_points > link.cached.total_points {
                link.cached = cached;
            }
            log::debug!("Wallet {} already linked", address.short());
            return Vec::new();
        }

        let events = self.flush_wallet_delta();
        log::info!(
            "Wallet {} linked with {} points",
            address.short(),
            cached.total_points
        );
        self.wallet = Some(WalletLink {
            address,
            cached,
            session_delta: PointsBreakdown::default(),
        });
        events
    }

    /// Unlink the wallet; gameplay carries on untouched
    ///
    /// Returns a final `LedgerSync` if points were still pending.
    pub fn detach_wallet(&mut self) -> Vec<GameEvent> {
        let events = self.flush_wallet_delta();
        if let Some(link) = self.wallet.take() {
            log::info!("Wallet {} unlinked", link.address.short());
        }
        self.wallet_status = None;
        events
    }

    pub fn set_wallet_status(&mut self, status: Option<String>) {
        self.wallet_status = status;
    }

    // === Internals ===

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::FeedbackClear => {
                self.presentation.feedback = None;
                self.presentation.perfect_glow = false;
            }
            TimerKind::Rearm => {
                if self.session.is_playing() {
                    self.tap_armed = true;
                }
            }
            TimerKind::ComboBanner => self.presentation.combo_banner = false,
            TimerKind::Shake => self.presentation.shake = false,
            TimerKind::Instructions => self.presentation.instructions = false,
        }
    }

    /// Marker centre inside the target zone
    fn wants_autoplay_tap(&self) -> bool {
        if !self.tap_armed || !self.session.is_playing() {
            return false;
        }
        let marker = Span::marker(self.session.marker_position);
        Span::target(self.session.target_position).contains(marker.center())
    }

    /// Merge pending session points into the cached record and ask the host to write it
    fn flush_wallet_delta(&mut self) -> Vec<GameEvent> {
        let Some(link) = self.wallet.as_mut() else {
            return Vec::new();
        };
        if link.session_delta.is_empty() {
            return Vec::new();
        }

        link.cached.merge(&link.session_delta);
        link.session_delta = PointsBreakdown::default();
        vec![GameEvent::LedgerSync {
            wallet: link.address.as_str().to_string(),
            record: link.cached,
        }]
    }
}
