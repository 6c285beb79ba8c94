use crate::consts::*;
use crate::controller::GameController;
use crate::persistence::LocalStore;
use crate::sim::{Feedback, GamePhase};

/// Colour family of the feedback text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    /// Green "PERFECT!"
    Perfect,
    /// Amber near-miss text
    Near,
    /// Red clean-miss text
    Miss,
}

impl FeedbackTone {
    pub fn of(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Perfect => FeedbackTone::Perfect,
            Feedback::Miss(kind) if kind.is_near_miss() => FeedbackTone::Near,
            Feedback::Miss(_) => FeedbackTone::Miss,
        }
    }

    /// CSS class for the feedback element
    pub fn css_class(&self) -> &'static str {
        match self {
            FeedbackTone::Perfect => "feedback perfect",
            FeedbackTone::Near => "feedback near",
            FeedbackTone::Miss => "feedback miss",
        }
    }
}

/// Track geometry in track units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackView {
    pub marker_start: f32,
    pub marker_width: f32,
    pub target_start: f32,
    pub target_width: f32,
    /// Glow the track after a hit
    pub glow: bool,
    /// Shake the track after a miss
    pub shake: bool,
}

/// Everything the screen shows, derived from controller state
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub score: u64,
    pub best: u64,
    /// "N× COMBO!" when the banner is up
    pub combo_banner: Option<String>,
    pub show_instructions: bool,
    pub feedback: Option<(&'static str, FeedbackTone)>,
    pub track: TrackView,
    pub game_over: bool,
    /// Line under the final score: "N× streak" or "Keep trying!"
    pub streak_line: Option<String>,
    /// Wallet connection status line
    pub wallet_status: Option<String>,
    /// Linked wallet's ledger total including unsynced points
    pub wallet_points: Option<u64>,
}

impl HudView {
    pub fn from_controller<S: LocalStore>(controller: &GameController<S>) -> Self {
        let session = controller.session();
        let presentation = controller.presentation();
        let game_over = session.phase == GamePhase::GameOver;

        let combo_banner = (presentation.combo_banner && session.combo >= COMBO_BANNER_THRESHOLD)
            .then(|| format!("{}× COMBO!", session.combo));

        let streak_line = (game_over && session.score > 0).then(|| {
            if session.combo > 0 {
                format!("{}× streak", session.combo)
            } else {
                "Keep trying!".to_string()
            }
        });

        Self {
            score: session.score,
            best: controller.high_score(),
            combo_banner,
            show_instructions: presentation.instructions && !game_over,
            feedback: presentation
                .feedback
                .map(|f| (f.as_str(), FeedbackTone::of(f))),
            track: TrackView {
                marker_start: session.marker_position,
                marker_width: INDICATOR_WIDTH,
                target_start: session.target_position,
                target_width: TARGET_WIDTH,
                glow: presentation.perfect_glow,
                shake: presentation.shake,
            },
            game_over,
            streak_line,
            wallet_status: controller.wallet_status().map(str::to_string),
            wallet_points: controller.wallet().map(|w| w.total_points()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::platform::WalletAddress;
    use crate::settings::Settings;
    use crate::sim::Session;

    fn controller_at(marker: f32, target: f32) -> GameController<MemoryStore> {
        let session = Session {
            marker_position: marker,
            target_position: target,
            ..Session::default()
        };
        GameController::with_session(11, MemoryStore::new(), &Settings::default(), session)
    }

    #[test]
    fn test_fresh_view() {
        let controller = controller_at(0.0, 30.0);
        let view = HudView::from_controller(&controller);
        assert_eq!(view.score, 0);
        assert_eq!(view.best, 0);
        assert!(view.show_instructions);
        assert!(!view.game_over);
        assert_eq!(view.feedback, None);
        assert_eq!(view.track.target_start, 30.0);
        assert_eq!(view.track.target_width, TARGET_WIDTH);
        assert_eq!(view.wallet_points, None);
    }

    #[test]
    fn test_hit_view() {
        let mut controller = controller_at(30.0, 30.0);
        controller.tap();
        let view = HudView::from_controller(&controller);
        assert_eq!(view.score, 1);
        assert_eq!(view.best, 1);
        assert_eq!(view.feedback, Some(("PERFECT!", FeedbackTone::Perfect)));
        assert!(view.track.glow);
        assert!(!view.show_instructions);
        assert_eq!(view.combo_banner, None);
    }

    #[test]
    fn test_near_miss_view() {
        let mut controller = controller_at(46.0, 30.0);
        controller.tap();
        let view = HudView::from_controller(&controller);
        assert!(view.game_over);
        assert_eq!(view.feedback, Some(("ALMOST!", FeedbackTone::Near)));
        assert!(view.track.shake);
        // Score 0: no streak line
        assert_eq!(view.streak_line, None);
    }

    #[test]
    fn test_game_over_after_points() {
        let mut controller = controller_at(30.0, 30.0);
        controller.tap();
        controller.tick(REARM_DELAY_MS);
        let target = controller.session().target_position;
        // Park the marker far past the target and miss
        let far = crate::wrap_position(target + 40.0);
        let mut session = controller.session().clone();
        session.marker_position = far;
        let mut controller =
            GameController::with_session(11, MemoryStore::new(), &Settings::default(), session);
        controller.tap();

        let view = HudView::from_controller(&controller);
        assert!(view.game_over);
        assert_eq!(view.score, 1);
        assert_eq!(view.streak_line.as_deref(), Some("Keep trying!"));
        assert_eq!(view.feedback.map(|f| f.1), Some(FeedbackTone::Miss));
    }

    #[test]
    fn test_wallet_lines() {
        let mut controller = controller_at(30.0, 30.0);
        controller.attach_wallet(WalletAddress::new("short-addr"), None);
        controller.tap();
        let view = HudView::from_controller(&controller);
        assert_eq!(view.wallet_status.as_deref(), Some("Connected short-addr"));
        assert_eq!(view.wallet_points, Some(1));
    }

    #[test]
    fn test_projection_does_not_mutate() {
        let mut controller = controller_at(30.0, 30.0);
        controller.tap();
        let before = controller.session().clone();
        let first = HudView::from_controller(&controller);
        let second = HudView::from_controller(&controller);
        assert_eq!(first, second);
        assert_eq!(*controller.session(), before);
    }
}
