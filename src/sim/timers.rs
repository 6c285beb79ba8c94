//! Delayed side effects keyed to the controller clock
//!
//! Each kind of timer has at most one pending instance; scheduling a kind
//! that is already pending replaces it. The clock only moves when the
//! controller ticks, so timers are deterministic and die with the controller.

/// Deferred actions the controller performs later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Clear hit feedback and the perfect glow
    FeedbackClear,
    /// Accept taps again after a hit
    Rearm,
    /// Hide the combo banner
    ComboBanner,
    /// Stop the miss shake
    Shake,
    /// Hide the instructions banner
    Instructions,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: TimerKind,
    due_ms: f64,
}

/// Pending timers plus the clock they run on
#[derive(Debug, Clone, Default)]
pub struct Timers {
    now_ms: f64,
    pending: Vec<Pending>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the timers were created
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Fire `kind` after `delay_ms`, replacing any pending timer of that kind
    pub fn schedule(&mut self, kind: TimerKind, delay_ms: f64) {
        self.cancel(kind);
        self.pending.push(Pending {
            kind,
            due_ms: self.now_ms + delay_ms.max(0.0),
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|p| p.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|p| p.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward and return the timers that came due, earliest first
    pub fn advance(&mut self, dt_ms: f64) -> Vec<TimerKind> {
        self.now_ms += dt_ms.max(0.0);
        let now = self.now_ms;

        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due_ms <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|p| p.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_when_due() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::Rearm, 80.0);
        assert!(timers.advance(79.0).is_empty());
        assert_eq!(timers.advance(1.0), vec![TimerKind::Rearm]);
        assert!(timers.is_empty());
        assert!(timers.advance(1000.0).is_empty());
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::FeedbackClear, 350.0);
        timers.schedule(TimerKind::Rearm, 80.0);
        timers.schedule(TimerKind::ComboBanner, 600.0);
        assert_eq!(
            timers.advance(700.0),
            vec![
                TimerKind::Rearm,
                TimerKind::FeedbackClear,
                TimerKind::ComboBanner
            ]
        );
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::FeedbackClear, 350.0);
        timers.advance(300.0);
        timers.schedule(TimerKind::FeedbackClear, 350.0);
        assert_eq!(timers.len(), 1);
        assert!(timers.advance(100.0).is_empty());
        assert_eq!(timers.advance(250.0), vec![TimerKind::FeedbackClear]);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::Shake, 500.0);
        timers.schedule(TimerKind::Instructions, 4000.0);
        timers.cancel_all();
        assert!(!timers.is_pending(TimerKind::Shake));
        assert!(timers.advance(10_000.0).is_empty());
    }
}
