use std::time::{Duration, Instant};

use crate::store::CompletionEvent;

pub const CELEBRATION_DURATION: Duration = Duration::from_millis(2000);

pub const CELEBRATION_EMOJIS: [&str; 5] = ["🎉", "🔥", "⭐", "💪", "✨"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CelebrationSignal {
    pub visible: bool,
    pub streak: u32,
    pub habit_name: String,
}

impl CelebrationSignal {
    pub fn headline(&self) -> String {
        format!("{} Day Streak! 🔥", self.streak)
    }
}

// A new completion while showing replaces the payload and restarts the timer.
#[derive(Debug, Clone)]
pub struct Celebration {
    duration: Duration,
    signal: CelebrationSignal,
    hide_at: Option<Instant>,
}

impl Celebration {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            signal: CelebrationSignal::default(),
            hide_at: None,
        }
    }

    pub fn trigger(&mut self, event: &CompletionEvent, now: Instant) {
        tracing::debug!(habit_id = event.habit_id, streak = event.streak, "celebration shown");
        self.signal = CelebrationSignal {
            visible: true,
            streak: event.streak,
            habit_name: event.habit_name.clone(),
        };
        self.hide_at = Some(now + self.duration);
    }

    /// Advances the timer; returns `true` when this call hid the celebration.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.signal.visible = false;
                self.hide_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_showing(&self) -> bool {
        self.signal.visible
    }

    pub fn signal(&self) -> &CelebrationSignal {
        &self.signal
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.hide_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new(CELEBRATION_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, streak: u32) -> CompletionEvent {
        CompletionEvent {
            habit_id: 1,
            habit_name: name.to_string(),
            streak,
        }
    }

    #[test]
    fn shows_then_hides_after_duration() {
        let start = Instant::now();
        let mut celebration = Celebration::default();
        assert!(!celebration.is_showing());

        celebration.trigger(&event("Meditate", 3), start);
        assert!(celebration.is_showing());
        assert_eq!(celebration.signal().headline(), "3 Day Streak! 🔥");
        assert!(!celebration.tick(start + Duration::from_millis(1999)));
        assert!(celebration.tick(start + CELEBRATION_DURATION));

        let hidden = celebration.signal();
        assert!(!hidden.visible);
        assert_eq!(hidden.streak, 3);
        assert_eq!(hidden.habit_name, "Meditate");
        assert_eq!(celebration.remaining(start), None);
    }

    #[test]
    fn second_completion_restarts_with_latest_values() {
        let start = Instant::now();
        let mut celebration = Celebration::default();
        celebration.trigger(&event("Meditate", 3), start);
        let later = start + Duration::from_millis(1500);
        celebration.trigger(&event("Read", 8), later);

        assert!(!celebration.tick(start + Duration::from_millis(2500)));
        assert_eq!(celebration.signal().habit_name, "Read");
        assert_eq!(celebration.signal().streak, 8);
        assert!(celebration.tick(later + CELEBRATION_DURATION));
    }
}
