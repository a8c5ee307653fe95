//! Three-finger tap recognizer.
//!
//! Watches the active finger count over time. Exactly three fingers arm the
//! tracker; lifting all of them within `max_tap_duration` completes the tap.
//! Any other non-zero count starts a tolerance deadline instead of resetting
//! right away, so a finger lifting a few milliseconds early doesn't spoil it.

use super::{GestureDetected, GestureSource};
use crate::config::GestureConfig;
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureSession {
    pub active: bool,
    pub start_time: Option<Instant>,
    /// Pending tolerance reset
    pub reset_deadline: Option<Instant>,
}

pub struct TapTracker {
    config: GestureConfig,
    session: GestureSession,
}

impl TapTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: GestureSession::default(),
        }
    }

    pub fn session(&self) -> GestureSession {
        self.session
    }

    pub fn reset_deadline(&self) -> Option<Instant> {
        self.session.reset_deadline
    }

    /// Feed the finger count of one normalized frame.
    pub fn update(&mut self, fingers: usize, now: Instant) -> Option<GestureDetected> {
        self.expire(now);

        if fingers == self.config.minimum_fingers {
            if !self.session.active {
                debug!("starting {}-finger touch sequence", fingers);
                self.session.active = true;
                self.session.start_time = Some(now);
            } else if self.session.reset_deadline.is_some() {
                debug!("finger count recovered, keeping sequence");
            }
            self.session.reset_deadline = None;
            return None;
        }

        if !self.session.active {
            return None;
        }

        if fingers == 0 {
            return self.finish(now);
        }

        if self.session.reset_deadline.is_none() {
            debug!(
                fingers,
                "wrong finger count, resetting in {:?} unless it recovers",
                self.config.finger_count_tolerance
            );
            self.session.reset_deadline = Some(now + self.config.finger_count_tolerance);
        }
        None
    }

    /// Fire the tolerance reset if its deadline has passed.
    ///
    /// Returns true when the sequence was abandoned.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.session.reset_deadline {
            Some(deadline) if now >= deadline => {
                if self.session.active {
                    debug!("finger count did not recover, resetting");
                }
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.session = GestureSession::default();
    }

    fn finish(&mut self, now: Instant) -> Option<GestureDetected> {
        let start = self.session.start_time;
        self.reset();

        let span = now.saturating_duration_since(start?);
        if span <= self.config.max_tap_duration {
            debug!("valid 3-finger tap in {:.3}s", span.as_secs_f64());
            Some(GestureDetected {
                source: GestureSource::ThreeFingerTap,
                span,
            })
        } else {
            debug!(
                "touch too long ({:.3}s > {:.3}s)",
                span.as_secs_f64(),
                self.config.max_tap_duration.as_secs_f64()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    fn run(tracker: &mut TapTracker, base: Instant, steps: &[(usize, u64)]) -> usize {
        steps
            .iter()
            .filter_map(|&(fingers, at)| tracker.update(fingers, ms(base, at)))
            .count()
    }

    #[test]
    fn tap_duration_boundary() {
        for (lift_at, expected) in [(299, 1), (300, 1), (301, 0)] {
            let mut tracker = TapTracker::new(GestureConfig::default());
            let base = Instant::now();
            let emitted = run(&mut tracker, base, &[(3, 0), (0, lift_at)]);
            assert_eq!(emitted, expected, "lift at {}ms", lift_at);
        }
    }

    #[test]
    fn reports_span_of_tap() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        tracker.update(3, base);
        let detected = tracker.update(0, ms(base, 120)).unwrap();
        assert_eq!(detected.source, GestureSource::ThreeFingerTap);
        assert_eq!(detected.span, Duration::from_millis(120));
    }

    #[test]
    fn brief_miscount_is_tolerated() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        let emitted = run(
            &mut tracker,
            base,
            &[(3, 0), (3, 20), (2, 40), (3, 90), (3, 110), (0, 150)],
        );
        assert_eq!(emitted, 1);
    }

    #[test]
    fn recovery_cancels_pending_reset() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        tracker.update(3, base);
        tracker.update(2, ms(base, 10));
        assert!(tracker.reset_deadline().is_some());
        tracker.update(3, ms(base, 50));
        assert!(tracker.reset_deadline().is_none());
        assert!(!tracker.expire(ms(base, 500)));
        assert!(tracker.session().active);
    }

    #[test]
    fn lasting_miscount_resets_without_emitting() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        tracker.update(3, base);
        tracker.update(2, ms(base, 20));
        assert!(tracker.expire(ms(base, 120)));
        assert_eq!(tracker.session(), GestureSession::default());

        // fingers going back to 3 then 0 is judged as a new sequence
        tracker.update(3, ms(base, 400));
        assert_eq!(tracker.session().start_time, Some(ms(base, 400)));
        assert!(tracker.update(0, ms(base, 900)).is_none());
    }

    #[test]
    fn overdue_deadline_is_applied_before_update() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        let emitted = run(&mut tracker, base, &[(3, 0), (2, 10), (2, 50), (0, 200)]);
        assert_eq!(emitted, 0);
    }

    #[test]
    fn reset_deadline_is_not_pushed_back() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        tracker.update(3, base);
        tracker.update(2, ms(base, 10));
        tracker.update(4, ms(base, 60));
        assert_eq!(tracker.reset_deadline(), Some(ms(base, 110)));
    }

    #[test]
    fn lift_during_tolerance_still_counts() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        let emitted = run(&mut tracker, base, &[(3, 0), (2, 60), (1, 80), (0, 100)]);
        assert_eq!(emitted, 1);
    }

    #[test]
    fn never_three_fingers_never_emits() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        let emitted = run(&mut tracker, base, &[(1, 0), (2, 10), (2, 50), (1, 60), (0, 70)]);
        assert_eq!(emitted, 0);
        assert!(!tracker.session().active);
    }

    #[test]
    fn zero_while_idle_is_noop() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        assert!(tracker.update(0, Instant::now()).is_none());
        assert_eq!(tracker.session(), GestureSession::default());
    }

    #[test]
    fn state_is_pristine_after_emission() {
        let mut tracker = TapTracker::new(GestureConfig::default());
        let base = Instant::now();
        assert_eq!(run(&mut tracker, base, &[(3, 0), (0, 100)]), 1);
        assert_eq!(tracker.session(), GestureSession::default());

        // immediately ready again, no cooldown
        assert_eq!(run(&mut tracker, base, &[(3, 110), (0, 200)]), 1);
    }
}
