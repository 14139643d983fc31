use std::time::Duration;

/// Duration of the animated scroll to the newest message.
pub const SMOOTH_SCROLL_DURATION: Duration = Duration::from_millis(240);

/// Remembers the last transcript revision a view reacted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    seen: Option<u64>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a new revision is observed.
    pub fn observe(&mut self, revision: u64) -> bool {
        if self.seen == Some(revision) {
            return false;
        }
        self.seen = Some(revision);
        true
    }

    pub fn reset(&mut self) {
        self.seen = None;
    }
}

/// Eased interpolation between two scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
}

impl ScrollAnimation {
    pub fn new(from: f32, to: f32) -> Self {
        Self {
            from,
            to,
            duration: SMOOTH_SCROLL_DURATION,
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Offset after `elapsed`, using an ease-out cubic curve.
    pub fn offset_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() || self.is_finished(elapsed) {
            return self.to;
        }

        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_fires_once_per_revision() {
        let mut tracker = ChangeTracker::new();
        assert!(tracker.observe(0));
        assert!(!tracker.observe(0));
        assert!(tracker.observe(1));
        assert!(!tracker.observe(1));

        tracker.reset();
        assert!(tracker.observe(1));
    }

    #[test]
    fn animation_eases_towards_target() {
        let animation = ScrollAnimation::new(0.0, -300.0);

        assert_eq!(animation.offset_at(Duration::ZERO), 0.0);
        let halfway = animation.offset_at(SMOOTH_SCROLL_DURATION / 2);
        assert!(halfway < -150.0 && halfway > -300.0);
        assert_eq!(animation.offset_at(SMOOTH_SCROLL_DURATION), -300.0);
        assert_eq!(animation.offset_at(Duration::from_secs(5)), -300.0);
    }
}
