use std::time::Duration;

/// How long the "copied" confirmation stays visible.
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

/// Handle returned for each copy; expiring a stale ticket is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedbackTicket(u64);

/// Transient "copied" flag. Only the newest ticket may clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyFeedback {
    active: bool,
    generation: u64,
}

impl CopyFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mark_copied(&mut self) -> FeedbackTicket {
        self.generation = self.generation.wrapping_add(1);
        self.active = true;
        FeedbackTicket(self.generation)
    }

    /// Clears the flag if `ticket` is the latest one. Returns whether it did.
    pub fn expire(&mut self, ticket: FeedbackTicket) -> bool {
        if ticket.0 != self.generation || !self.active {
            return false;
        }
        self.active = false;
        true
    }

    pub fn reset(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_copy_clears_on_its_own_timer() {
        let mut feedback = CopyFeedback::new();
        let ticket = feedback.mark_copied();
        assert!(feedback.is_active());

        assert!(feedback.expire(ticket));
        assert!(!feedback.is_active());
        assert!(!feedback.expire(ticket));
    }

    #[test]
    fn last_timer_wins_when_copies_overlap() {
        let mut feedback = CopyFeedback::new();
        let first = feedback.mark_copied();
        let second = feedback.mark_copied();

        assert!(!feedback.expire(first));
        assert!(feedback.is_active());
        assert!(feedback.expire(second));
        assert!(!feedback.is_active());
    }

    #[test]
    fn confirmation_lasts_two_seconds() {
        assert_eq!(COPY_FEEDBACK_DURATION, Duration::from_secs(2));
    }

    #[test]
    fn flag_stays_raised_until_its_ticket_expires() {
        let mut feedback = CopyFeedback::new();
        assert!(!feedback.is_active());

        let ticket = feedback.mark_copied();
        assert!(feedback.is_active());
        assert!(!feedback.expire(FeedbackTicket(0)));
        assert!(feedback.is_active());

        assert!(feedback.expire(ticket));
        assert!(!feedback.is_active());
    }
}
