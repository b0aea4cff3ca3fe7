//! Auto-resume retry budget.

use std::{ops::Sub, time::Duration};

/// Bounds consecutive automatic re-pair attempts.
///
/// The rendezvous server re-queues a client whose partner left, so resuming
/// costs nothing — but if pairings keep dying instantly (degraded service,
/// a partner stuck in a crash loop) unbounded resumption becomes a tight
/// reconnect loop. The budget counts *quick* failures: an attempt made
/// within `cooldown` of the previous one is consecutive; a pairing that
/// lived longer resets the count.
#[derive(Debug, Clone)]
pub struct RetryBudget<I> {
    max_consecutive: u32,
    cooldown: Duration,
    consecutive: u32,
    last_attempt: Option<I>,
}

impl<I> RetryBudget<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Budget of `max_consecutive` quick resumes, with `cooldown` as the
    /// threshold separating quick failures from healthy pairings.
    pub fn new(max_consecutive: u32, cooldown: Duration) -> Self {
        Self { max_consecutive, cooldown, consecutive: 0, last_attempt: None }
    }

    /// Register a resume attempt at `now`. Returns whether the budget
    /// allows it; a refused attempt does not advance any state.
    pub fn note_attempt(&mut self, now: I) -> bool {
        if let Some(last) = self.last_attempt {
            if now - last >= self.cooldown {
                self.consecutive = 0;
            }
        }
        if self.consecutive >= self.max_consecutive {
            return false;
        }
        self.consecutive += 1;
        self.last_attempt = Some(now);
        true
    }

    /// Consecutive quick attempts so far.
    #[must_use]
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Forget all history (user-initiated restart).
    pub fn reset(&mut self) {
        self.consecutive = 0;
        self.last_attempt = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::RetryBudget;

    #[test]
    fn quick_failures_exhaust_the_budget() {
        let start = Instant::now();
        let mut budget: RetryBudget<Instant> = RetryBudget::new(3, Duration::from_secs(2));

        for n in 0..3 {
            assert!(budget.note_attempt(start + Duration::from_millis(100 * n)));
        }
        assert!(!budget.note_attempt(start + Duration::from_millis(400)));
        assert_eq!(budget.consecutive(), 3);
    }

    #[test]
    fn surviving_the_cooldown_resets_the_count() {
        let start = Instant::now();
        let mut budget: RetryBudget<Instant> = RetryBudget::new(2, Duration::from_secs(2));

        assert!(budget.note_attempt(start));
        assert!(budget.note_attempt(start + Duration::from_millis(500)));
        assert!(!budget.note_attempt(start + Duration::from_millis(600)));

        // A pairing that lasted past the cooldown is a fresh start.
        assert!(budget.note_attempt(start + Duration::from_secs(10)));
        assert_eq!(budget.consecutive(), 1);
    }

    #[test]
    fn reset_forgets_history() {
        let start = Instant::now();
        let mut budget: RetryBudget<Instant> = RetryBudget::new(1, Duration::from_secs(2));
        assert!(budget.note_attempt(start));
        assert!(!budget.note_attempt(start + Duration::from_millis(1)));

        budget.reset();
        assert!(budget.note_attempt(start + Duration::from_millis(2)));
    }
}
