//! Bounded-retry decision for failed submissions.

/// What to do with a request after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Put it back in the queue for another attempt.
    Retry,
    /// Stop trying. The request goes to failed and needs an operator.
    GiveUp,
}

/// Retry policy keyed on the request's failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    max_failures: u32,
}

impl FailurePolicy {
    pub fn new(max_failures: u32) -> Self {
        Self {
            max_failures: max_failures.max(1),
        }
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    /// Decide after the failure count has already been incremented for the
    /// attempt that just failed.
    pub fn decide(&self, failure_count: u32) -> Decision {
        if failure_count < self.max_failures {
            Decision::Retry
        } else {
            Decision::GiveUp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_until_the_maximum_then_gives_up() {
        let policy = FailurePolicy::new(3);
        assert_eq!(policy.decide(1), Decision::Retry);
        assert_eq!(policy.decide(2), Decision::Retry);
        assert_eq!(policy.decide(3), Decision::GiveUp);
        assert_eq!(policy.decide(7), Decision::GiveUp);
    }

    #[test]
    fn zero_maximum_is_clamped_to_one_attempt() {
        let policy = FailurePolicy::new(0);
        assert_eq!(policy.max_failures(), 1);
        assert_eq!(policy.decide(1), Decision::GiveUp);
    }
}
