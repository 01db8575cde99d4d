//! Success-threshold gate.
//!
//! The gate is evaluated once per invocation. While the completion rate stays
//! below the threshold it asks to be re-invoked after a delay, at most
//! `max_retry` times, before settling on a failed outcome.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error code recorded when the gate settles without meeting its threshold.
pub const THRESHOLD_UNMET: &str = "THRESHOLD_UNMET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdState {
    #[default]
    Pending,
    Retry,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDecision {
    /// Completion rate reached the threshold.
    Met,
    /// Re-evaluate later; `attempt` is the new retry count.
    Retry { attempt: u32 },
    /// Retries are used up and the threshold is still unmet.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub threshold: Decimal,
    pub max_retry: u32,
}

impl ThresholdPolicy {
    pub fn new(threshold: Decimal, max_retry: u32) -> Self {
        Self {
            threshold,
            max_retry,
        }
    }

    pub fn evaluate(&self, completion_rate: Decimal, retries: u32) -> ThresholdDecision {
        if completion_rate >= self.threshold {
            ThresholdDecision::Met
        } else if retries < self.max_retry {
            ThresholdDecision::Retry {
                attempt: retries + 1,
            }
        } else {
            ThresholdDecision::Exhausted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_met_when_rate_equals_threshold() {
        let policy = ThresholdPolicy::new(dec!(0.9), 2);
        assert_eq!(policy.evaluate(dec!(0.90), 0), ThresholdDecision::Met);
        assert_eq!(policy.evaluate(dec!(1), 2), ThresholdDecision::Met);
    }

    #[test]
    fn test_terminates_within_max_retry_plus_one_evaluations() {
        for max_retry in 0..6 {
            let policy = ThresholdPolicy::new(dec!(0.9), max_retry);
            let mut retries = 0;
            let mut evaluations = 0;
            loop {
                evaluations += 1;
                match policy.evaluate(dec!(0.5), retries) {
                    ThresholdDecision::Retry { attempt } => retries = attempt,
                    decision => {
                        assert_eq!(decision, ThresholdDecision::Exhausted);
                        break;
                    }
                }
            }
            assert_eq!(evaluations, max_retry + 1);
            assert_eq!(retries, max_retry);
        }
    }
}
