use crate::domain::batch::BatchState;
use crate::domain::phase::Phase;
use crate::error::BulkError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// Body delivered to the batch's callback URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    #[serde(with = "rust_decimal::serde::float")]
    pub completion_rate: Decimal,
    pub phases: Vec<Phase>,
    pub phase_count: u32,
}

impl From<&BatchState> for CallbackPayload {
    fn from(state: &BatchState) -> Self {
        Self {
            completion_rate: state.completion_rate.unwrap_or(Decimal::ZERO),
            phases: state.phases.clone(),
            phase_count: state.phase_count,
        }
    }
}

/// What happens to the callback retry counter once it hits the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryLimitPolicy {
    /// A counter equal to the limit is reset to zero on the next dispatch,
    /// opening a fresh retry window.
    #[default]
    ResetOnLimit,
    /// The counter never exceeds the limit and is never reset.
    Saturate,
}

impl RetryLimitPolicy {
    /// Retry count to carry into the next delivery attempt.
    pub fn normalize(self, retry: u32, max_retry: u32) -> u32 {
        match self {
            RetryLimitPolicy::ResetOnLimit if retry == max_retry => 0,
            RetryLimitPolicy::ResetOnLimit => retry,
            RetryLimitPolicy::Saturate => retry.min(max_retry),
        }
    }

    /// Retry count after a failed attempt.
    pub fn after_failure(self, retry: u32, max_retry: u32) -> u32 {
        match self {
            RetryLimitPolicy::ResetOnLimit => retry.saturating_add(1),
            RetryLimitPolicy::Saturate => retry.saturating_add(1).min(max_retry),
        }
    }
}

impl FromStr for RetryLimitPolicy {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" | "reset-on-limit" => Ok(RetryLimitPolicy::ResetOnLimit),
            "saturate" => Ok(RetryLimitPolicy::Saturate),
            other => Err(BulkError::Config(format!(
                "unknown callback retry limit policy {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_reset_on_limit_wraps_to_zero() {
        let policy = RetryLimitPolicy::ResetOnLimit;
        assert_eq!(policy.normalize(3, 3), 0);
        assert_eq!(policy.normalize(2, 3), 2);
        assert_eq!(policy.after_failure(0, 3), 1);
    }

    #[test]
    fn test_saturate_never_exceeds_limit() {
        let policy = RetryLimitPolicy::Saturate;
        assert_eq!(policy.normalize(3, 3), 3);
        assert_eq!(policy.normalize(7, 3), 3);
        assert_eq!(policy.after_failure(3, 3), 3);
        assert_eq!(policy.after_failure(1, 3), 2);
    }

    #[test]
    fn test_payload_carries_progress_fields() {
        let mut state = BatchState {
            completion_rate: Some(dec!(0.75)),
            ..Default::default()
        };
        state.record_completion(Phase::Authorization);
        state.record_completion(Phase::ThresholdCheck);

        let payload = CallbackPayload::from(&state);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "completionRate": 0.75,
                "phases": ["authorization", "successThresholdCheck"],
                "phaseCount": 2
            })
        );
    }
}
