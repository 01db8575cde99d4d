use crate::domain::batch::BatchState;
use crate::domain::phase::Phase;
use crate::domain::threshold::{THRESHOLD_UNMET, ThresholdDecision, ThresholdPolicy, ThresholdState};
use crate::error::{BulkError, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Gate that holds the batch until its completion rate reaches the success
/// threshold.
///
/// One evaluation per invocation. On `RETRY` the substrate waits
/// `thresholdDelay` and invokes the worker again, which moves the bag back to
/// `PENDING` before evaluating.
/// Once `DONE`, further invocations return the bag unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThresholdCheckWorker;

impl ThresholdCheckWorker {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, mut state: BatchState) -> Result<BatchState> {
        if state.threshold_state == ThresholdState::Done {
            debug!(batch_id = %state.batch_id, "threshold check already settled");
            return Ok(state);
        }

        let threshold = state
            .success_threshold
            .ok_or_else(|| BulkError::InvalidState("successThreshold is not set".to_string()))?;
        if threshold < Decimal::ZERO || threshold > Decimal::ONE {
            return Err(BulkError::InvalidState(format!(
                "successThreshold {threshold} is outside [0, 1]"
            )));
        }

        if state.threshold_state == ThresholdState::Retry {
            debug!(batch_id = %state.batch_id, retry = state.threshold_retry, "threshold timer fired");
            state.threshold_state = ThresholdState::Pending;
        }

        let completion_rate = state.completion_rate.unwrap_or(Decimal::ZERO);
        let policy = ThresholdPolicy::new(threshold, state.max_threshold_retry);

        match policy.evaluate(completion_rate, state.threshold_retry) {
            ThresholdDecision::Met => {
                info!(batch_id = %state.batch_id, %completion_rate, %threshold, "success threshold met");
                state.threshold_state = ThresholdState::Done;
                state.results.set(Phase::ThresholdCheck, true);
                state.record_completion(Phase::ThresholdCheck);
            }
            ThresholdDecision::Retry { attempt } => {
                info!(
                    batch_id = %state.batch_id,
                    %completion_rate,
                    %threshold,
                    attempt,
                    delay = %state.threshold_delay,
                    "success threshold not met, scheduling re-evaluation"
                );
                state.threshold_retry = attempt;
                state.threshold_state = ThresholdState::Retry;
            }
            ThresholdDecision::Exhausted => {
                warn!(
                    batch_id = %state.batch_id,
                    %completion_rate,
                    %threshold,
                    retries = state.threshold_retry,
                    "success threshold unmet after all retries"
                );
                state.threshold_state = ThresholdState::Done;
                state.results.set(Phase::ThresholdCheck, false);
                state.error_code = Some(THRESHOLD_UNMET.to_string());
                state.error_description = Some(format!(
                    "completion rate {completion_rate} below threshold {threshold} after {} retries",
                    state.threshold_retry
                ));
                state.record_completion(Phase::ThresholdCheck);
            }
        }
        Ok(state)
    }
}
