use crate::domain::batch::BatchState;
use crate::domain::callback::{CallbackPayload, RetryLimitPolicy};
use crate::domain::ports::CallbackSenderRef;
use crate::error::{BulkError, Result};
use tracing::{debug, info, warn};

/// Delivers the batch's completion notification, one attempt per invocation.
///
/// Re-invoking on failure is up to the substrate; the dispatcher only keeps
/// the retry counter and the last failure in the bag so it can decide.
pub struct CallbackDispatcher {
    sender: CallbackSenderRef,
    retry_limit: RetryLimitPolicy,
}

impl CallbackDispatcher {
    pub fn new(sender: CallbackSenderRef, retry_limit: RetryLimitPolicy) -> Self {
        Self {
            sender,
            retry_limit,
        }
    }

    pub async fn execute(&self, mut state: BatchState) -> Result<BatchState> {
        let url = state
            .callback_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| BulkError::InvalidState("callbackUrl is not set".to_string()))?;

        let retry = self
            .retry_limit
            .normalize(state.callback_retry, state.max_callback_retry);
        if retry != state.callback_retry {
            debug!(
                batch_id = %state.batch_id,
                from = state.callback_retry,
                to = retry,
                "callback retry counter normalized"
            );
        }

        let payload = CallbackPayload::from(&state);
        let outcome = match self.sender.send(&url, &payload).await {
            Ok(response) if response.is_success() => Ok(response.status),
            Ok(response) => Err((
                Some(response.status),
                BulkError::UpstreamRejected {
                    status: response.status,
                    body: response.body,
                },
            )),
            Err(e) if !e.fails_job() => Err((None, e)),
            Err(e) => return Err(e),
        };

        match outcome {
            Ok(status) => {
                info!(batch_id = %state.batch_id, status, retry, "callback delivered");
                state.callback_success = Some(true);
                state.callback_response_code = Some(status);
                state.callback_retry = retry;
                state.clear_error();
            }
            Err((status, error)) => {
                let next = self
                    .retry_limit
                    .after_failure(retry, state.max_callback_retry);
                warn!(
                    batch_id = %state.batch_id,
                    error_code = %error.code(),
                    error = %error.description(),
                    retry = next,
                    max_retry = state.max_callback_retry,
                    "callback delivery failed"
                );
                state.callback_success = Some(false);
                state.callback_response_code = status;
                state.callback_retry = next;
                state.record_error(&error);
            }
        }
        Ok(state)
    }
}
