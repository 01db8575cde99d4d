use crate::application::callback::CallbackDispatcher;
use crate::application::workers::PhaseWorker;
use crate::domain::batch::BatchState;
use crate::domain::phase::{Job, Phase};
use crate::domain::threshold::ThresholdState;
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// In-process stand-in for the job-dispatch substrate.
///
/// Invokes the workers one job at a time in their configured order, honours
/// the threshold timer between ThresholdCheck evaluations and re-invokes the
/// callback dispatcher until it succeeds or the retry counter reaches
/// `maxCallbackRetry`. A failed job stops the batch with that error. Batches
/// without a callback url end after the last phase.
pub struct BatchRunner {
    workers: Vec<PhaseWorker>,
    dispatcher: CallbackDispatcher,
    next_job_key: AtomicU64,
}

impl BatchRunner {
    pub fn new(workers: Vec<PhaseWorker>, dispatcher: CallbackDispatcher) -> Self {
        Self {
            workers,
            dispatcher,
            next_job_key: AtomicU64::new(1),
        }
    }

    fn next_job(&self, phase: Phase) -> Job {
        Job::new(self.next_job_key.fetch_add(1, Ordering::Relaxed), phase)
    }

    pub async fn run(&self, mut state: BatchState) -> Result<BatchState> {
        info!(batch_id = %state.batch_id, phases = self.workers.len(), "batch started");

        for worker in &self.workers {
            loop {
                let job = self.next_job(worker.phase());
                state = worker.execute(&job, state).await?;

                let waiting = worker.phase() == Phase::ThresholdCheck
                    && state.threshold_state == ThresholdState::Retry;
                if !waiting {
                    break;
                }
                tokio::time::sleep(state.threshold_delay.as_duration()).await;
            }
        }

        if state.callback_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
            debug!(batch_id = %state.batch_id, "no callback url, skipping notification");
            return Ok(state);
        }

        loop {
            state = self.dispatcher.execute(state).await?;
            if state.callback_success == Some(true) {
                break;
            }
            if state.callback_retry >= state.max_callback_retry {
                warn!(
                    batch_id = %state.batch_id,
                    retries = state.callback_retry,
                    "callback retries exhausted"
                );
                break;
            }
        }

        info!(
            batch_id = %state.batch_id,
            callback_success = ?state.callback_success,
            phase_count = state.phase_count,
            "batch finished"
        );
        Ok(state)
    }
}
