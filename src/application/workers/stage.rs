use crate::domain::batch::BatchState;
use crate::domain::phase::Phase;
use crate::domain::ports::PhaseHandlerRef;
use crate::error::{BulkError, Result};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Worker for the stage phases whose domain work is delegated to a
/// [`PhaseHandler`](crate::domain::ports::PhaseHandler).
pub struct StageWorker {
    phase: Phase,
    handler: PhaseHandlerRef,
}

impl StageWorker {
    pub fn new(phase: Phase, handler: PhaseHandlerRef) -> Self {
        Self { phase, handler }
    }

    pub async fn execute(&self, mut state: BatchState) -> Result<BatchState> {
        match self.handler.handle(self.phase, &state).await {
            Ok(report) => {
                if let Some(rate) = report.completion_rate {
                    if rate < Decimal::ZERO || rate > Decimal::ONE {
                        return Err(BulkError::InvalidState(format!(
                            "{} reported completion rate {rate} outside [0, 1]",
                            self.phase
                        )));
                    }
                    state.completion_rate = Some(rate);
                }
                info!(batch_id = %state.batch_id, phase = %self.phase, "stage completed");
                state.results.set(self.phase, true);
                state.record_completion(self.phase);
            }
            Err(e) if !e.fails_job() => {
                warn!(batch_id = %state.batch_id, phase = %self.phase, error = %e, "stage failed");
                state.results.set(self.phase, false);
                state.record_error(&e);
            }
            Err(e) => return Err(e),
        }
        Ok(state)
    }
}
