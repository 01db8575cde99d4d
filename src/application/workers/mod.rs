//! Phase workers.
//!
//! Every phase is one variant of [`PhaseWorker`] and is invoked the same way:
//! `execute(job, state) -> state`. A phase disabled for the batch never
//! reaches its worker; it only gets its success flag set.

pub mod authorization;
pub mod stage;
pub mod threshold;

use crate::application::ledger::LedgerLoader;
use crate::domain::batch::BatchState;
use crate::domain::phase::{Job, Phase};
use crate::domain::ports::{AuthorizationApiRef, PhaseHandlerRef};
use crate::error::{BulkError, Result};
use authorization::AuthorizationWorker;
use stage::StageWorker;
use threshold::ThresholdCheckWorker;
use tracing::{debug, info};

/// Collaborators the workers are built from.
#[derive(Clone)]
pub struct WorkerDeps {
    pub ledger: LedgerLoader,
    pub authorization: AuthorizationApiRef,
    pub stages: PhaseHandlerRef,
}

pub enum PhaseWorker {
    Authorization(AuthorizationWorker),
    PartyLookup(StageWorker),
    Approval(StageWorker),
    Ordering(StageWorker),
    Splitting(StageWorker),
    Formatting(StageWorker),
    ThresholdCheck(ThresholdCheckWorker),
    MergeBack(StageWorker),
}

impl PhaseWorker {
    pub fn for_phase(phase: Phase, deps: &WorkerDeps) -> Self {
        let stage = || StageWorker::new(phase, deps.stages.clone());
        match phase {
            Phase::Authorization => PhaseWorker::Authorization(AuthorizationWorker::new(
                deps.ledger.clone(),
                deps.authorization.clone(),
            )),
            Phase::PartyLookup => PhaseWorker::PartyLookup(stage()),
            Phase::Approval => PhaseWorker::Approval(stage()),
            Phase::Ordering => PhaseWorker::Ordering(stage()),
            Phase::Splitting => PhaseWorker::Splitting(stage()),
            Phase::Formatting => PhaseWorker::Formatting(stage()),
            Phase::ThresholdCheck => PhaseWorker::ThresholdCheck(ThresholdCheckWorker::new()),
            Phase::MergeBack => PhaseWorker::MergeBack(stage()),
        }
    }

    /// Builds the workers for `order`, in that order.
    pub fn pipeline(order: &[Phase], deps: &WorkerDeps) -> Vec<Self> {
        order
            .iter()
            .map(|phase| Self::for_phase(*phase, deps))
            .collect()
    }

    pub fn phase(&self) -> Phase {
        match self {
            PhaseWorker::Authorization(_) => Phase::Authorization,
            PhaseWorker::PartyLookup(_) => Phase::PartyLookup,
            PhaseWorker::Approval(_) => Phase::Approval,
            PhaseWorker::Ordering(_) => Phase::Ordering,
            PhaseWorker::Splitting(_) => Phase::Splitting,
            PhaseWorker::Formatting(_) => Phase::Formatting,
            PhaseWorker::ThresholdCheck(_) => Phase::ThresholdCheck,
            PhaseWorker::MergeBack(_) => Phase::MergeBack,
        }
    }

    /// Runs one job against the batch state.
    ///
    /// An `Err` means the job failed and the caller's bag stays as it was;
    /// phase-local failures come back as `Ok` with the phase's success flag
    /// set to `false`.
    pub async fn execute(&self, job: &Job, state: BatchState) -> Result<BatchState> {
        let phase = self.phase();
        if job.phase != phase {
            return Err(BulkError::InvalidState(format!(
                "job {} is for {}, not {phase}",
                job.key, job.phase
            )));
        }

        if !state.toggles.is_enabled(phase) {
            debug!(batch_id = %state.batch_id, %phase, job_key = job.key, "phase disabled");
            return Ok(state.skip_phase(phase));
        }

        info!(batch_id = %state.batch_id, %phase, job_key = job.key, "phase started");
        match self {
            PhaseWorker::Authorization(worker) => worker.execute(job, state).await,
            PhaseWorker::ThresholdCheck(worker) => worker.execute(state).await,
            PhaseWorker::PartyLookup(worker)
            | PhaseWorker::Approval(worker)
            | PhaseWorker::Ordering(worker)
            | PhaseWorker::Splitting(worker)
            | PhaseWorker::Formatting(worker)
            | PhaseWorker::MergeBack(worker) => worker.execute(state).await,
        }
    }
}
