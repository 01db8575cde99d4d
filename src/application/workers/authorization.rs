use crate::application::ledger::LedgerLoader;
use crate::domain::batch::BatchState;
use crate::domain::phase::{Job, Phase};
use crate::domain::ports::{AuthorizationApiRef, AuthorizationRequest};
use crate::error::Result;
use tracing::{info, warn};

/// Requests authorization for the whole batch amount from the payer's side.
///
/// Only the response status class is consumed: a 2xx sets
/// `authorizationAccepted = true`, anything else `false`. Either way the phase
/// itself succeeded. A transport failure marks the phase unsuccessful and
/// leaves `authorizationAccepted` untouched.
pub struct AuthorizationWorker {
    ledger: LedgerLoader,
    api: AuthorizationApiRef,
}

impl AuthorizationWorker {
    pub fn new(ledger: LedgerLoader, api: AuthorizationApiRef) -> Self {
        Self { ledger, api }
    }

    pub async fn execute(&self, job: &Job, mut state: BatchState) -> Result<BatchState> {
        let summary = self.ledger.summarize(&state.file_name).await?;
        let request = AuthorizationRequest {
            batch_id: state.batch_id.clone(),
            payer_identifier: summary.payer_identifier.clone(),
            currency: summary.currency.clone(),
            amount: summary.amount_string(),
        };

        match self.api.authorize(&request, &job.correlation_id()).await {
            Ok(response) => {
                let accepted = response.is_success();
                info!(
                    batch_id = %state.batch_id,
                    status = response.status,
                    accepted,
                    amount = %request.amount,
                    "batch authorization answered"
                );
                state.authorization_accepted = Some(accepted);
                state.results.set(Phase::Authorization, true);
                state.record_completion(Phase::Authorization);
            }
            Err(e) if !e.fails_job() => {
                warn!(batch_id = %state.batch_id, error = %e, "batch authorization failed");
                state.results.set(Phase::Authorization, false);
                state.record_error(&e);
            }
            Err(e) => return Err(e),
        }
        Ok(state)
    }
}
