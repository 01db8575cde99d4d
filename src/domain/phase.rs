use crate::error::BulkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A discrete, independently enable-able step of the batch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Authorization,
    PartyLookup,
    Approval,
    Ordering,
    Splitting,
    Formatting,
    #[serde(rename = "successThresholdCheck")]
    ThresholdCheck,
    MergeBack,
}

impl Phase {
    /// Canonical execution order.
    pub const ALL: [Phase; 8] = [
        Phase::Authorization,
        Phase::PartyLookup,
        Phase::Approval,
        Phase::Ordering,
        Phase::Splitting,
        Phase::Formatting,
        Phase::ThresholdCheck,
        Phase::MergeBack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Authorization => "authorization",
            Phase::PartyLookup => "partyLookup",
            Phase::Approval => "approval",
            Phase::Ordering => "ordering",
            Phase::Splitting => "splitting",
            Phase::Formatting => "formatting",
            Phase::ThresholdCheck => "successThresholdCheck",
            Phase::MergeBack => "mergeBack",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BulkError::Config(format!("unknown phase {s:?}")))
    }
}

/// One invocation of a worker, as handed out by the job-dispatch substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Unique key of the job; also the client correlation id for outbound calls.
    pub key: u64,
    pub phase: Phase,
}

impl Job {
    pub fn new(key: u64, phase: Phase) -> Self {
        Self { key, phase }
    }

    pub fn correlation_id(&self) -> String {
        self.key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names_round_trip_through_from_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.name().parse::<Phase>().unwrap(), phase);
        }
        assert_eq!(" MergeBack ".parse::<Phase>().unwrap(), Phase::MergeBack);
    }

    #[test]
    fn test_unknown_phase_is_config_error() {
        assert!(matches!("sendCallback".parse::<Phase>(), Err(BulkError::Config(_))));
    }

    #[test]
    fn test_serde_name_matches_display() {
        let json = serde_json::to_string(&Phase::ThresholdCheck).unwrap();
        assert_eq!(json, "\"successThresholdCheck\"");
        assert_eq!(Phase::PartyLookup.to_string(), "partyLookup");
    }
}
