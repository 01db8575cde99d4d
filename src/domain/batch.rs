use crate::domain::phase::Phase;
use crate::domain::threshold::ThresholdState;
use crate::error::BulkError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which phases execute for a batch. Fixed at batch creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhaseToggles {
    pub authorization_enabled: bool,
    pub party_lookup_enabled: bool,
    pub approval_enabled: bool,
    pub ordering_enabled: bool,
    pub splitting_enabled: bool,
    pub formatting_enabled: bool,
    pub success_threshold_check_enabled: bool,
    pub merge_enabled: bool,
}

impl Default for PhaseToggles {
    fn default() -> Self {
        Self {
            authorization_enabled: true,
            party_lookup_enabled: true,
            approval_enabled: true,
            ordering_enabled: true,
            splitting_enabled: true,
            formatting_enabled: true,
            success_threshold_check_enabled: true,
            merge_enabled: true,
        }
    }
}

impl PhaseToggles {
    pub fn is_enabled(&self, phase: Phase) -> bool {
        *self.flag(phase)
    }

    pub fn set(&mut self, phase: Phase, enabled: bool) {
        *self.flag_mut(phase) = enabled;
    }

    fn flag(&self, phase: Phase) -> &bool {
        match phase {
            Phase::Authorization => &self.authorization_enabled,
            Phase::PartyLookup => &self.party_lookup_enabled,
            Phase::Approval => &self.approval_enabled,
            Phase::Ordering => &self.ordering_enabled,
            Phase::Splitting => &self.splitting_enabled,
            Phase::Formatting => &self.formatting_enabled,
            Phase::ThresholdCheck => &self.success_threshold_check_enabled,
            Phase::MergeBack => &self.merge_enabled,
        }
    }

    fn flag_mut(&mut self, phase: Phase) -> &mut bool {
        match phase {
            Phase::Authorization => &mut self.authorization_enabled,
            Phase::PartyLookup => &mut self.party_lookup_enabled,
            Phase::Approval => &mut self.approval_enabled,
            Phase::Ordering => &mut self.ordering_enabled,
            Phase::Splitting => &mut self.splitting_enabled,
            Phase::Formatting => &mut self.formatting_enabled,
            Phase::ThresholdCheck => &mut self.success_threshold_check_enabled,
            Phase::MergeBack => &mut self.merge_enabled,
        }
    }
}

/// Per-phase success flags. `None` until the phase has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhaseResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_lookup_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splitting_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_threshold_check_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_successful: Option<bool>,
}

impl PhaseResults {
    pub fn get(&self, phase: Phase) -> Option<bool> {
        match phase {
            Phase::Authorization => self.authorization_successful,
            Phase::PartyLookup => self.party_lookup_successful,
            Phase::Approval => self.approval_successful,
            Phase::Ordering => self.ordering_successful,
            Phase::Splitting => self.splitting_successful,
            Phase::Formatting => self.formatting_successful,
            Phase::ThresholdCheck => self.success_threshold_check_successful,
            Phase::MergeBack => self.merge_successful,
        }
    }

    pub fn set(&mut self, phase: Phase, successful: bool) {
        let slot = match phase {
            Phase::Authorization => &mut self.authorization_successful,
            Phase::PartyLookup => &mut self.party_lookup_successful,
            Phase::Approval => &mut self.approval_successful,
            Phase::Ordering => &mut self.ordering_successful,
            Phase::Splitting => &mut self.splitting_successful,
            Phase::Formatting => &mut self.formatting_successful,
            Phase::ThresholdCheck => &mut self.success_threshold_check_successful,
            Phase::MergeBack => &mut self.merge_successful,
        };
        *slot = Some(successful);
    }
}

/// A delay handed to the substrate as an ISO-8601 timer value (`PT30S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerDuration(pub Duration);

impl TimerDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for TimerDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PT{}S", self.0.as_secs())
    }
}

impl FromStr for TimerDuration {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BulkError::InvalidState(format!("invalid timer duration {s:?}"));
        let mut rest = s.trim().strip_prefix("PT").ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut secs: u64 = 0;
        for (unit, factor) in [('H', 3600), ('M', 60), ('S', 1)] {
            if let Some((value, tail)) = rest.split_once(unit) {
                let value: u64 = value.parse().map_err(|_| invalid())?;
                secs = value
                    .checked_mul(factor)
                    .and_then(|part| secs.checked_add(part))
                    .ok_or_else(invalid)?;
                rest = tail;
            }
        }
        if !rest.is_empty() {
            return Err(invalid());
        }
        Ok(Self::from_secs(secs))
    }
}

impl Serialize for TimerDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimerDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The variable bag threaded through every phase of a batch.
///
/// Workers take the bag by value and hand back an updated copy. Nothing is
/// ever removed; optional fields are only omitted from the wire while unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchState {
    pub batch_id: String,
    pub file_name: String,
    pub request_id: String,
    pub purpose: String,
    pub tenant_id: String,
    #[serde(flatten)]
    pub toggles: PhaseToggles,

    #[serde(rename = "maxStatusRetry")]
    pub max_threshold_retry: u32,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_threshold: Option<Decimal>,
    #[serde(rename = "thresholdDelay")]
    pub threshold_delay: TimerDuration,
    pub threshold_retry: u32,
    pub threshold_state: ThresholdState,

    #[serde(flatten)]
    pub results: PhaseResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_accepted: Option<bool>,

    pub callback_retry: u32,
    pub max_callback_retry: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_rate: Option<Decimal>,
    pub phases: Vec<Phase>,
    pub phase_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_response_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl BatchState {
    /// Appends a completed phase to the ordered phase record.
    pub fn record_completion(&mut self, phase: Phase) {
        self.phases.push(phase);
        self.phase_count += 1;
    }

    /// Overwrites the last failure detail.
    pub fn record_error(&mut self, error: &BulkError) {
        self.error_code = Some(error.code());
        self.error_description = Some(error.description());
    }

    pub fn clear_error(&mut self) {
        self.error_code = None;
        self.error_description = None;
    }

    /// Short-circuit for a disabled phase: only its success flag changes.
    pub fn skip_phase(mut self, phase: Phase) -> Self {
        self.results.set(phase, true);
        self
    }

    pub fn to_json(&self) -> crate::error::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
