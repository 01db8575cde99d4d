use crate::domain::batch::{PhaseToggles, TimerDuration};
use crate::domain::callback::RetryLimitPolicy;
use crate::domain::phase::Phase;
use crate::error::{BulkError, Result};
use crate::infrastructure::http::HttpPolicy;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    pub success_threshold: Decimal,
    pub max_retry: u32,
    pub delay: TimerDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackConfig {
    pub max_retry: u32,
    pub retry_limit: RetryLimitPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bucket_name: String,
    pub authorization_url: String,
    /// Accepted tenants. Empty means any non-empty tenant is accepted.
    pub tenants: Vec<String>,
    pub phases: PhaseToggles,
    pub phase_order: Vec<Phase>,
    pub threshold: ThresholdConfig,
    pub callback: CallbackConfig,
    pub http: HttpPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_name: "bulk-processor".to_string(),
            authorization_url: "http://localhost:8080".to_string(),
            tenants: Vec::new(),
            phases: PhaseToggles::default(),
            phase_order: Phase::ALL.to_vec(),
            threshold: ThresholdConfig {
                success_threshold: Decimal::new(95, 2),
                max_retry: 3,
                delay: TimerDuration::from_secs(30),
            },
            callback: CallbackConfig {
                max_retry: 3,
                retry_limit: RetryLimitPolicy::ResetOnLimit,
            },
            http: HttpPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut phases = PhaseToggles::default();
        for phase in Phase::ALL {
            let key = format!("BULK_{}_ENABLED", env_name(phase));
            if let Some(value) = lookup(&key) {
                phases.set(phase, parse_bool(&key, &value)?);
            }
        }

        let phase_order = match lookup("BULK_PHASE_ORDER") {
            Some(raw) => parse_phase_order(&raw)?,
            None => defaults.phase_order,
        };

        let success_threshold = match lookup("BULK_SUCCESS_THRESHOLD") {
            Some(raw) => parse_fraction("BULK_SUCCESS_THRESHOLD", &raw)?,
            None => defaults.threshold.success_threshold,
        };

        let tenants = lookup("BULK_TENANTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let retry_limit = match lookup("BULK_CALLBACK_RETRY_LIMIT") {
            Some(raw) => raw.parse()?,
            None => defaults.callback.retry_limit,
        };

        Ok(Config {
            bucket_name: lookup("BULK_BUCKET_NAME").unwrap_or(defaults.bucket_name),
            authorization_url: lookup("BULK_AUTHORIZATION_URL")
                .unwrap_or(defaults.authorization_url),
            tenants,
            phases,
            phase_order,
            threshold: ThresholdConfig {
                success_threshold,
                max_retry: parse_or(
                    &lookup,
                    "BULK_THRESHOLD_MAX_RETRY",
                    defaults.threshold.max_retry,
                )?,
                delay: TimerDuration::from_secs(parse_or(
                    &lookup,
                    "BULK_THRESHOLD_DELAY_SECS",
                    defaults.threshold.delay.as_duration().as_secs(),
                )?),
            },
            callback: CallbackConfig {
                max_retry: parse_or(
                    &lookup,
                    "BULK_CALLBACK_MAX_RETRY",
                    defaults.callback.max_retry,
                )?,
                retry_limit,
            },
            http: HttpPolicy {
                connect_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "BULK_HTTP_CONNECT_TIMEOUT_MS",
                    defaults.http.connect_timeout.as_millis() as u64,
                )?),
                request_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "BULK_HTTP_TIMEOUT_MS",
                    defaults.http.request_timeout.as_millis() as u64,
                )?),
                transport_retries: parse_or(
                    &lookup,
                    "BULK_HTTP_TRANSPORT_RETRIES",
                    defaults.http.transport_retries,
                )?,
                retry_backoff: defaults.http.retry_backoff,
            },
        })
    }
}

fn env_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Authorization => "AUTHORIZATION",
        Phase::PartyLookup => "PARTY_LOOKUP",
        Phase::Approval => "APPROVAL",
        Phase::Ordering => "ORDERING",
        Phase::Splitting => "SPLITTING",
        Phase::Formatting => "FORMATTING",
        Phase::ThresholdCheck => "SUCCESS_THRESHOLD_CHECK",
        Phase::MergeBack => "MERGE",
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BulkError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(BulkError::Config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_fraction(key: &str, raw: &str) -> Result<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| BulkError::Config(format!("{key}: {e}")))?;
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(BulkError::Config(format!("{key} must lie in [0, 1], got {value}")));
    }
    Ok(value)
}

fn parse_phase_order(raw: &str) -> Result<Vec<Phase>> {
    let order = raw
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(str::parse::<Phase>)
        .collect::<Result<Vec<_>>>()?;

    for (i, phase) in order.iter().enumerate() {
        if order[..i].contains(phase) {
            return Err(BulkError::Config(format!("BULK_PHASE_ORDER lists {phase} twice")));
        }
    }
    Ok(order)
}
