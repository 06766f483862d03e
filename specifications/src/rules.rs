//! Retry/catch rule shapes shared by the CIR (where they're parsed from
//! call keyword arguments) and the workflow JSON emitter (where they're
//! serialized verbatim). Grounded on `cast.py`'s `getRetrier` and
//! `asfast.py`'s exception-handler-map-to-`Catch`-list translation.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryRule {
    #[serde(rename = "ErrorEquals")]
    pub error_equals: Vec<String>,
    #[serde(rename = "IntervalSeconds")]
    pub interval_seconds: i64,
    #[serde(rename = "MaxAttempts")]
    pub max_attempts: i64,
    #[serde(rename = "BackoffRate")]
    pub backoff_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatchRule {
    #[serde(rename = "ErrorEquals")]
    pub error_equals: Vec<String>,
    #[serde(rename = "Next")]
    pub next: String,
}
