//! Serde view of the runner's JSON report. Only the fields the dashboard
//! reads are modelled; everything else in the file is ignored.

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    /// Set only on reports generated by runboard itself in demo mode.
    #[serde(default, skip_serializing_if = "is_false")]
    pub synthetic: bool,
    pub run: RawRun,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRun {
    pub stats: RawStats,
    pub timings: RawTimings,
    pub executions: Vec<RawExecution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStats {
    pub tests: RawCounts,
    pub assertions: RawCounts,
    pub requests: RawCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCounts {
    pub total: u64,
    pub pending: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTimings {
    pub response_average: f64,
    pub response_min: f64,
    pub response_max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExecution {
    pub item: RawItem,
    pub response: Option<RawResponse>,
    pub assertions: Vec<RawAssertion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawResponse {
    pub response_time: u64,
    pub code: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAssertion {
    pub assertion: String,
    pub error: Option<RawAssertionError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAssertionError {
    pub message: String,
}
