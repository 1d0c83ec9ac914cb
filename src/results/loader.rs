use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use super::{
    model::{
        RawAssertion, RawAssertionError, RawCounts, RawExecution, RawItem, RawResponse, RawRun,
        RawStats, RawTimings, StructuredReport,
    },
    stats::{AssertionOutcome, Counts, ResultSet, ResultStatistics, TestCaseRecord, Timings},
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading structured report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing structured report: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_report(path: &Path) -> Result<ResultSet, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(&contents)
}

pub fn parse_report(contents: &str) -> Result<ResultSet, LoadError> {
    let report: StructuredReport = serde_json::from_str(contents)?;
    Ok(ResultSet::from(report))
}

/// Writes `results` in the runner's JSON layout so it can be loaded back.
pub fn write_structured(path: &Path, results: &ResultSet) -> Result<(), LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(&to_structured(results))?;
    fs::write(path, json).map_err(io_error)
}

pub fn to_structured(results: &ResultSet) -> StructuredReport {
    let stats = &results.statistics;
    StructuredReport {
        synthetic: results.synthetic,
        run: RawRun {
            stats: RawStats {
                tests: stats.tests.into(),
                assertions: stats.assertions.into(),
                requests: stats.requests.into(),
            },
            timings: RawTimings {
                response_average: stats.timings.average_ms,
                response_min: stats.timings.min_ms,
                response_max: stats.timings.max_ms,
            },
            executions: results.cases.iter().map(RawExecution::from).collect(),
        },
    }
}

impl From<StructuredReport> for ResultSet {
    fn from(report: StructuredReport) -> Self {
        let RawRun {
            stats,
            timings,
            executions,
        } = report.run;

        let statistics = ResultStatistics {
            tests: stats.tests.into(),
            assertions: stats.assertions.into(),
            requests: stats.requests.into(),
            timings: Timings {
                average_ms: timings.response_average,
                min_ms: timings.response_min,
                max_ms: timings.response_max,
            },
        };
        if !statistics.is_consistent() {
            tracing::warn!(
                ?statistics,
                "report counts exceed their totals; passed counts are clamped at zero"
            );
        }

        ResultSet {
            statistics,
            cases: executions.into_iter().map(TestCaseRecord::from).collect(),
            synthetic: report.synthetic,
        }
    }
}

impl From<RawCounts> for Counts {
    fn from(raw: RawCounts) -> Self {
        Counts::new(raw.total, raw.pending, raw.failed)
    }
}

impl From<Counts> for RawCounts {
    fn from(counts: Counts) -> Self {
        RawCounts {
            total: counts.total,
            pending: counts.pending,
            failed: counts.failed,
        }
    }
}

impl From<RawExecution> for TestCaseRecord {
    fn from(raw: RawExecution) -> Self {
        let response = raw.response.unwrap_or_default();
        TestCaseRecord {
            name: raw.item.name,
            response_time_ms: response.response_time,
            status_code: response.code,
            assertions: raw
                .assertions
                .into_iter()
                .map(|assertion| AssertionOutcome {
                    description: assertion.assertion,
                    failure: assertion.error.map(|error| error.message),
                })
                .collect(),
        }
    }
}

impl From<&TestCaseRecord> for RawExecution {
    fn from(record: &TestCaseRecord) -> Self {
        RawExecution {
            item: RawItem {
                name: record.name.clone(),
            },
            response: Some(RawResponse {
                response_time: record.response_time_ms,
                code: record.status_code,
            }),
            assertions: record
                .assertions
                .iter()
                .map(|assertion| RawAssertion {
                    assertion: assertion.description.clone(),
                    error: assertion.failure.clone().map(|message| RawAssertionError { message }),
                })
                .collect(),
        }
    }
}
