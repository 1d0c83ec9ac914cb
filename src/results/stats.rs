#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: u64,
    pub pending: u64,
    pub failed: u64,
}

impl Counts {
    pub fn new(total: u64, pending: u64, failed: u64) -> Self {
        Self {
            total,
            pending,
            failed,
        }
    }

    /// `total - failed - pending`, clamped at zero.
    pub fn passed(&self) -> u64 {
        self.total
            .saturating_sub(self.failed)
            .saturating_sub(self.pending)
    }

    pub fn is_consistent(&self) -> bool {
        self.failed
            .checked_add(self.pending)
            .is_some_and(|sum| sum <= self.total)
    }
}

/// Response times in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timings {
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResultStatistics {
    pub tests: Counts,
    pub assertions: Counts,
    pub requests: Counts,
    pub timings: Timings,
}

impl ResultStatistics {
    pub fn is_consistent(&self) -> bool {
        self.tests.is_consistent()
            && self.assertions.is_consistent()
            && self.requests.is_consistent()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOutcome {
    pub description: String,
    pub failure: Option<String>,
}

impl AssertionOutcome {
    pub fn passed(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            failure: None,
        }
    }

    pub fn failed(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            failure: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseRecord {
    pub name: String,
    pub response_time_ms: u64,
    pub status_code: u16,
    pub assertions: Vec<AssertionOutcome>,
}

impl TestCaseRecord {
    pub fn failed_assertions(&self) -> usize {
        self.assertions
            .iter()
            .filter(|assertion| assertion.failure.is_some())
            .count()
    }

    pub fn is_failed(&self) -> bool {
        self.failed_assertions() > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub statistics: ResultStatistics,
    pub cases: Vec<TestCaseRecord>,
    pub synthetic: bool,
}
