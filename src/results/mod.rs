mod loader;
mod model;
mod stats;
mod synthetic;

pub use loader::{load_report, parse_report, to_structured, write_structured, LoadError};
pub use model::StructuredReport;
pub use stats::{AssertionOutcome, Counts, ResultSet, ResultStatistics, TestCaseRecord, Timings};
pub use synthetic::{synthesize, RESPONSE_TIME_RANGE, STATUS_CODES, SYNTHETIC_CASES};
