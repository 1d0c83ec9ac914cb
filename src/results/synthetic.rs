use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::stats::{AssertionOutcome, Counts, ResultSet, ResultStatistics, TestCaseRecord, Timings};

pub const SYNTHETIC_CASES: usize = 45;
pub const STATUS_CODES: [u16; 4] = [200, 201, 400, 500];
pub const RESPONSE_TIME_RANGE: std::ops::RangeInclusive<u64> = 50..=500;

const ASSERTION_FAILURE_RATE: f64 = 0.1;

const ASSERTIONS: [(&str, &str); 3] = [
    ("Status code is 200", "expected response to have status code 200 but got 400"),
    (
        "Response time is less than 500ms",
        "expected response time to be below 500",
    ),
    (
        "Response body is valid JSON",
        "Unexpected token '<' at 1:1",
    ),
];

/// Builds a plausible result set for demo mode. The same seed always
/// yields the same data.
pub fn synthesize(seed: u64) -> ResultSet {
    let mut rng = StdRng::seed_from_u64(seed);

    let cases: Vec<TestCaseRecord> = (1..=SYNTHETIC_CASES)
        .map(|index| {
            let response_time_ms = rng.gen_range(RESPONSE_TIME_RANGE);
            let status_code = *STATUS_CODES.choose(&mut rng).unwrap_or(&200);
            let assertions = ASSERTIONS
                .iter()
                .map(|(description, message)| {
                    if rng.gen_bool(ASSERTION_FAILURE_RATE) {
                        AssertionOutcome::failed(*description, *message)
                    } else {
                        AssertionOutcome::passed(*description)
                    }
                })
                .collect();
            TestCaseRecord {
                name: format!("Test Case {index}"),
                response_time_ms,
                status_code,
                assertions,
            }
        })
        .collect();

    ResultSet {
        statistics: derive_statistics(&cases),
        cases,
        synthetic: true,
    }
}

fn derive_statistics(cases: &[TestCaseRecord]) -> ResultStatistics {
    let total = cases.len() as u64;
    let failed_cases = cases.iter().filter(|case| case.is_failed()).count() as u64;
    let assertion_total = cases.iter().map(|case| case.assertions.len()).sum::<usize>() as u64;
    let assertion_failed = cases
        .iter()
        .map(|case| case.failed_assertions())
        .sum::<usize>() as u64;
    let server_errors = cases.iter().filter(|case| case.status_code >= 500).count() as u64;

    let times = cases.iter().map(|case| case.response_time_ms as f64);
    let timings = if cases.is_empty() {
        Timings::default()
    } else {
        Timings {
            average_ms: times.clone().sum::<f64>() / total as f64,
            min_ms: times.clone().fold(f64::INFINITY, f64::min),
            max_ms: times.fold(0.0, f64::max),
        }
    };

    ResultStatistics {
        tests: Counts::new(total, 0, failed_cases),
        assertions: Counts::new(assertion_total, 0, assertion_failed),
        requests: Counts::new(total, 0, server_errors),
        timings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_same_results() {
        assert_eq!(synthesize(7), synthesize(7));
    }

    #[test]
    fn statistics_agree_with_records() {
        let results = synthesize(42);
        let stats = results.statistics;

        assert_eq!(stats.tests.total, 45);
        assert_eq!(
            stats.tests.failed,
            results.cases.iter().filter(|c| c.is_failed()).count() as u64
        );
        assert_eq!(stats.assertions.total, 45 * 3);
        assert!(stats.is_consistent());
        assert!(stats.timings.min_ms <= stats.timings.average_ms);
        assert!(stats.timings.average_ms <= stats.timings.max_ms);
    }

    #[test]
    fn empty_input_has_zero_timings() {
        assert_eq!(derive_statistics(&[]), ResultStatistics::default());
    }

    proptest! {
        #[test]
        fn synthetic_data_stays_in_bounds(seed in any::<u64>()) {
            let results = synthesize(seed);
            prop_assert!(results.synthetic);
            prop_assert_eq!(results.cases.len(), SYNTHETIC_CASES);
            for case in &results.cases {
                prop_assert!(RESPONSE_TIME_RANGE.contains(&case.response_time_ms));
                prop_assert!(STATUS_CODES.contains(&case.status_code));
            }
            let tests = results.statistics.tests;
            prop_assert_eq!(tests.passed() + tests.failed + tests.pending, tests.total);
        }
    }
}
