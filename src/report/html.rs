use chrono::{DateTime, Datelike, Local};

use crate::results::{Counts, ResultSet, ResultStatistics, TestCaseRecord};

/// Everything that ends up in a rendered report.
#[derive(Debug, Clone, Copy)]
pub struct ReportDocument<'a> {
    pub statistics: &'a ResultStatistics,
    pub cases: &'a [TestCaseRecord],
    pub synthetic: bool,
    pub generated_at: DateTime<Local>,
}

impl<'a> ReportDocument<'a> {
    pub fn new(results: &'a ResultSet, generated_at: DateTime<Local>) -> Self {
        Self {
            statistics: &results.statistics,
            cases: &results.cases,
            synthetic: results.synthetic,
            generated_at,
        }
    }
}

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
.container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px; text-align: center; margin-bottom: 30px; }
.banner { padding: 12px 20px; border-radius: 8px; margin-bottom: 20px; font-weight: bold; }
.banner.synthetic { background: #fef3c7; color: #92400e; border: 1px solid #f59e0b; }
.summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; margin-bottom: 30px; }
.card { background: #f8f9fa; padding: 20px; border-radius: 10px; text-align: center; border-left: 5px solid; }
.card.total { border-left-color: #3b82f6; }
.card.passed { border-left-color: #10b981; }
.card.failed { border-left-color: #ef4444; }
.card.pending { border-left-color: #f59e0b; }
.card h3 { font-size: 2.5em; margin: 0; }
.card p { margin: 10px 0 0 0; color: #666; font-weight: bold; }
.section { margin: 30px 0; }
.section h2 { color: #333; border-bottom: 2px solid #667eea; padding-bottom: 10px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { padding: 12px; text-align: left; border-bottom: 1px solid #e5e7eb; }
th { background: #f9fafb; font-weight: 600; }
.status-passed { color: #10b981; font-weight: bold; }
.status-failed { color: #ef4444; font-weight: bold; }
.failure { color: #b91c1c; font-size: 0.9em; }
.footer { text-align: center; margin-top: 40px; color: #666; font-size: 0.9em; }
"#;

/// Renders a self-contained HTML report. Deterministic for a given document.
pub fn render_html(doc: &ReportDocument<'_>) -> String {
    let stats = doc.statistics;
    let tests = stats.tests;
    let source = if doc.synthetic { "synthetic" } else { "runner" };

    let banner = if doc.synthetic {
        r#"<div class="banner synthetic">Synthetic data: generated in demo mode, not produced by a real test run.</div>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="runboard-data-source" content="{source}">
<title>Test Execution Report</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<div class="header">
<h1>Test Execution Report</h1>
<p>Generated on {generated}</p>
</div>
{banner}
<div class="summary">
{total}
{passed}
{failed}
{pending}
</div>
<div class="section">
<h2>Execution Summary</h2>
<table>
{requests}
<tr><td><strong>Total Assertions:</strong></td><td>{assertions_total}</td></tr>
<tr><td><strong>Failed Assertions:</strong></td><td>{assertions_failed}</td></tr>
<tr><td><strong>Pending Assertions:</strong></td><td>{assertions_pending}</td></tr>
</table>
</div>
<div class="section">
<h2>Response Times</h2>
<table>
<tr><td><strong>Average:</strong></td><td>{avg:.1} ms</td></tr>
<tr><td><strong>Fastest:</strong></td><td>{min:.0} ms</td></tr>
<tr><td><strong>Slowest:</strong></td><td>{max:.0} ms</td></tr>
</table>
</div>
{details}
<div class="footer">
<p>Report generated by runboard | {year}</p>
</div>
</div>
</body>
</html>
"#,
        generated = doc.generated_at.format("%Y-%m-%d %H:%M:%S"),
        total = card("total", tests.total, "Total Tests"),
        passed = card("passed", tests.passed(), "Passed"),
        failed = card("failed", tests.failed, "Failed"),
        pending = card("pending", tests.pending, "Pending"),
        requests = request_rows(&stats.requests),
        assertions_total = stats.assertions.total,
        assertions_failed = stats.assertions.failed,
        assertions_pending = stats.assertions.pending,
        avg = stats.timings.average_ms,
        min = stats.timings.min_ms,
        max = stats.timings.max_ms,
        details = details_section(doc.cases),
        year = doc.generated_at.year(),
    )
}

fn card(class: &str, value: u64, label: &str) -> String {
    format!(r#"<div class="card {class}"><h3>{value}</h3><p>{label}</p></div>"#)
}

fn request_rows(requests: &Counts) -> String {
    format!(
        "<tr><td><strong>Total Requests:</strong></td><td>{}</td></tr>\n\
         <tr><td><strong>Failed Requests:</strong></td><td>{}</td></tr>",
        requests.total, requests.failed
    )
}

fn details_section(cases: &[TestCaseRecord]) -> String {
    if cases.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for case in cases {
        let (label, class) = if case.is_failed() {
            ("FAILED", "status-failed")
        } else {
            ("PASSED", "status-passed")
        };
        let failures: Vec<String> = case
            .assertions
            .iter()
            .filter_map(|assertion| {
                assertion.failure.as_ref().map(|message| {
                    format!(
                        r#"<div class="failure">{}: {}</div>"#,
                        html_escape(&assertion.description),
                        html_escape(message)
                    )
                })
            })
            .collect();
        rows.push_str(&format!(
            "<tr><td>{name}{failures}</td><td class=\"{class}\">{label}</td><td>{time}</td><td>{code}</td><td>{count}</td><td>{failed}</td></tr>\n",
            name = html_escape(&case.name),
            failures = failures.concat(),
            time = case.response_time_ms,
            code = case.status_code,
            count = case.assertions.len(),
            failed = case.failed_assertions(),
        ));
    }

    format!(
        r#"<div class="section">
<h2>Detailed Results</h2>
<table>
<tr><th>Test Name</th><th>Status</th><th>Response Time (ms)</th><th>Status Code</th><th>Assertions</th><th>Failed Assertions</th></tr>
{rows}</table>
</div>"#
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{synthesize, AssertionOutcome};
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    fn stats(total: u64, pending: u64, failed: u64) -> ResultStatistics {
        ResultStatistics {
            tests: Counts::new(total, pending, failed),
            ..ResultStatistics::default()
        }
    }

    fn render(statistics: &ResultStatistics) -> String {
        render_html(&ReportDocument {
            statistics,
            cases: &[],
            synthetic: false,
            generated_at: at(),
        })
    }

    #[test]
    fn passed_card_is_total_minus_failed_and_pending() {
        let html = render(&stats(45, 2, 3));
        assert!(html.contains(r#"<div class="card passed"><h3>40</h3><p>Passed</p></div>"#));
        assert!(html.contains(r#"<div class="card total"><h3>45</h3><p>Total Tests</p></div>"#));
        assert!(html.contains(r#"<div class="card failed"><h3>3</h3><p>Failed</p></div>"#));
        assert!(html.contains(r#"<div class="card pending"><h3>2</h3><p>Pending</p></div>"#));
    }

    #[test]
    fn zero_tests_render_zero_cards() {
        let html = render(&ResultStatistics::default());
        assert!(html.contains(r#"<div class="card passed"><h3>0</h3><p>Passed</p></div>"#));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("Detailed Results"));
    }

    #[test]
    fn rendering_is_deterministic_and_self_contained() {
        let statistics = stats(10, 1, 1);
        let first = render(&statistics);
        assert_eq!(first, render(&statistics));
        assert!(first.contains("Generated on 2025-06-01 09:30:00"));
        assert!(first.contains("runboard | 2025"));
        assert!(!first.contains("http://"));
        assert!(!first.contains("https://"));
        assert!(!first.contains("<link"));
        assert!(!first.contains("<script"));
    }

    #[test]
    fn synthetic_reports_are_marked() {
        let results = synthesize(1);
        let html = render_html(&ReportDocument::new(&results, at()));
        assert!(html.contains(r#"content="synthetic""#));
        assert!(html.contains("Synthetic data"));
        assert!(html.contains("Test Case 45"));

        let real = render(&stats(1, 0, 0));
        assert!(real.contains(r#"content="runner""#));
        assert!(!real.contains("Synthetic data"));
    }

    #[test]
    fn case_text_is_escaped() {
        let cases = vec![TestCaseRecord {
            name: "<script>alert(1)</script>".to_string(),
            response_time_ms: 12,
            status_code: 500,
            assertions: vec![AssertionOutcome::failed("A & B", "expected \"x\"")],
        }];
        let statistics = stats(1, 0, 1);
        let html = render_html(&ReportDocument {
            statistics: &statistics,
            cases: &cases,
            synthetic: false,
            generated_at: at(),
        });
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("A &amp; B: expected &quot;x&quot;"));
        assert!(html.contains(r#"<td class="status-failed">FAILED</td>"#));
    }
}
