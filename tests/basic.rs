use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use runboard::config::{load_config, Settings, SettingsBuilder};
use runboard::env::expand_placeholders;
use runboard::pipeline::{execute, Session, Silent};
use runboard::report::list_reports;
use runboard::results::load_report;
use runboard::runner::ExecutionRequest;
use tempfile::tempdir;

const NEWMAN_REPORT: &str = r#"{
  "run": {
    "stats": {
      "iterations": { "total": 1, "pending": 0, "failed": 0 },
      "requests": { "total": 2, "pending": 0, "failed": 0 },
      "tests": { "total": 45, "pending": 2, "failed": 3 },
      "assertions": { "total": 45, "pending": 2, "failed": 3 }
    },
    "timings": { "responseAverage": 120.5, "responseMin": 50, "responseMax": 480 },
    "executions": [
      {
        "item": { "name": "Get inventory" },
        "response": { "responseTime": 87, "code": 200 },
        "assertions": [ { "assertion": "Status code is 200" } ]
      },
      {
        "item": { "name": "Create order" },
        "response": { "responseTime": 140, "code": 400 },
        "assertions": [
          { "assertion": "Status code is 201", "error": { "message": "expected 400 to equal 201" } }
        ]
      }
    ]
  }
}"#;

#[test]
fn expand_placeholders_respects_escapes() -> Result<()> {
    let mut env = HashMap::new();
    env.insert("NAME".to_string(), "runboard".to_string());

    let rendered = expand_placeholders(r"Hello \{literal\} {NAME}!", &env)?;
    assert_eq!(rendered, "Hello {literal} runboard!");
    Ok(())
}

#[test]
fn config_file_drives_settings() -> Result<()> {
    let temp = tempdir()?;
    let base = temp.path();
    write_file(
        base.join("runboard.json"),
        r#"{
  "runner": { "program": "newman", "args": ["--no-color"], "timeoutSecs": 12 },
  "collection": "collections/api.postman_collection.json",
  "reportsDir": "out",
  "env": "mail.env",
  "smtp": { "senderEmail": "{SENDER}", "senderPassword": "{SENDER_PASSWORD}" }
}
"#,
    )?;
    write_file(
        base.join("mail.env"),
        "SENDER=reports@example.com\nSENDER_PASSWORD=app-secret\n",
    )?;

    let cfg = load_config(base)?.expect("config present");
    let settings = SettingsBuilder::new(base.to_path_buf(), cfg.dir.clone(), Some(cfg)).build()?;

    assert_eq!(settings.runner.args, vec!["--no-color".to_string()]);
    assert_eq!(settings.runner.timeout.as_secs(), 12);
    assert_eq!(settings.reports_dir, base.join("out"));
    assert_eq!(
        settings.collection,
        base.join("collections/api.postman_collection.json")
    );
    assert_eq!(settings.smtp.sender_email.as_deref(), Some("reports@example.com"));
    assert_eq!(settings.smtp.sender_password.as_deref(), Some("app-secret"));
    assert!(!settings.synthetic_fallback);
    Ok(())
}

#[cfg(unix)]
mod fake_runner {
    use super::*;
    use std::time::Duration;

    /// Writes a shell script standing in for newman. It writes `report`
    /// to the path following `--reporter-json-export` and exits with `code`.
    fn script(dir: &Path, report: Option<&str>, code: i32) -> Result<PathBuf> {
        let mut body = String::from(
            "json=\"\"\n\
             while [ $# -gt 0 ]; do\n  \
               case \"$1\" in\n    \
                 --reporter-json-export) json=\"$2\"; shift ;;\n  \
               esac\n  \
               shift\n\
             done\n\
             echo \"newman run complete\"\n",
        );
        if let Some(report) = report {
            body.push_str("cat > \"$json\" <<'JSON'\n");
            body.push_str(report);
            body.push_str("\nJSON\n");
        } else {
            body.push_str("echo \"could not write report\" >&2\n");
        }
        body.push_str(&format!("exit {code}\n"));
        let path = dir.join("fake-newman.sh");
        write_file(&path, &body)?;
        Ok(path)
    }

    fn settings_for(base: &Path, script: &Path) -> Result<Settings> {
        let mut settings =
            SettingsBuilder::new(base.to_path_buf(), base.to_path_buf(), None).build()?;
        settings.runner.program = "sh".to_string();
        settings.runner.args = vec![script.display().to_string()];
        Ok(settings)
    }

    fn request(base: &Path) -> ExecutionRequest {
        ExecutionRequest::new(
            base.join("collection.json"),
            None,
            Some("Inventory Service".to_string()),
        )
    }

    #[tokio::test]
    async fn failing_tests_still_produce_results_and_report() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        let script = script(base, Some(NEWMAN_REPORT), 1)?;
        let mut session = Session::new(settings_for(base, &script)?);

        let outcome = execute(&mut session, request(base), &mut Silent).await;

        assert!(outcome.is_success());
        assert!(!outcome.all_passed());
        let results = outcome.results().unwrap();
        assert_eq!(results.statistics.tests.total, 45);
        assert_eq!(results.statistics.tests.passed(), 40);
        assert_eq!(results.cases.len(), 2);
        assert!(!results.synthetic);
        assert!(outcome.stdout.contains("newman run complete"));

        let html = fs::read_to_string(outcome.html_report.as_ref().unwrap())?;
        assert!(html.contains("<h3>40</h3>"));
        assert!(html.contains("Create order"));

        let reloaded = load_report(outcome.json_report.as_ref().unwrap())?;
        assert_eq!(reloaded.statistics, results.statistics);

        let history = list_reports(session.reports_dir())?;
        assert_eq!(history.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_structured_report_is_a_failure() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        let script = script(base, None, 0)?;
        let mut session = Session::new(settings_for(base, &script)?);

        let outcome = execute(&mut session, request(base), &mut Silent).await;

        assert!(!outcome.is_success());
        assert!(outcome.results().is_none());
        assert!(outcome
            .error()
            .unwrap()
            .contains("without writing a structured report"));
        assert!(outcome.stderr.contains("could not write report"));
        assert!(outcome.html_report.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_report_is_a_failure() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        let script = script(base, Some("{ not json"), 0)?;
        let mut session = Session::new(settings_for(base, &script)?);

        let outcome = execute(&mut session, request(base), &mut Silent).await;

        assert!(!outcome.is_success());
        assert!(!outcome.error().unwrap().is_empty());
        assert!(outcome.json_report.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn slow_runner_times_out() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        let path = base.join("slow.sh");
        write_file(&path, "sleep 5\n")?;
        let mut settings = settings_for(base, &path)?;
        settings.runner.timeout = Duration::from_millis(200);
        let mut session = Session::new(settings);

        let outcome = execute(&mut session, request(base), &mut Silent).await;

        assert!(!outcome.is_success());
        assert!(outcome.results().is_none());
        assert!(outcome.error().unwrap().contains("timed out"));
        Ok(())
    }

    #[tokio::test]
    async fn new_run_replaces_previous_outcome() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        let script = script(base, Some(NEWMAN_REPORT), 0)?;
        let mut session = Session::new(settings_for(base, &script)?);

        let first = execute(&mut session, request(base), &mut Silent)
            .await
            .html_report
            .clone();
        let second = execute(&mut session, request(base), &mut Silent)
            .await
            .html_report
            .clone();

        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);
        assert_eq!(session.last_outcome().unwrap().html_report, second);
        assert_eq!(list_reports(session.reports_dir())?.len(), 2);
        Ok(())
    }
}

#[tokio::test]
async fn missing_tool_uses_synthetic_results_only_in_demo_mode() -> Result<()> {
    let temp = tempdir()?;
    let base = temp.path();

    for demo in [false, true] {
        let mut settings = SettingsBuilder::new(base.to_path_buf(), base.to_path_buf(), None)
            .with_demo(demo)
            .build()?;
        settings.runner.program = "runboard-definitely-not-installed".to_string();
        let mut session = Session::new(settings);

        let outcome = execute(
            &mut session,
            ExecutionRequest::new(base.join("collection.json"), None, None),
            &mut Silent,
        )
        .await;

        assert_eq!(outcome.is_success(), demo);
        if demo {
            let results = outcome.results().unwrap();
            assert!(results.synthetic);
            assert_eq!(results.cases.len(), 45);
        } else {
            assert!(outcome.error().unwrap().contains("not found"));
        }
    }
    Ok(())
}

fn write_file<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}
