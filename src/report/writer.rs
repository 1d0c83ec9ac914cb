use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::runner::timestamp_slug;

static REPORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^report_(\d{8}_\d{6})(?:_(\d+))?\.html$").expect("report name pattern")
});

/// Writes `contents` to `path`, or to the first free `<stem>_N.<ext>`
/// sibling. Existing files are never replaced.
pub fn write_new_file(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating reports directory {}", parent.display()))?;
    }

    let mut candidate = path.to_path_buf();
    let mut suffix = 1;
    loop {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                file.write_all(contents)
                    .with_context(|| format!("writing report {}", candidate.display()))?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                candidate = suffixed(path, suffix);
                suffix += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("creating report {}", candidate.display()))
            }
        }
    }
}

fn suffixed(path: &Path, suffix: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub generated: NaiveDateTime,
}

/// Reports found in `dir`, newest first. A missing directory has none.
pub fn list_reports(dir: &Path) -> Result<Vec<ReportEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
    {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(captures) = REPORT_NAME.captures(&name) else {
            continue;
        };
        let Ok(generated) = NaiveDateTime::parse_from_str(&captures[1], "%Y%m%d_%H%M%S") else {
            continue;
        };
        let order: u32 = captures
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        entries.push((generated, order, entry.path()));
    }

    entries.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    Ok(entries
        .into_iter()
        .map(|(generated, _, path)| ReportEntry { path, generated })
        .collect())
}

/// Copies a report into `dest_dir` as `test_report_<stamp>.html`.
pub fn export_report(report: &Path, dest_dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    let contents =
        fs::read(report).with_context(|| format!("reading report {}", report.display()))?;
    let target = dest_dir.join(format!("test_report_{}.html", timestamp_slug(at)));
    write_new_file(&target, &contents)
}
