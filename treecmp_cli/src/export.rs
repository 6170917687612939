use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use treecmp_common::{
    Classification, ComparisonEntry, ComparisonReport, ComparisonSummary, EntryKind,
    TraversalWarning,
};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub run_id: String,
    pub root_a: &'a Path,
    pub root_b: &'a Path,
    pub algorithm: String,
    pub started_at: String,
    pub finished_at: String,
    pub summary: &'a ComparisonSummary,
    pub entries: Vec<&'a ComparisonEntry>,
    pub warnings: &'a [TraversalWarning],
}

pub fn build_json_report(report: &ComparisonReport, diff_only: bool) -> JsonReport<'_> {
    JsonReport {
        run_id: report.run_id().to_string(),
        root_a: report.root_a(),
        root_b: report.root_b(),
        algorithm: report.algorithm().to_string(),
        started_at: report.started_at().to_rfc3339(),
        finished_at: report.finished_at().to_rfc3339(),
        summary: report.summary(),
        entries: report
            .entries()
            .iter()
            .filter(|entry| !(diff_only && entry.classification == Classification::IdenticalFile))
            .collect(),
        warnings: report.warnings(),
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct CsvRow {
    path: String,
    status: &'static str,
    kind: &'static str,
    location: String,
    renamed_to: String,
    detail: String,
}

fn csv_row(report: &ComparisonReport, entry: &ComparisonEntry) -> CsvRow {
    let root_a = report.root_a().display().to_string();
    let root_b = report.root_b().display().to_string();
    let both = "Both folders".to_string();

    let (status, kind, location, renamed_to, detail) = match &entry.classification {
        Classification::IdenticalFile => ("Identical", EntryKind::File, both, String::new(), String::new()),
        Classification::DifferentFile => ("Different", EntryKind::File, both, String::new(), String::new()),
        Classification::Renamed { to } => ("Renamed", EntryKind::File, both, to.to_string(), String::new()),
        Classification::OnlyInA { kind } => ("Extra", *kind, root_a, String::new(), String::new()),
        Classification::OnlyInB { kind } => ("Extra", *kind, root_b, String::new(), String::new()),
        Classification::Unreadable { side, reason } => {
            ("Unreadable", EntryKind::File, format!("Side {}", side), String::new(), reason.clone())
        }
    };

    CsvRow {
        path: entry.path.to_string(),
        status,
        kind: match kind {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        },
        location,
        renamed_to,
        detail,
    }
}

/// Sibling file holding the summary table
pub fn summary_path(path: &Path) -> PathBuf {
    path.with_extension("summary.csv")
}

/// Write one row per entry to `path` and the category counts to its
/// `.summary.csv` sibling. Returns the summary path.
pub fn write_csv(report: &ComparisonReport, path: &Path) -> Result<PathBuf> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for entry in report.entries() {
        writer.serialize(csv_row(report, entry))?;
    }
    writer.flush()?;

    let summary = report.summary();
    let summary_file = summary_path(path);
    let mut writer = csv::Writer::from_path(&summary_file)
        .with_context(|| format!("Failed to create {}", summary_file.display()))?;
    writer.write_record(["Category", "Count"])?;

    let rows = [
        ("Total files checked".to_string(), summary.total_compared),
        ("Identical files".to_string(), summary.identical),
        ("Different files".to_string(), summary.different),
        ("Changed file names".to_string(), summary.renamed),
        (format!("Only in {}", report.root_a().display()), summary.only_in_a),
        (format!("Only in {}", report.root_b().display()), summary.only_in_b),
        ("Failed comparisons".to_string(), summary.unreadable),
    ];
    for (category, count) in rows {
        writer.write_record([category, count.to_string()])?;
    }
    writer.flush()?;

    Ok(summary_file)
}
