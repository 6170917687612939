use std::io::{self, Write};
use treecmp_common::{Classification, ComparisonEntry, ComparisonReport, EntryKind};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

pub struct RenderOptions {
    pub use_color: bool,
    pub diff_only: bool,
}

fn marker(classification: &Classification) -> (&'static str, &'static str) {
    match classification {
        Classification::IdenticalFile => ("==", GREEN),
        Classification::DifferentFile => ("!=", RED),
        Classification::Renamed { .. } => ("->", MAGENTA),
        Classification::OnlyInA { .. } => ("<<", YELLOW),
        Classification::OnlyInB { .. } => (">>", BLUE),
        Classification::Unreadable { .. } => ("??", CYAN),
    }
}

fn describe(entry: &ComparisonEntry) -> String {
    match &entry.classification {
        Classification::Renamed { to } => format!("{} -> {}", entry.path, to),
        Classification::OnlyInA { kind: EntryKind::Folder }
        | Classification::OnlyInB { kind: EntryKind::Folder } => format!("{}/", entry.path),
        Classification::Unreadable { side, reason } => {
            format!("{} (side {}: {})", entry.path, side, reason)
        }
        _ => entry.path.to_string(),
    }
}

/// Write the per-entry listing followed by summary counts
pub fn render_report<W: Write>(
    out: &mut W,
    report: &ComparisonReport,
    options: &RenderOptions,
) -> io::Result<()> {
    let paint = |color: &'static str| if options.use_color { color } else { "" };
    let reset = paint(RESET);

    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "Comparison Results")?;
    writeln!(out, "  A: {}", report.root_a().display())?;
    writeln!(out, "  B: {}", report.root_b().display())?;
    writeln!(out, "{}", "=".repeat(80))?;

    for entry in report.entries() {
        if options.diff_only && entry.classification == Classification::IdenticalFile {
            continue;
        }
        let (symbol, color) = marker(&entry.classification);
        writeln!(out, "{}  {}  {} {}", paint(color), symbol, reset, describe(entry))?;
    }

    if !report.warnings().is_empty() {
        writeln!(out, "\nSkipped subtrees:")?;
        for warning in report.warnings() {
            writeln!(out, "  [{}] {}: {}", warning.side, warning.path, warning.message)?;
        }
    }

    let summary = report.summary();
    let mark = |symbol: &str, color: &'static str| format!("{}({}){}", paint(color), symbol, reset);

    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "Summary ({}):", report.algorithm())?;
    writeln!(out, "  Files checked:   {}", summary.total_compared)?;
    writeln!(out, "  Identical:       {} {}", summary.identical, mark("==", GREEN))?;
    writeln!(out, "  Different:       {} {}", summary.different, mark("!=", RED))?;
    writeln!(out, "  Renamed:         {} {}", summary.renamed, mark("->", MAGENTA))?;
    writeln!(
        out,
        "  Only in A:       {} {} ({} files, {} folders)",
        summary.only_in_a,
        mark("<<", YELLOW),
        summary.only_in_a_files,
        summary.only_in_a_folders
    )?;
    writeln!(
        out,
        "  Only in B:       {} {} ({} files, {} folders)",
        summary.only_in_b,
        mark(">>", BLUE),
        summary.only_in_b_files,
        summary.only_in_b_folders
    )?;
    writeln!(out, "  Unreadable:      {} {}", summary.unreadable, mark("??", CYAN))?;
    writeln!(out, "{}", "=".repeat(80))?;

    Ok(())
}
