use std::path::Path;
use std::time::Duration;

use super::describe_score;
use crate::compare::{DiffRecord, ScanSummary};

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print one reported pair, named relative to the left root.
pub fn print_diff_line(record: &DiffRecord, left_root: &Path) {
    let name = record
        .left
        .strip_prefix(left_root)
        .unwrap_or(record.left.as_path());
    println!(
        "  \x1b[31mDIFF\x1b[0m  {}  ({})",
        name.display(),
        describe_score(record)
    );
}

/// Print the scan totals.
pub fn print_summary(summary: &ScanSummary, left_root: &Path, right_root: &Path, elapsed: Duration) {
    let pairs = summary.scanned.saturating_sub(summary.missing);
    println!();
    println!("Files:      {} in {}", summary.scanned, left_root.display());
    println!("Pairs:      {pairs} in {}", right_root.display());
    print!(
        "Results:    \x1b[32m{} identical\x1b[0m, \x1b[31m{} differ\x1b[0m",
        summary.identical(),
        summary.records.len()
    );
    if summary.missing > 0 {
        print!(", \x1b[33m{} unpaired\x1b[0m", summary.missing);
    }
    if summary.undecodable_right > 0 {
        print!(", \x1b[31m{} undecodable\x1b[0m", summary.undecodable_right);
    }
    println!();
    println!("Time:       {}", format_duration(elapsed));
    println!();
    println!("{} files are identical.", summary.identical());
}

pub fn print_report_written(diffs: usize, path: &Path) {
    println!("{diffs} diffs written to {}", path.display());
}
