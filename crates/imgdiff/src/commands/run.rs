use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::compare::{Aggregator, ImageDecoder, PairScorer, ScanSummary};
use crate::config::ResolvedRunConfig;
use crate::report::{self, html, terminal};
use crate::walk;

/// Walk the left tree and score every file against its right-tree counterpart.
pub async fn scan(config: &ResolvedRunConfig) -> Result<ScanSummary> {
    let root = config.left.clone();
    let include = config.include.clone();
    let paths = tokio::task::spawn_blocking(move || walk::files(&root, &include))
        .await
        .context("Tree walk task failed")?;
    debug!(files = paths.len(), root = %config.left.display(), "walked left tree");

    let scorer = PairScorer::new(
        config.left.clone(),
        config.right.clone(),
        Box::new(ImageDecoder),
    );
    Ok(Aggregator::new(scorer, config.threshold).run(paths).await)
}

/// `imgdiff LEFT RIGHT [REPORT]`: scan, rank, then report.
/// Returns exit code: 0 = differences found and report written, 1 = none found.
pub async fn run(config: ResolvedRunConfig) -> Result<i32> {
    for root in [&config.left, &config.right] {
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }
    }

    let start = Instant::now();
    let mut summary = scan(&config).await?;
    report::rank(&mut summary.records);

    for record in &summary.records {
        terminal::print_diff_line(record, &config.left);
    }
    terminal::print_summary(&summary, &config.left, &config.right, start.elapsed());

    if summary.records.is_empty() {
        return Ok(1);
    }

    html::write(&config.report, &summary.records, &config.left, &config.right)?;
    terminal::print_report_written(summary.records.len(), &config.report);
    Ok(0)
}
