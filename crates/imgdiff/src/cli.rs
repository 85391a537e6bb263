use std::path::PathBuf;

use clap::Parser;

use crate::config;
use crate::config::CliOverrides;

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_threshold(v)
}

#[derive(Parser)]
#[command(
    name = "imgdiff",
    about = "Compare two image trees and report the pairs that differ (exit 0 = diffs found)"
)]
pub struct Cli {
    /// Baseline tree
    pub left: PathBuf,
    /// Candidate tree, mirrored path for path against LEFT
    pub right: PathBuf,
    /// HTML report to write [default: diff.html]
    pub report: Option<PathBuf>,
    /// Only report pairs scoring above this (0.0–1.0). Dimension changes are always reported.
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,
    /// Only compare files whose path relative to LEFT matches GLOB (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,
    /// Read settings from this TOML file instead of ./imgdiff.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl From<Cli> for CliOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            left: cli.left,
            right: cli.right,
            report: cli.report,
            threshold: cli.threshold,
            include: cli.include,
            config: cli.config,
        }
    }
}
