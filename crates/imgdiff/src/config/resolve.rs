use std::path::PathBuf;

use anyhow::{Context, Result};
use glob::Pattern;

use super::{Config, DEFAULT_REPORT, compile_patterns, load, validate_threshold};
use crate::walk;

/// Values extracted from the CLI that participate in the merge.
pub struct CliOverrides {
    pub left: PathBuf,
    pub right: PathBuf,
    pub report: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub include: Vec<String>,
    pub config: Option<PathBuf>,
}

/// `IMGDIFF_*` environment layer.
#[derive(Default)]
pub struct EnvOverrides {
    pub threshold: Option<f64>,
    pub report: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let threshold = std::env::var("IMGDIFF_THRESHOLD")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("IMGDIFF_THRESHOLD must be a valid float")?;
        let report = std::env::var_os("IMGDIFF_REPORT").map(PathBuf::from);
        Ok(Self { threshold, report })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
pub struct ResolvedRunConfig {
    /// Baseline tree root, lexically cleaned.
    pub left: PathBuf,
    /// Candidate tree root, lexically cleaned.
    pub right: PathBuf,
    pub report: PathBuf,
    pub threshold: f64,
    pub include: Vec<Pattern>,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file = load(cli.config.as_deref())?;
        let env = EnvOverrides::from_env()?;
        Self::merge(cli, env, file)
    }

    pub fn merge(cli: CliOverrides, env: EnvOverrides, file: Config) -> Result<Self> {
        let threshold = cli
            .threshold
            .or(env.threshold)
            .unwrap_or(file.diff.threshold);
        validate_threshold(threshold).map_err(|e| anyhow::anyhow!("{e}"))?;

        let report = cli
            .report
            .or(env.report)
            .or(file.report.output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT));

        let include = if cli.include.is_empty() {
            file.scan.include
        } else {
            cli.include
        };
        let include = compile_patterns(&include)?;

        Ok(Self {
            left: walk::clean(&cli.left),
            right: walk::clean(&cli.right),
            report,
            threshold,
            include,
        })
    }
}
