pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::Deserialize;

pub use self::resolve::{CliOverrides, EnvOverrides, ResolvedRunConfig};

/// Picked up from the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "imgdiff.toml";
pub const DEFAULT_REPORT: &str = "diff.html";

#[derive(Debug, Default, Deserialize)]
pub struct ScanConfig {
    /// Glob patterns matched against paths relative to the left root.
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiffConfig {
    /// Pairs with score <= threshold are not reported.
    #[serde(default)]
    pub threshold: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

pub fn validate_threshold(v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("threshold must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid include pattern '{p}'")))
        .collect()
}

/// Parse and validate config text. `origin` is only used in messages.
pub fn parse(content: &str, origin: &Path) -> Result<Config> {
    let config: Config =
        toml::from_str(content).with_context(|| format!("Failed to parse {}", origin.display()))?;
    validate_threshold(config.diff.threshold).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
    compile_patterns(&config.scan.include)
        .with_context(|| format!("Invalid scan.include in {}", origin.display()))?;
    Ok(config)
}

/// Load `explicit` if given (it must exist), else `imgdiff.toml` if present,
/// else defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => {
            if !p.is_file() {
                bail!("Config file {} does not exist", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = PathBuf::from(CONFIG_FILE);
            if !p.is_file() {
                return Ok(Config::default());
            }
            p
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content, &path)
}
