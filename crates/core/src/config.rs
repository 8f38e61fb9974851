use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CkpiError, Result};

/// Lower bound of the accepted sensitivity range.
pub const MIN_SENSITIVITY: f64 = 0.5;
/// Upper bound of the accepted sensitivity range.
pub const MAX_SENSITIVITY: f64 = 3.0;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_f64(profile: &str, key: &str) -> Option<f64> {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok())
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub analysis: AnalysisConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CKPI_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CKPI_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            analysis: AnalysisConfig::from_env_profiled(p),
            paths: PathsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  analysis:    sensitivity={}, volatility_ratio={}, parallel={}",
            display_opt(self.analysis.sensitivity),
            display_opt(self.analysis.volatility_ratio),
            self.analysis.parallel
        );
        tracing::info!(
            "  paths:       rules_dir={}, report_dir={}",
            self.paths.rules_dir.display(),
            self.paths.report_dir.display()
        );
    }
}

fn display_opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "(rules)".to_string())
}

// ── Analysis ──────────────────────────────────────────────────

/// Environment overrides for the analysis knobs.
///
/// `None` means the value comes from the loaded `InsightConfig` rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Multiplier on the standard deviation for the statistical bounds.
    pub sensitivity: Option<f64>,
    /// Fraction of rows that must be extrema before a group is actionable.
    pub volatility_ratio: Option<f64>,
    /// Run per-group detection on the rayon pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sensitivity: None,
            volatility_ratio: None,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            sensitivity: profiled_env_f64(p, "CKPI_SENSITIVITY"),
            volatility_ratio: profiled_env_f64(p, "CKPI_VOLATILITY_RATIO"),
            parallel: profiled_env_bool(p, "CKPI_PARALLEL", true),
        }
    }

    /// Effective sensitivity, falling back to `default`.
    pub fn sensitivity_or(&self, default: f64) -> f64 {
        self.sensitivity.unwrap_or(default)
    }

    /// Effective volatility ratio, falling back to `default`.
    pub fn volatility_ratio_or(&self, default: f64) -> f64 {
        self.volatility_ratio.unwrap_or(default)
    }

    /// Check any overrides are usable before a run.
    pub fn validate(&self) -> Result<()> {
        if let Some(s) = self.sensitivity {
            validate_sensitivity(s)?;
        }
        if let Some(r) = self.volatility_ratio {
            validate_volatility_ratio(r)?;
        }
        Ok(())
    }
}

/// Sensitivity must be finite and within [`MIN_SENSITIVITY`, `MAX_SENSITIVITY`].
pub fn validate_sensitivity(sensitivity: f64) -> Result<()> {
    if !sensitivity.is_finite() || !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&sensitivity) {
        return Err(CkpiError::InvalidConfig(format!(
            "sensitivity must be between {} and {}, got {}",
            MIN_SENSITIVITY, MAX_SENSITIVITY, sensitivity
        )));
    }
    Ok(())
}

/// Volatility ratio must be finite and non-negative.
pub fn validate_volatility_ratio(ratio: f64) -> Result<()> {
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(CkpiError::InvalidConfig(format!(
            "volatility ratio must be a non-negative number, got {}",
            ratio
        )));
    }
    Ok(())
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for rule YAML documents.
    pub rules_dir: PathBuf,
    /// Default directory for exported reports.
    pub report_dir: PathBuf,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "CKPI_RULES_DIR", "data/rules")),
            report_dir: PathBuf::from(profiled_env_or(p, "CKPI_REPORT_DIR", "reports")),
        }
    }
}
