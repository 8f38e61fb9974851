//! Filesystem rule loader.
//!
//! Scans a rules directory for YAML documents, resolves `extends`
//! inheritance and compiles the active [`ThresholdCatalog`] and insight
//! config. Missing documents fall back to the built-in defaults. Rules are
//! read once at startup; the compiled outputs are immutable.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::insight_config::CompiledInsightConfig;
use crate::schema::{RuleDocument, RuleEnvelope, RuleKind};
use crate::threshold_catalog::ThresholdCatalog;

// ── Deep-merge for `extends` inheritance ────────────────────────────

/// Maximum inheritance chain depth to prevent infinite loops.
const MAX_EXTENDS_DEPTH: usize = 5;

/// Deep-merge two YAML `Value` maps: child fields win, arrays replace entirely.
///
/// For map values: recursively merge. For all other types (scalars, arrays):
/// child value replaces parent.
pub fn deep_merge(parent: &serde_yaml::Value, child: &serde_yaml::Value) -> serde_yaml::Value {
    match (parent, child) {
        (serde_yaml::Value::Mapping(pm), serde_yaml::Value::Mapping(cm)) => {
            let mut merged = pm.clone();
            for (key, child_val) in cm {
                if let Some(parent_val) = pm.get(key) {
                    merged.insert(key.clone(), deep_merge(parent_val, child_val));
                } else {
                    merged.insert(key.clone(), child_val.clone());
                }
            }
            serde_yaml::Value::Mapping(merged)
        }
        (_, child) => child.clone(),
    }
}

/// Resolve `extends` chains: for each rule with an `extends` field,
/// find the parent and deep-merge the YAML values.
///
/// The merged document keeps the child's own `metadata` block; only the
/// remaining sections are inherited.
pub fn resolve_extends(
    raw_values: &HashMap<String, serde_yaml::Value>,
) -> std::result::Result<HashMap<String, serde_yaml::Value>, String> {
    let mut resolved: HashMap<String, serde_yaml::Value> = HashMap::new();
    let mut in_progress: HashSet<String> = HashSet::new();

    for id in raw_values.keys() {
        resolve_single(id, raw_values, &mut resolved, &mut in_progress, 0)?;
    }

    Ok(resolved)
}

fn resolve_single(
    id: &str,
    raw_values: &HashMap<String, serde_yaml::Value>,
    resolved: &mut HashMap<String, serde_yaml::Value>,
    in_progress: &mut HashSet<String>,
    depth: usize,
) -> std::result::Result<serde_yaml::Value, String> {
    if let Some(val) = resolved.get(id) {
        return Ok(val.clone());
    }

    if in_progress.contains(id) {
        return Err(format!("circular extends chain detected for rule '{}'", id));
    }

    if depth > MAX_EXTENDS_DEPTH {
        return Err(format!(
            "extends chain exceeds maximum depth ({}) for rule '{}'",
            MAX_EXTENDS_DEPTH, id
        ));
    }

    let raw = raw_values
        .get(id)
        .ok_or_else(|| format!("rule '{}' not found for extends resolution", id))?
        .clone();

    let metadata = raw
        .as_mapping()
        .and_then(|m| m.get("metadata"))
        .cloned();

    let parent_id = metadata
        .as_ref()
        .and_then(|meta| meta.as_mapping())
        .and_then(|m| m.get("extends"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let result = if let Some(ref parent_id) = parent_id {
        in_progress.insert(id.to_string());
        let parent_val = resolve_single(parent_id, raw_values, resolved, in_progress, depth + 1)?;
        in_progress.remove(id);
        let mut merged = deep_merge(&parent_val, &raw);
        if let (Some(map), Some(meta)) = (merged.as_mapping_mut(), metadata) {
            map.insert(yaml_key("metadata"), meta);
        }
        merged
    } else {
        raw
    };

    resolved.insert(id.to_string(), result.clone());
    Ok(result)
}

fn yaml_key(key: &str) -> serde_yaml::Value {
    serde_yaml::Value::String(key.to_string())
}

// ── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during rule loading and compilation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Rule validation error (e.g. duplicate IDs, out-of-range values).
    #[error("Validation error: {0}")]
    Validation(String),

    /// `extends` chain could not be resolved.
    #[error("Extends error: {0}")]
    Extends(String),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

// ── Load result types ───────────────────────────────────────────────

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// Rule was successfully loaded.
    Loaded { rule_id: String, kind: RuleKind },
    /// File was skipped (dotfile, non-YAML, disabled, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

/// Compiled rules ready for analysis.
#[derive(Debug)]
pub struct LoadedRules {
    pub catalog: ThresholdCatalog,
    pub insight: CompiledInsightConfig,
    /// Per-file outcomes, in path order.
    pub results: Vec<LoadResult>,
}

impl LoadedRules {
    /// Built-in catalog and insight config, no files involved.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            catalog: ThresholdCatalog::builtin()?,
            insight: CompiledInsightConfig::builtin()?,
            results: Vec::new(),
        })
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
            .count()
    }
}

// ── Rule loader ─────────────────────────────────────────────────────

/// Filesystem-backed rule loader.
///
/// Scans a directory for `*.yml` / `*.yaml` files. Per-file parse errors are
/// reported in [`LoadResult`]s and do not abort the scan; ambiguity about
/// which catalog is active does.
pub struct RuleLoader {
    rules_dir: PathBuf,
}

struct RawRule {
    path: PathBuf,
    kind: RuleKind,
    value: serde_yaml::Value,
}

impl RuleLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Scan the rules directory and compile the active rules.
    ///
    /// A missing directory is not an error: the built-in rules are used.
    pub fn load_all(&self) -> Result<LoadedRules> {
        if !self.rules_dir.exists() {
            warn!(path = %self.rules_dir.display(), "rules directory not found, using built-in rules");
            return LoadedRules::builtin();
        }

        let mut results = Vec::new();
        let mut order: Vec<String> = Vec::new();
        let mut raw: HashMap<String, RawRule> = HashMap::new();

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.rules_dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| !p.is_dir())
            .collect();
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    results.push(skipped(path, "dotfile"));
                    continue;
                }
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);
            if !is_yaml {
                results.push(skipped(path, "not a YAML file"));
                continue;
            }

            match Self::read_raw(&path) {
                Ok((id, _)) if raw.contains_key(&id) => {
                    warn!(rule_id = %id, path = %path.display(), "duplicate rule id");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: format!("duplicate rule id '{}'", id),
                        },
                    });
                }
                Ok((id, rule)) => {
                    order.push(id.clone());
                    raw.insert(id, rule);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let values: HashMap<String, serde_yaml::Value> = raw
            .iter()
            .map(|(id, r)| (id.clone(), r.value.clone()))
            .collect();
        let resolved = resolve_extends(&values).map_err(RuleError::Extends)?;

        let mut catalogs = Vec::new();
        let mut insights = Vec::new();

        for id in &order {
            let Some(rule) = raw.get(id) else { continue };
            let Some(value) = resolved.get(id) else { continue };
            let path = rule.path.clone();

            let doc = serde_yaml::to_string(value)
                .map_err(|e| e.to_string())
                .and_then(|yaml| RuleDocument::from_yaml_kind(rule.kind, &yaml));
            let doc = match doc {
                Ok(doc) => doc,
                Err(error) => {
                    warn!(rule_id = %id, path = %path.display(), error = %error, "invalid rule document");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed { error },
                    });
                    continue;
                }
            };

            if !doc.metadata().enabled {
                debug!(rule_id = %id, "rule disabled");
                results.push(skipped(path, "disabled"));
                continue;
            }

            info!(rule_id = %id, kind = %rule.kind, path = %path.display(), "loaded rule");
            results.push(LoadResult {
                path,
                status: LoadStatus::Loaded {
                    rule_id: id.clone(),
                    kind: rule.kind,
                },
            });
            match doc {
                RuleDocument::ThresholdCatalog(r) => catalogs.push(r),
                RuleDocument::InsightConfig(r) => insights.push(r),
            }
        }

        let catalog = match pick_active(catalogs, |r| r.metadata.id.as_str(), |r| r.metadata.extends.as_deref())? {
            Some(rule) => rule.compile()?,
            None => {
                info!("no threshold catalog in rules directory, using built-in");
                ThresholdCatalog::builtin()?
            }
        };
        let insight = match pick_active(insights, |r| r.metadata.id.as_str(), |r| r.metadata.extends.as_deref())? {
            Some(rule) => rule.compile()?,
            None => CompiledInsightConfig::builtin()?,
        };

        Ok(LoadedRules {
            catalog,
            insight,
            results,
        })
    }

    fn read_raw(path: &Path) -> Result<(String, RawRule)> {
        let content = fs::read_to_string(path)?;
        let envelope: RuleEnvelope = serde_yaml::from_str(&content)?;
        let kind = envelope.rule_kind().map_err(RuleError::Validation)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
        Ok((
            envelope.metadata.id,
            RawRule {
                path: path.to_path_buf(),
                kind,
                value,
            },
        ))
    }
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}

/// Pick the single enabled document of a kind that no other enabled
/// document extends. More than one such leaf is ambiguous.
fn pick_active<T>(
    rules: Vec<T>,
    id_of: impl Fn(&T) -> &str,
    parent_of: impl Fn(&T) -> Option<&str>,
) -> Result<Option<T>> {
    let parents: HashSet<String> = rules
        .iter()
        .filter_map(|r| parent_of(r).map(str::to_string))
        .collect();
    let mut leaves: Vec<T> = rules
        .into_iter()
        .filter(|r| !parents.contains(id_of(r)))
        .collect();
    match leaves.len() {
        0 => Ok(None),
        1 => Ok(leaves.pop()),
        _ => {
            let ids: Vec<&str> = leaves.iter().map(|r| id_of(r)).collect();
            Err(RuleError::Validation(format!(
                "multiple active rules of the same kind: {}",
                ids.join(", ")
            )))
        }
    }
}
