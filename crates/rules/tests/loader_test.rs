//! Integration tests for loading rule documents from a directory.

use std::fs;

use tempfile::TempDir;

use ckpi_rules::{LoadStatus, RuleError, RuleKind, RuleLoader, ThresholdPair};

const BASE_CATALOG: &str = r#"
apiVersion: v1
kind: ThresholdCatalog
metadata:
  id: base
  name: Base catalog
spec:
  kpis:
    doorfriction: { low: 30.0, high: 50.0 }
    lockHookTime: { low: 0.3 }
"#;

const SITE_CATALOG: &str = r#"
apiVersion: v1
kind: ThresholdCatalog
metadata:
  id: site-a
  name: Site A overrides
  extends: base
spec:
  kpis:
    doorfriction: { high: 45.0 }
    motorTemperature: { high: 80.0 }
"#;

const STRICT_INSIGHT: &str = r#"
apiVersion: v1
kind: InsightConfig
metadata:
  id: strict
  name: Strict insight
spec:
  volatility_ratio: 0.1
"#;

fn temp_loader() -> (TempDir, RuleLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleLoader::new(dir.path());
    (dir, loader)
}

#[test]
fn shipped_rules_directory_loads() {
    let rules_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/rules");
    let loaded = RuleLoader::new(rules_dir).load_all().unwrap();
    assert_eq!(loaded.failed_count(), 0);
    assert_eq!(loaded.catalog.len(), 6);
    assert_eq!(loaded.insight.volatility_ratio, 0.2);
}

#[test]
fn missing_directory_falls_back_to_builtin() {
    let (dir, _) = temp_loader();
    let loader = RuleLoader::new(dir.path().join("does-not-exist"));
    let loaded = loader.load_all().unwrap();
    assert_eq!(loaded.catalog.id(), "thresholds-default");
    assert!(loaded.results.is_empty());
}

#[test]
fn empty_directory_uses_builtin_rules() {
    let (_dir, loader) = temp_loader();
    let loaded = loader.load_all().unwrap();
    assert_eq!(loaded.catalog.lookup("DOORFRICTION"), ThresholdPair::new(Some(30.0), Some(50.0)));
}

#[test]
fn skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("base.yml"), BASE_CATALOG).unwrap();
    fs::write(dir.path().join(".hidden.yml"), BASE_CATALOG).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let loaded = loader.load_all().unwrap();
    let skipped = loaded
        .results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!(skipped, 2);
    assert_eq!(loaded.catalog.id(), "base");
}

#[test]
fn extends_merges_per_kpi_and_per_bound() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("base.yml"), BASE_CATALOG).unwrap();
    fs::write(dir.path().join("site-a.yaml"), SITE_CATALOG).unwrap();

    let loaded = loader.load_all().unwrap();
    let catalog = &loaded.catalog;
    assert_eq!(catalog.id(), "site-a");
    assert_eq!(catalog.lookup("doorfriction"), ThresholdPair::new(Some(30.0), Some(45.0)));
    assert_eq!(catalog.lookup("lockhooktime"), ThresholdPair::new(Some(0.3), None));
    assert_eq!(catalog.lookup("motorTemperature"), ThresholdPair::new(None, Some(80.0)));

    let loaded_kinds: Vec<RuleKind> = loaded
        .results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(loaded_kinds, vec![RuleKind::ThresholdCatalog, RuleKind::ThresholdCatalog]);
}

#[test]
fn insight_config_overrides_builtin() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("insight.yml"), STRICT_INSIGHT).unwrap();
    let loaded = loader.load_all().unwrap();
    assert_eq!(loaded.insight.volatility_ratio, 0.1);
    assert_eq!(loaded.catalog.id(), "thresholds-default");
}

#[test]
fn broken_file_is_reported_not_fatal() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("base.yml"), BASE_CATALOG).unwrap();
    fs::write(dir.path().join("broken.yml"), "kind: [unclosed").unwrap();

    let loaded = loader.load_all().unwrap();
    assert_eq!(loaded.failed_count(), 1);
    assert_eq!(loaded.catalog.id(), "base");
}

#[test]
fn disabled_catalog_is_ignored() {
    let (dir, loader) = temp_loader();
    let disabled = BASE_CATALOG.replace("name: Base catalog", "name: Base catalog\n  enabled: false");
    fs::write(dir.path().join("base.yml"), disabled).unwrap();

    let loaded = loader.load_all().unwrap();
    assert_eq!(loaded.catalog.id(), "thresholds-default");
}

#[test]
fn two_independent_catalogs_are_ambiguous() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("base.yml"), BASE_CATALOG).unwrap();
    fs::write(
        dir.path().join("other.yml"),
        BASE_CATALOG.replace("id: base", "id: other"),
    )
    .unwrap();

    let err = loader.load_all().unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
}

#[test]
fn extends_cycle_is_an_error() {
    let (dir, loader) = temp_loader();
    let a = BASE_CATALOG.replace("name: Base catalog", "name: A\n  extends: other");
    let b = BASE_CATALOG
        .replace("id: base", "id: other")
        .replace("name: Base catalog", "name: B\n  extends: base");
    fs::write(dir.path().join("a.yml"), a).unwrap();
    fs::write(dir.path().join("b.yml"), b).unwrap();

    assert!(matches!(loader.load_all(), Err(RuleError::Extends(_))));
}
