#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use privsync::analyzer::analyze_privileges;
use privsync::catalog::CatalogSnapshot;
use privsync::spec::model::Spec;
use privsync::spec::{load_spec_file, load_spec_str};
use privsync::Statement;

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn load_fixture_spec(fixture: &str) -> Spec {
    load_spec_file(&fixture_dir(fixture).join("spec.yml")).expect("fixture spec should parse")
}

pub(crate) fn load_fixture_snapshot(fixture: &str) -> CatalogSnapshot {
    CatalogSnapshot::from_json_file(&fixture_dir(fixture).join("snapshot.json"))
        .expect("fixture snapshot should parse")
}

pub(crate) fn spec(yaml: &str) -> Spec {
    load_spec_str(yaml).expect("inline spec should parse")
}

pub(crate) fn plan(spec: &Spec, snapshot: &CatalogSnapshot) -> Vec<Statement> {
    analyze_privileges(spec, snapshot).expect("analysis should succeed")
}

/// Rendered statements, one entry per statement.
pub(crate) fn rendered(statements: &[Statement]) -> Vec<String> {
    statements.iter().map(ToString::to_string).collect()
}

pub(crate) fn changes(statements: &[Statement]) -> Vec<&Statement> {
    statements.iter().filter(|s| s.is_change()).collect()
}

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    std::fs::create_dir_all(&dir).expect("should create temp dir");
    dir
}
