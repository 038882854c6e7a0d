use std::path::Path;

use tracing::debug;

use super::model::Spec;
use crate::error::{Error, Result};

/// Parse a spec YAML document. An empty or null document is an empty spec.
pub fn load_spec_str(yaml: &str) -> Result<Spec> {
    if yaml.trim().is_empty() {
        return Ok(Spec::default());
    }
    let spec = serde_yaml::from_str::<Option<Spec>>(yaml)?.unwrap_or_default();
    debug!(roles = spec.len(), "parsed spec");
    Ok(spec)
}

/// Read and parse a spec YAML file.
pub fn load_spec_file(path: &Path) -> Result<Spec> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    load_spec_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Access, ObjectKind};

    #[test]
    fn null_role_entries_become_default_configs() {
        let spec = load_spec_str(
            "
analyst:
svc_etl:
  has_personal_schema: yes
",
        )
        .expect("spec should parse");

        let names: Vec<&str> = spec.role_names().collect();
        assert_eq!(names, vec!["analyst", "svc_etl"]);
        assert_eq!(spec.get("analyst"), Some(&Default::default()));
        assert!(spec
            .get("svc_etl")
            .is_some_and(|config| config.has_personal_schema.get()));
    }

    #[test]
    fn privileges_are_keyed_by_kind_and_access() {
        let spec = load_spec_str(
            "
analyst:
  member_of: [readers]
  privileges:
    tables:
      read: [finance.ledger]
      write: [finance.*]
",
        )
        .expect("spec should parse");

        let config = spec.get("analyst").expect("analyst should be declared");
        assert_eq!(config.member_of, vec!["readers".to_string()]);
        assert_eq!(
            config.desired_items(ObjectKind::Tables, Access::Read),
            vec!["finance.ledger".to_string(), "finance.*".to_string()]
        );
        assert_eq!(
            config.desired_items(ObjectKind::Tables, Access::Write),
            vec!["finance.*".to_string()]
        );
        assert!(config.targets(ObjectKind::Schemas, Access::Read).is_empty());
    }

    #[test]
    fn bool_like_values_accept_common_spellings() {
        let spec = load_spec_str(
            "
a: {is_superuser: 'True'}
b: {is_superuser: 'off'}
c: {is_superuser: 1}
d: {is_superuser: false}
",
        )
        .expect("spec should parse");

        let flags: Vec<bool> = spec
            .iter()
            .map(|(_, config)| config.is_superuser.get())
            .collect();
        assert_eq!(flags, vec![true, false, true, false]);
    }

    #[test]
    fn unknown_privilege_kinds_and_levels_are_rejected() {
        let err = load_spec_str("analyst: {privileges: {views: {read: [a.b]}}}")
            .expect_err("unknown kind should fail");
        assert!(matches!(err, Error::SpecParse(_)));

        let err = load_spec_str("analyst: {privileges: {tables: {admin: [a.b]}}}")
            .expect_err("unknown access level should fail");
        assert!(matches!(err, Error::SpecParse(_)));

        let err = load_spec_str("analyst: {is_superuser: maybe}")
            .expect_err("non-boolean flag should fail");
        assert!(matches!(err, Error::SpecParse(_)));
    }

    #[test]
    fn empty_document_is_an_empty_spec() {
        assert!(load_spec_str("  \n").expect("empty spec").is_empty());
        assert!(load_spec_str("# no roles yet\n").expect("null spec").is_empty());
    }
}
