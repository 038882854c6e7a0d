use std::collections::BTreeSet;

use privsync::spec::graph::{
    resolve_members, resolve_personal_schemas, resolve_schema_owners, resolve_schema_writers,
    resolve_superusers, SpecGraph,
};

mod support;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn members_include_transitive_members() {
    let spec = support::spec(
        r#"
engineering:
backend:
  member_of: [engineering]
alice:
  member_of: [backend]
bob:
  member_of: [engineering]
"#,
    );

    assert_eq!(
        resolve_members("engineering", &spec),
        set(&["alice", "backend", "bob"])
    );
    assert_eq!(resolve_members("backend", &spec), set(&["alice"]));
    assert!(resolve_members("alice", &spec).is_empty());
}

#[test]
fn membership_cycle_terminates_and_includes_the_group_itself() {
    let spec = support::spec(
        r#"
a:
  member_of: [b]
b:
  member_of: [a]
"#,
    );

    assert_eq!(resolve_members("a", &spec), set(&["a", "b"]));
    assert_eq!(resolve_members("b", &spec), set(&["a", "b"]));
}

#[test]
fn unknown_group_has_no_members() {
    let spec = support::spec("alice:\n");
    assert!(resolve_members("nobody", &spec).is_empty());
}

#[test]
fn personal_schemas_are_owned_by_their_role() {
    let spec = support::spec(
        r#"
alice:
  has_personal_schema: yes
bob:
  has_personal_schema: "false"
svc:
  owns:
    schemas: [finance, '"Reports"']
"#,
    );

    assert_eq!(resolve_personal_schemas(&spec), set(&["alice"]));

    let owners = resolve_schema_owners(&spec);
    assert_eq!(owners.get("alice").map(String::as_str), Some("alice"));
    assert_eq!(owners.get("finance").map(String::as_str), Some("svc"));
    assert_eq!(owners.get("Reports").map(String::as_str), Some("svc"));
    assert!(!owners.contains_key("bob"));
}

#[test]
fn superusers_write_every_known_schema() {
    let spec = support::spec(
        r#"
admin:
  is_superuser: true
svc:
  owns:
    schemas: [finance, hr]
alice:
  has_personal_schema: true
"#,
    );

    assert_eq!(resolve_superusers(&spec), set(&["admin"]));

    let writers = resolve_schema_writers(&spec);
    assert_eq!(writers.len(), 3);
    for schema_writers in writers.values() {
        assert!(schema_writers.contains("admin"), "{schema_writers:?}");
    }
    assert_eq!(writers["finance"], set(&["admin", "svc"]));
    assert_eq!(writers["alice"], set(&["admin", "alice"]));
}

#[test]
fn schema_write_grants_writer_status_to_transitive_members() {
    let spec = support::spec(
        r#"
svc:
  owns:
    schemas: [finance]
writers:
  privileges:
    schemas:
      write: [finance]
etl:
  member_of: [writers]
etl_job:
  member_of: [etl]
"#,
    );

    let writers = resolve_schema_writers(&spec);
    assert_eq!(
        writers["finance"],
        set(&["etl", "etl_job", "svc", "writers"])
    );
}

#[test]
fn personal_schemas_write_expands_to_every_personal_schema() {
    let spec = support::spec(
        r#"
dba_team:
  privileges:
    schemas:
      write: [personal_schemas]
carol:
  member_of: [dba_team]
alice:
  has_personal_schema: true
bob:
  has_personal_schema: true
"#,
    );

    let writers = resolve_schema_writers(&spec);
    assert_eq!(writers["alice"], set(&["alice", "carol", "dba_team"]));
    assert_eq!(writers["bob"], set(&["bob", "carol", "dba_team"]));
    assert!(!writers.contains_key("personal_schemas"));
}

#[test]
fn writable_schema_without_owner_gets_its_own_entry() {
    let spec = support::spec(
        r#"
root:
  is_superuser: true
loader:
  privileges:
    schemas:
      write: [staging]
"#,
    );

    let writers = resolve_schema_writers(&spec);
    assert_eq!(writers["staging"], set(&["loader", "root"]));
}

#[test]
fn undeclared_schema_falls_back_to_superusers() {
    let spec = support::spec(
        r#"
root:
  is_superuser: true
svc:
  owns:
    schemas: [finance]
"#,
    );

    let graph = SpecGraph::build(&spec);
    assert_eq!(graph.schema_writers.get("finance"), &set(&["root", "svc"]));
    assert_eq!(graph.schema_writers.get("scratch"), &set(&["root"]));
}
