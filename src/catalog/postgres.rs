//! Build a [`CatalogSnapshot`] from a live PostgreSQL database.
//!
//! All catalog reads happen up front; analysis never touches the connection.
//! Privileges an owner holds on its own objects are implicit and are not
//! reported as grants, and `PUBLIC` grants are ignored. Procedures are not
//! managed: `GRANT ... ON FUNCTION` rejects them.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use tracing::{debug, info};

use super::names::qualified_name;
use super::{CatalogSnapshot, ObjectKind};
use crate::error::{Error, Result};

const USER_SCHEMAS: &str = "n.nspname NOT LIKE 'pg\\_%' AND n.nspname <> 'information_schema'";

#[derive(QueryableByName)]
struct SuperuserRow {
    #[diesel(sql_type = Text)]
    rolname: String,
}

#[derive(QueryableByName)]
struct ObjectRow {
    #[diesel(sql_type = Text)]
    kind: String,
    #[diesel(sql_type = Text)]
    schema: String,
    #[diesel(sql_type = Nullable<Text>)]
    name: Option<String>,
    #[diesel(sql_type = Text)]
    owner: String,
}

#[derive(QueryableByName)]
struct GrantRow {
    #[diesel(sql_type = Text)]
    kind: String,
    #[diesel(sql_type = Text)]
    schema: String,
    #[diesel(sql_type = Nullable<Text>)]
    name: Option<String>,
    #[diesel(sql_type = Text)]
    grantee: String,
    #[diesel(sql_type = Text)]
    privilege: String,
}

#[derive(QueryableByName)]
struct DefaultGrantRow {
    #[diesel(sql_type = Text)]
    kind: String,
    #[diesel(sql_type = Text)]
    grantor: String,
    #[diesel(sql_type = Text)]
    schema: String,
    #[diesel(sql_type = Text)]
    grantee: String,
    #[diesel(sql_type = Text)]
    privilege: String,
}

fn superusers_query() -> String {
    "SELECT rolname::text AS rolname FROM pg_catalog.pg_roles WHERE rolsuper".to_string()
}

fn objects_query() -> String {
    format!(
        "
SELECT 'schemas'::text AS kind, n.nspname::text AS schema, NULL::text AS name,
       pg_get_userbyid(n.nspowner)::text AS owner
FROM pg_catalog.pg_namespace n
WHERE {USER_SCHEMAS}
UNION ALL
SELECT CASE WHEN c.relkind = 'S' THEN 'sequences' ELSE 'tables' END, n.nspname::text,
       c.relname::text, pg_get_userbyid(c.relowner)::text
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f', 'S') AND {USER_SCHEMAS}
UNION ALL
SELECT 'functions', n.nspname::text,
       (p.proname || '(' || pg_get_function_identity_arguments(p.oid) || ')')::text,
       pg_get_userbyid(p.proowner)::text
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
WHERE p.prokind <> 'p' AND {USER_SCHEMAS}
UNION ALL
SELECT 'types', n.nspname::text, t.typname::text, pg_get_userbyid(t.typowner)::text
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE t.typtype IN ('c', 'd', 'e', 'r')
  AND t.typelem = 0
  AND (t.typrelid = 0 OR EXISTS (
        SELECT 1 FROM pg_catalog.pg_class c WHERE c.oid = t.typrelid AND c.relkind = 'c'))
  AND {USER_SCHEMAS}
"
    )
}

fn grants_query() -> String {
    format!(
        "
SELECT 'schemas'::text AS kind, n.nspname::text AS schema, NULL::text AS name,
       r.rolname::text AS grantee, a.privilege_type::text AS privilege
FROM pg_catalog.pg_namespace n
CROSS JOIN LATERAL aclexplode(n.nspacl) a
JOIN pg_catalog.pg_roles r ON r.oid = a.grantee
WHERE a.grantee <> n.nspowner AND {USER_SCHEMAS}
UNION ALL
SELECT CASE WHEN c.relkind = 'S' THEN 'sequences' ELSE 'tables' END, n.nspname::text,
       c.relname::text, r.rolname::text, a.privilege_type::text
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL aclexplode(c.relacl) a
JOIN pg_catalog.pg_roles r ON r.oid = a.grantee
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f', 'S') AND a.grantee <> c.relowner AND {USER_SCHEMAS}
UNION ALL
SELECT 'functions', n.nspname::text,
       (p.proname || '(' || pg_get_function_identity_arguments(p.oid) || ')')::text,
       r.rolname::text, a.privilege_type::text
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
CROSS JOIN LATERAL aclexplode(p.proacl) a
JOIN pg_catalog.pg_roles r ON r.oid = a.grantee
WHERE p.prokind <> 'p' AND a.grantee <> p.proowner AND {USER_SCHEMAS}
UNION ALL
SELECT 'types', n.nspname::text, t.typname::text, r.rolname::text, a.privilege_type::text
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
CROSS JOIN LATERAL aclexplode(t.typacl) a
JOIN pg_catalog.pg_roles r ON r.oid = a.grantee
WHERE t.typtype IN ('c', 'd', 'e', 'r') AND t.typelem = 0
  AND a.grantee <> t.typowner AND {USER_SCHEMAS}
"
    )
}

fn default_grants_query() -> String {
    "
SELECT CASE d.defaclobjtype
         WHEN 'r' THEN 'tables'
         WHEN 'S' THEN 'sequences'
         WHEN 'f' THEN 'functions'
         ELSE 'types'
       END AS kind,
       pg_get_userbyid(d.defaclrole)::text AS grantor,
       n.nspname::text AS schema,
       r.rolname::text AS grantee,
       a.privilege_type::text AS privilege
FROM pg_catalog.pg_default_acl d
JOIN pg_catalog.pg_namespace n ON n.oid = d.defaclnamespace
CROSS JOIN LATERAL aclexplode(d.defaclacl) a
JOIN pg_catalog.pg_roles r ON r.oid = a.grantee
WHERE d.defaclobjtype IN ('r', 'S', 'f', 'T')
"
    .to_string()
}

fn load<Row>(conn: &mut PgConnection, sql: &str, what: &str) -> Result<Vec<Row>>
where
    Row: QueryableByName<diesel::pg::Pg> + 'static,
{
    diesel::sql_query(sql)
        .load::<Row>(conn)
        .map_err(|e| Error::Database(format!("failed to read {what}: {e}")))
}

fn parse_kind(kind: &str) -> Result<ObjectKind> {
    kind.parse().map_err(Error::Database)
}

/// Open a connection to `database_url`.
pub fn connect(database_url: &str) -> Result<PgConnection> {
    PgConnection::establish(database_url)
        .map_err(|e| Error::Database(format!("failed to connect: {e}")))
}

/// Read superusers, object ownership, grants, and default grants into a snapshot.
pub fn load_snapshot(conn: &mut PgConnection) -> Result<CatalogSnapshot> {
    let mut snapshot = CatalogSnapshot::new();

    let superusers: Vec<SuperuserRow> = load(conn, &superusers_query(), "superusers")?;
    for row in &superusers {
        snapshot.add_superuser(row.rolname.clone());
    }

    let objects: Vec<ObjectRow> = load(conn, &objects_query(), "object ownership")?;
    for row in &objects {
        snapshot.add_object(
            parse_kind(&row.kind)?,
            &row.schema,
            row.name.as_deref(),
            row.owner.clone(),
        );
    }

    let grants: Vec<GrantRow> = load(conn, &grants_query(), "grants")?;
    for row in &grants {
        let kind = parse_kind(&row.kind)?;
        snapshot.add_grant(
            row.grantee.clone(),
            kind,
            &qualified_name(kind, &row.schema, row.name.as_deref()),
            row.privilege.clone(),
        );
    }

    let default_grants: Vec<DefaultGrantRow> =
        load(conn, &default_grants_query(), "default privileges")?;
    for row in &default_grants {
        snapshot.add_default_grant(
            row.grantee.clone(),
            parse_kind(&row.kind)?,
            row.grantor.clone(),
            &row.schema,
            row.privilege.clone(),
        );
    }

    debug!(
        superusers = superusers.len(),
        grants = grants.len(),
        default_grants = default_grants.len(),
        "loaded catalog rows"
    );
    info!(objects = objects.len(), "catalog snapshot loaded");

    Ok(snapshot)
}

/// Connect to `database_url` and load its snapshot.
pub fn load_snapshot_from_url(database_url: &str) -> Result<CatalogSnapshot> {
    let mut conn = connect(database_url)?;
    load_snapshot(&mut conn)
}
