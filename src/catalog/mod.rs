//! Object kinds, access levels, and the read-only view of the database catalog
//! that privilege analysis consumes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier normalization for schema-qualified object names.
pub mod names;
/// Live catalog introspection with diesel.
#[cfg(feature = "db")]
pub mod postgres;
/// In-memory catalog snapshot, loadable from JSON.
pub mod snapshot;

pub use snapshot::CatalogSnapshot;

/// Kinds of database objects whose privileges are managed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// `CREATE SCHEMA` namespaces.
    Schemas,
    /// Tables, views, and materialized views.
    Tables,
    /// Sequences.
    Sequences,
    /// Functions, including aggregates and window functions (not procedures).
    Functions,
    /// User-defined types.
    Types,
}

impl ObjectKind {
    /// Every kind, in analysis order.
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Schemas,
        ObjectKind::Tables,
        ObjectKind::Sequences,
        ObjectKind::Functions,
        ObjectKind::Types,
    ];

    /// Plural lowercase name, as used in spec documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Schemas => "schemas",
            ObjectKind::Tables => "tables",
            ObjectKind::Sequences => "sequences",
            ObjectKind::Functions => "functions",
            ObjectKind::Types => "types",
        }
    }

    /// Singular lowercase name, used in error messages.
    pub fn singular(self) -> &'static str {
        let plural = self.as_str();
        &plural[..plural.len() - 1]
    }

    /// Keyword used in `GRANT ... ON <KIND> object`.
    pub fn sql_singular(self) -> &'static str {
        match self {
            ObjectKind::Schemas => "SCHEMA",
            ObjectKind::Tables => "TABLE",
            ObjectKind::Sequences => "SEQUENCE",
            ObjectKind::Functions => "FUNCTION",
            ObjectKind::Types => "TYPE",
        }
    }

    /// Keyword used in `ALTER DEFAULT PRIVILEGES ... ON <KINDS>`.
    pub fn sql_plural(self) -> &'static str {
        match self {
            ObjectKind::Schemas => "SCHEMAS",
            ObjectKind::Tables => "TABLES",
            ObjectKind::Sequences => "SEQUENCES",
            ObjectKind::Functions => "FUNCTIONS",
            ObjectKind::Types => "TYPES",
        }
    }

    /// Whether future objects of this kind can carry default privileges.
    pub fn supports_default_privileges(self) -> bool {
        !matches!(self, ObjectKind::Schemas)
    }

    /// Underlying PostgreSQL privilege verbs granted for `access` on this kind.
    pub fn privileges(self, access: Access) -> &'static [&'static str] {
        match (self, access) {
            (ObjectKind::Schemas, Access::Read) => &["USAGE"],
            (ObjectKind::Schemas, Access::Write) => &["CREATE"],
            (ObjectKind::Tables, Access::Read) => &["SELECT"],
            (ObjectKind::Tables, Access::Write) => &[
                "INSERT",
                "UPDATE",
                "DELETE",
                "TRUNCATE",
                "REFERENCES",
                "TRIGGER",
            ],
            (ObjectKind::Sequences, Access::Read) => &["SELECT"],
            (ObjectKind::Sequences, Access::Write) => &["USAGE", "UPDATE"],
            (ObjectKind::Functions, Access::Read) => &["EXECUTE"],
            (ObjectKind::Types, Access::Read) => &["USAGE"],
            (ObjectKind::Functions | ObjectKind::Types, Access::Write) => &[],
        }
    }

    /// Access level a privilege verb belongs to for this kind, if any.
    pub fn access_for(self, privilege: &str) -> Option<Access> {
        Access::ALL
            .into_iter()
            .find(|access| self.privileges(*access).contains(&privilege))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown object kind '{s}'"))
    }
}

/// Access level requested in a spec.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Read-only access.
    Read,
    /// Write access; implies read.
    Write,
}

impl Access {
    /// Every access level, in analysis order.
    pub const ALL: [Access; 2] = [Access::Read, Access::Write];
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// A privilege on an object that already exists: `(qualified object, verb)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NondefaultPrivilege {
    /// Canonical qualified name (see [`names::qualified_name`]).
    pub object: String,
    /// PostgreSQL privilege verb, e.g. `SELECT`.
    pub privilege: String,
}

impl NondefaultPrivilege {
    /// Build a non-default privilege key.
    pub fn new(object: impl Into<String>, privilege: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            privilege: privilege.into(),
        }
    }
}

/// A default privilege: objects `grantor` creates in `schema` are granted `privilege`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefaultPrivilege {
    /// Role whose future objects carry the entitlement.
    pub grantor: String,
    /// Unquoted schema name.
    pub schema: String,
    /// PostgreSQL privilege verb, e.g. `SELECT`.
    pub privilege: String,
}

impl DefaultPrivilege {
    /// Build a default privilege key.
    pub fn new(
        grantor: impl Into<String>,
        schema: impl Into<String>,
        privilege: impl Into<String>,
    ) -> Self {
        Self {
            grantor: grantor.into(),
            schema: schema.into(),
            privilege: privilege.into(),
        }
    }
}

/// An existing object together with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedObject {
    /// Canonical qualified name.
    pub qualified_name: String,
    /// Owning role.
    pub owner: String,
}

/// Read-only view of the current database state.
///
/// Implementations are fully materialized before analysis starts; the
/// analyzer never expects these calls to hit the database.
pub trait PrivilegeSnapshot {
    /// Whether `role` is a superuser in the database.
    fn is_superuser(&self, role: &str) -> bool;

    /// Privileges `role` currently holds on existing objects of `kind` at `access`.
    fn current_nondefault_privileges(
        &self,
        role: &str,
        kind: ObjectKind,
        access: Access,
    ) -> BTreeSet<NondefaultPrivilege>;

    /// Default privileges `role` currently receives for future objects of `kind` at `access`.
    fn current_default_privileges(
        &self,
        role: &str,
        kind: ObjectKind,
        access: Access,
    ) -> BTreeSet<DefaultPrivilege>;

    /// Owner of an object; `object = None` means the schema itself.
    fn object_owner(&self, kind: ObjectKind, schema: &str, object: Option<&str>) -> Option<&str>;

    /// Every existing object of `kind` in `schema`, with its owner.
    fn objects_in_schema(&self, kind: ObjectKind, schema: &str) -> Vec<OwnedObject>;
}
