use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::names::{ensure_quoted_identifier, qualified_name, unquote_identifier};
use super::{
    Access, DefaultPrivilege, NondefaultPrivilege, ObjectKind, OwnedObject, PrivilegeSnapshot,
};
use crate::analyzer::statement::Statement;
use crate::error::{Error, Result};

/// Fully materialized catalog state: superusers, object ownership, and the
/// grants every role currently holds.
///
/// Serializes to and from the snapshot JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument", into = "SnapshotDocument")]
pub struct CatalogSnapshot {
    superusers: BTreeSet<String>,
    /// `(kind, schema)` → object name (`None` for the schema itself) → owner.
    owners: BTreeMap<(ObjectKind, String), BTreeMap<Option<String>, String>>,
    grants: BTreeMap<(String, ObjectKind), BTreeSet<NondefaultPrivilege>>,
    default_grants: BTreeMap<(String, ObjectKind), BTreeSet<DefaultPrivilege>>,
}

impl CatalogSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&content)
    }

    /// Serialize as a pretty-printed snapshot JSON document.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Mark `role` as a superuser.
    pub fn add_superuser(&mut self, role: impl Into<String>) -> &mut Self {
        self.superusers.insert(role.into());
        self
    }

    /// Record that `owner` owns an object; `name = None` records the schema itself.
    pub fn add_object(
        &mut self,
        kind: ObjectKind,
        schema: &str,
        name: Option<&str>,
        owner: impl Into<String>,
    ) -> &mut Self {
        self.owners
            .entry((kind, unquote_identifier(schema)))
            .or_default()
            .insert(name.map(unquote_identifier), owner.into());
        self
    }

    /// Record a privilege `role` holds on an existing object.
    ///
    /// `object` may be written quoted or unquoted; it is stored canonically.
    pub fn add_grant(
        &mut self,
        role: impl Into<String>,
        kind: ObjectKind,
        object: &str,
        privilege: impl Into<String>,
    ) -> &mut Self {
        self.grants
            .entry((role.into(), kind))
            .or_default()
            .insert(NondefaultPrivilege::new(
                ensure_quoted_identifier(kind, object),
                privilege,
            ));
        self
    }

    /// Record a default privilege `role` receives on objects `grantor` creates in `schema`.
    pub fn add_default_grant(
        &mut self,
        role: impl Into<String>,
        kind: ObjectKind,
        grantor: impl Into<String>,
        schema: &str,
        privilege: impl Into<String>,
    ) -> &mut Self {
        self.default_grants
            .entry((role.into(), kind))
            .or_default()
            .insert(DefaultPrivilege::new(
                grantor,
                unquote_identifier(schema),
                privilege,
            ));
        self
    }

    /// Update the snapshot as if `statement` had been executed.
    pub fn apply(&mut self, statement: &Statement) {
        match statement {
            Statement::Grant {
                role,
                kind,
                privilege,
            } => {
                self.grants
                    .entry((role.clone(), *kind))
                    .or_default()
                    .insert(privilege.clone());
            }
            Statement::Revoke {
                role,
                kind,
                privilege,
            } => {
                if let Some(held) = self.grants.get_mut(&(role.clone(), *kind)) {
                    held.remove(privilege);
                }
            }
            Statement::GrantDefault {
                role,
                kind,
                privilege,
            } => {
                self.default_grants
                    .entry((role.clone(), *kind))
                    .or_default()
                    .insert(privilege.clone());
            }
            Statement::RevokeDefault {
                role,
                kind,
                privilege,
            } => {
                if let Some(held) = self.default_grants.get_mut(&(role.clone(), *kind)) {
                    held.remove(privilege);
                }
            }
            Statement::SkipSuperuser { .. } => {}
        }
    }

    /// Apply every statement in order.
    pub fn apply_all<'a>(&mut self, statements: impl IntoIterator<Item = &'a Statement>) {
        for statement in statements {
            self.apply(statement);
        }
    }
}

impl PrivilegeSnapshot for CatalogSnapshot {
    fn is_superuser(&self, role: &str) -> bool {
        self.superusers.contains(role)
    }

    fn current_nondefault_privileges(
        &self,
        role: &str,
        kind: ObjectKind,
        access: Access,
    ) -> BTreeSet<NondefaultPrivilege> {
        let verbs = kind.privileges(access);
        self.grants
            .get(&(role.to_string(), kind))
            .map(|held| {
                held.iter()
                    .filter(|grant| verbs.contains(&grant.privilege.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn current_default_privileges(
        &self,
        role: &str,
        kind: ObjectKind,
        access: Access,
    ) -> BTreeSet<DefaultPrivilege> {
        let verbs = kind.privileges(access);
        self.default_grants
            .get(&(role.to_string(), kind))
            .map(|held| {
                held.iter()
                    .filter(|grant| verbs.contains(&grant.privilege.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn object_owner(&self, kind: ObjectKind, schema: &str, object: Option<&str>) -> Option<&str> {
        self.owners
            .get(&(kind, schema.to_string()))?
            .get(&object.map(str::to_string))
            .map(String::as_str)
    }

    fn objects_in_schema(&self, kind: ObjectKind, schema: &str) -> Vec<OwnedObject> {
        self.owners
            .get(&(kind, schema.to_string()))
            .map(|objects| {
                objects
                    .iter()
                    .map(|(name, owner)| OwnedObject {
                        qualified_name: qualified_name(kind, schema, name.as_deref()),
                        owner: owner.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// On-disk shape of a [`CatalogSnapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDocument {
    #[serde(default)]
    superusers: Vec<String>,
    #[serde(default)]
    objects: Vec<ObjectRecord>,
    #[serde(default)]
    grants: Vec<GrantRecord>,
    #[serde(default)]
    default_grants: Vec<DefaultGrantRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    kind: ObjectKind,
    schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrantRecord {
    role: String,
    kind: ObjectKind,
    object: String,
    privilege: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DefaultGrantRecord {
    role: String,
    kind: ObjectKind,
    grantor: String,
    schema: String,
    privilege: String,
}

impl From<SnapshotDocument> for CatalogSnapshot {
    fn from(doc: SnapshotDocument) -> Self {
        let mut snapshot = CatalogSnapshot::new();
        for role in doc.superusers {
            snapshot.add_superuser(role);
        }
        for object in doc.objects {
            snapshot.add_object(
                object.kind,
                &object.schema,
                object.name.as_deref(),
                object.owner,
            );
        }
        for grant in doc.grants {
            snapshot.add_grant(grant.role, grant.kind, &grant.object, grant.privilege);
        }
        for grant in doc.default_grants {
            snapshot.add_default_grant(
                grant.role,
                grant.kind,
                grant.grantor,
                &grant.schema,
                grant.privilege,
            );
        }
        snapshot
    }
}

impl From<CatalogSnapshot> for SnapshotDocument {
    fn from(snapshot: CatalogSnapshot) -> Self {
        let objects = snapshot
            .owners
            .into_iter()
            .flat_map(|((kind, schema), objects)| {
                objects.into_iter().map(move |(name, owner)| ObjectRecord {
                    kind,
                    schema: schema.clone(),
                    name,
                    owner,
                })
            })
            .collect();

        let grants = snapshot
            .grants
            .into_iter()
            .flat_map(|((role, kind), held)| {
                held.into_iter().map(move |grant| GrantRecord {
                    role: role.clone(),
                    kind,
                    object: grant.object,
                    privilege: grant.privilege,
                })
            })
            .collect();

        let default_grants = snapshot
            .default_grants
            .into_iter()
            .flat_map(|((role, kind), held)| {
                held.into_iter().map(move |grant| DefaultGrantRecord {
                    role: role.clone(),
                    kind,
                    grantor: grant.grantor,
                    schema: grant.schema,
                    privilege: grant.privilege,
                })
            })
            .collect();

        SnapshotDocument {
            superusers: snapshot.superusers.into_iter().collect(),
            objects,
            grants,
            default_grants,
        }
    }
}
