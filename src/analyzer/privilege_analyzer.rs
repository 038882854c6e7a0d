use std::collections::BTreeSet;

use tracing::debug;

use super::statement::Statement;
use crate::catalog::names::{
    ensure_quoted_identifier, qualified_name, split_qualified_name, unquote_identifier,
};
use crate::catalog::{
    Access, DefaultPrivilege, NondefaultPrivilege, ObjectKind, PrivilegeSnapshot,
};
use crate::error::{Error, Result};
use crate::spec::graph::SpecGraph;
use crate::spec::model::{PERSONAL_SCHEMAS, PERSONAL_SCHEMAS_STAR};

/// Analyzes one combination of role × object kind × access level (e.g.
/// read-level table privileges for `analyst`) and produces the statements that
/// make the database match the desired items.
///
/// Desired state is expanded into two sets:
///
/// - non-default privileges on existing objects, `{(object, verb)}`, e.g.
///   `{("finance.\"ledger\"", "SELECT")}`;
/// - default privileges on future objects, `{(grantor, schema, verb)}`, e.g.
///   `{("svc_etl", "finance", "SELECT")}`.
///
/// Both are diffed against the snapshot in both directions.
pub struct PrivilegeAnalyzer<'a, S: PrivilegeSnapshot + ?Sized> {
    role: &'a str,
    kind: ObjectKind,
    access: Access,
    desired_items: Vec<String>,
    graph: &'a SpecGraph,
    snapshot: &'a S,
    current_nondefaults: BTreeSet<NondefaultPrivilege>,
    current_defaults: BTreeSet<DefaultPrivilege>,
    desired_nondefaults: BTreeSet<NondefaultPrivilege>,
    desired_defaults: BTreeSet<DefaultPrivilege>,
}

impl<'a, S> PrivilegeAnalyzer<'a, S>
where
    S: PrivilegeSnapshot + ?Sized,
{
    /// Create an analyzer and load the role's current privileges from `snapshot`.
    pub fn new(
        role: &'a str,
        kind: ObjectKind,
        access: Access,
        desired_items: Vec<String>,
        graph: &'a SpecGraph,
        snapshot: &'a S,
    ) -> Self {
        debug!(role, %kind, %access, "initializing privilege analyzer");

        let current_defaults = if kind.supports_default_privileges() {
            snapshot.current_default_privileges(role, kind, access)
        } else {
            BTreeSet::new()
        };

        Self {
            role,
            kind,
            access,
            desired_items,
            graph,
            snapshot,
            current_nondefaults: snapshot.current_nondefault_privileges(role, kind, access),
            current_defaults,
            desired_nondefaults: BTreeSet::new(),
            desired_defaults: BTreeSet::new(),
        }
    }

    /// Desired privileges on existing objects (populated by [`Self::identify_desired_objects`]).
    pub fn desired_nondefaults(&self) -> &BTreeSet<NondefaultPrivilege> {
        &self.desired_nondefaults
    }

    /// Desired default privileges (populated by [`Self::identify_desired_objects`]).
    pub fn desired_defaults(&self) -> &BTreeSet<DefaultPrivilege> {
        &self.desired_defaults
    }

    /// Expand the raw desired items into the desired non-default and default sets.
    ///
    /// Keyword and wildcard interpretation happens only here; the diff in
    /// [`Self::analyze`] works on the normalized sets.
    pub fn identify_desired_objects(&mut self) -> Result<()> {
        let mut objects = BTreeSet::new();
        let mut schemas = BTreeSet::new();

        for item in &self.desired_items {
            match item.as_str() {
                PERSONAL_SCHEMAS if self.kind == ObjectKind::Schemas => {
                    objects.extend(
                        self.graph
                            .personal_schemas
                            .iter()
                            .filter(|schema| schema.as_str() != self.role)
                            .map(|schema| qualified_name(ObjectKind::Schemas, schema, None)),
                    );
                }
                PERSONAL_SCHEMAS => {
                    return Err(Error::PersonalSchemasKeyword {
                        role: self.role.to_string(),
                        kind: self.kind,
                        access: self.access,
                    });
                }
                PERSONAL_SCHEMAS_STAR => {
                    schemas.extend(self.graph.personal_schemas.iter().cloned());
                }
                _ => match item.strip_suffix(".*") {
                    Some(schema) => {
                        schemas.insert(unquote_identifier(schema));
                    }
                    None => {
                        if let Some(object) = self.resolve_single_object(item)? {
                            objects.insert(object);
                        }
                    }
                },
            }
        }

        for schema in &schemas {
            objects.extend(
                self.snapshot
                    .objects_in_schema(self.kind, schema)
                    .into_iter()
                    .filter(|object| object.owner != self.role)
                    .map(|object| object.qualified_name),
            );
        }

        let verbs = self.kind.privileges(self.access);
        self.desired_nondefaults = objects
            .iter()
            .flat_map(|object| {
                verbs
                    .iter()
                    .map(move |verb| NondefaultPrivilege::new(object.clone(), *verb))
            })
            .collect();

        if self.kind.supports_default_privileges() {
            self.desired_defaults = self.determine_desired_defaults(&schemas);
        }

        Ok(())
    }

    /// Canonical name of a single named object, or `None` when the analyzed
    /// role owns it and needs no explicit grant.
    fn resolve_single_object(&self, item: &str) -> Result<Option<String>> {
        let quoted = ensure_quoted_identifier(self.kind, item);
        let (schema, object) = split_qualified_name(item);

        let Some(owner) = self
            .snapshot
            .object_owner(self.kind, &schema, object.as_deref())
        else {
            return Err(Error::ObjectDoesNotExist {
                role: self.role.to_string(),
                kind: self.kind,
                access: self.access,
                object: quoted,
            });
        };

        if owner == self.role {
            Ok(None)
        } else {
            Ok(Some(quoted))
        }
    }

    /// Every other role that can create objects in `schemas` should grant this
    /// role the access level's verbs on what it creates.
    fn determine_desired_defaults(&self, schemas: &BTreeSet<String>) -> BTreeSet<DefaultPrivilege> {
        let verbs = self.kind.privileges(self.access);
        let mut desired = BTreeSet::new();

        for schema in schemas {
            for writer in self.graph.schema_writers.get(schema) {
                if writer == self.role {
                    continue;
                }
                for verb in verbs {
                    desired.insert(DefaultPrivilege::new(writer.clone(), schema.clone(), *verb));
                }
            }
        }

        desired
    }

    /// Run the analysis and return the statements to execute, in the order:
    /// non-default grants, non-default revokes, default grants, default revokes.
    /// Each group is sorted by its tuple key.
    pub fn analyze(mut self) -> Result<Vec<Statement>> {
        self.identify_desired_objects()?;

        let mut statements = self.analyze_nondefaults();
        if self.kind.supports_default_privileges() {
            statements.extend(self.analyze_defaults());
        }
        Ok(statements)
    }

    fn analyze_nondefaults(&self) -> Vec<Statement> {
        let to_grant: Vec<&NondefaultPrivilege> = self
            .desired_nondefaults
            .difference(&self.current_nondefaults)
            .collect();
        debug!(role = self.role, kind = %self.kind, access = %self.access, ?to_grant, "nondefaults to grant");

        let to_revoke: Vec<&NondefaultPrivilege> = self
            .current_nondefaults
            .difference(&self.desired_nondefaults)
            .collect();
        debug!(role = self.role, kind = %self.kind, access = %self.access, ?to_revoke, "nondefaults to revoke");

        let grants = to_grant.into_iter().map(|privilege| Statement::Grant {
            role: self.role.to_string(),
            kind: self.kind,
            privilege: privilege.clone(),
        });
        let revokes = to_revoke.into_iter().map(|privilege| Statement::Revoke {
            role: self.role.to_string(),
            kind: self.kind,
            privilege: privilege.clone(),
        });
        grants.chain(revokes).collect()
    }

    fn analyze_defaults(&self) -> Vec<Statement> {
        let to_grant: Vec<&DefaultPrivilege> = self
            .desired_defaults
            .difference(&self.current_defaults)
            .collect();
        debug!(role = self.role, kind = %self.kind, access = %self.access, ?to_grant, "defaults to grant");

        let to_revoke: Vec<&DefaultPrivilege> = self
            .current_defaults
            .difference(&self.desired_defaults)
            .collect();
        debug!(role = self.role, kind = %self.kind, access = %self.access, ?to_revoke, "defaults to revoke");

        let grants = to_grant.into_iter().map(|privilege| Statement::GrantDefault {
            role: self.role.to_string(),
            kind: self.kind,
            privilege: privilege.clone(),
        });
        let revokes = to_revoke.into_iter().map(|privilege| Statement::RevokeDefault {
            role: self.role.to_string(),
            kind: self.kind,
            privilege: privilege.clone(),
        });
        grants.chain(revokes).collect()
    }
}
