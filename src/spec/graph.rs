//! Derived, read-only views of the spec: transitive role membership, personal
//! schemas, schema ownership, superusers, and who can create objects where.
//!
//! Everything here is computed once per run by [`SpecGraph::build`] and shared
//! by reference with every privilege analyzer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::model::{Spec, PERSONAL_SCHEMAS};
use crate::catalog::names::unquote_identifier;
use crate::catalog::{Access, ObjectKind};

/// Index of a role in a [`RoleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(usize);

/// Interned role names, so graph traversal compares indices rather than strings.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    names: Vec<String>,
    ids: HashMap<String, RoleId>,
}

impl RoleTable {
    /// Return the id for `name`, interning it on first sight.
    pub fn intern(&mut self, name: &str) -> RoleId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = RoleId(self.names.len());
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Id of an already interned role.
    pub fn id(&self, name: &str) -> Option<RoleId> {
        self.ids.get(name).copied()
    }

    /// Name of an interned role.
    pub fn name(&self, id: RoleId) -> &str {
        &self.names[id.0]
    }

    /// Number of interned roles.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Group → direct members adjacency built from every role's `member_of`.
#[derive(Debug, Clone, Default)]
pub struct MembershipGraph {
    roles: RoleTable,
    direct_members: Vec<Vec<RoleId>>,
}

impl MembershipGraph {
    /// Build the adjacency relation for `spec`.
    pub fn build(spec: &Spec) -> Self {
        let mut graph = Self::default();
        for (role, config) in spec.iter() {
            let member = graph.node(role);
            for group in &config.member_of {
                let group = graph.node(group);
                graph.direct_members[group.0].push(member);
            }
        }
        graph
    }

    fn node(&mut self, name: &str) -> RoleId {
        let id = self.roles.intern(name);
        if self.direct_members.len() < self.roles.len() {
            self.direct_members.resize_with(self.roles.len(), Vec::new);
        }
        id
    }

    /// Every direct or transitive member of `group`.
    ///
    /// Iterative depth-first traversal with a visited set, so membership
    /// cycles terminate; a group reached again through a cycle is reported as
    /// its own member.
    pub fn members_of(&self, group: &str) -> BTreeSet<String> {
        let Some(start) = self.roles.id(group) else {
            return BTreeSet::new();
        };

        let mut visited = vec![false; self.roles.len()];
        let mut members = BTreeSet::new();
        let mut stack = vec![start];
        visited[start.0] = true;

        while let Some(current) = stack.pop() {
            for &member in &self.direct_members[current.0] {
                members.insert(member);
                if !visited[member.0] {
                    visited[member.0] = true;
                    stack.push(member);
                }
            }
        }

        members
            .into_iter()
            .map(|id| self.roles.name(id).to_string())
            .collect()
    }
}

/// All direct and transitive members of `role`.
pub fn resolve_members(role: &str, spec: &Spec) -> BTreeSet<String> {
    MembershipGraph::build(spec).members_of(role)
}

/// Roles flagged `has_personal_schema`.
pub fn resolve_personal_schemas(spec: &Spec) -> BTreeSet<String> {
    spec.iter()
        .filter(|(_, config)| config.has_personal_schema.get())
        .map(|(role, _)| role.to_string())
        .collect()
}

/// Schema → owning role, from `owns.schemas` plus implicit personal schemas.
pub fn resolve_schema_owners(spec: &Spec) -> BTreeMap<String, String> {
    let mut owners = BTreeMap::new();
    for (role, config) in spec.iter() {
        for schema in &config.owns.schemas {
            owners.insert(unquote_identifier(schema), role.to_string());
        }
        if config.has_personal_schema.get() {
            owners.insert(role.to_string(), role.to_string());
        }
    }
    owners
}

/// Roles flagged `is_superuser`.
pub fn resolve_superusers(spec: &Spec) -> BTreeSet<String> {
    spec.iter()
        .filter(|(_, config)| config.is_superuser.get())
        .map(|(role, _)| role.to_string())
        .collect()
}

/// Schema → roles that can create objects in it.
pub fn resolve_schema_writers(spec: &Spec) -> BTreeMap<String, BTreeSet<String>> {
    let graph = MembershipGraph::build(spec);
    let personal_schemas = resolve_personal_schemas(spec);

    let mut writers: BTreeMap<String, BTreeSet<String>> = resolve_schema_owners(spec)
        .into_iter()
        .map(|(schema, owner)| (schema, BTreeSet::from([owner])))
        .collect();

    for (role, config) in spec.iter() {
        let mut writable: BTreeSet<String> = config
            .targets(ObjectKind::Schemas, Access::Write)
            .iter()
            .map(|schema| unquote_identifier(schema))
            .collect();
        if writable.remove(PERSONAL_SCHEMAS) {
            writable.extend(personal_schemas.iter().cloned());
        }
        if writable.is_empty() {
            continue;
        }

        let members = graph.members_of(role);
        for schema in writable {
            let entry = writers.entry(schema).or_default();
            entry.insert(role.to_string());
            entry.extend(members.iter().cloned());
        }
    }

    let superusers = resolve_superusers(spec);
    for schema_writers in writers.values_mut() {
        schema_writers.extend(superusers.iter().cloned());
    }

    writers
}

/// Schema-writer lookup that treats superusers as writers everywhere.
#[derive(Debug, Clone, Default)]
pub struct SchemaWriters {
    writers: BTreeMap<String, BTreeSet<String>>,
    superusers: BTreeSet<String>,
}

impl SchemaWriters {
    /// Roles that can create objects in `schema`.
    ///
    /// A schema the spec says nothing about is still writable by superusers.
    pub fn get(&self, schema: &str) -> &BTreeSet<String> {
        self.writers.get(schema).unwrap_or(&self.superusers)
    }

    /// The underlying schema → writers map.
    pub fn as_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.writers
    }
}

/// Everything privilege analysis needs to know about the spec as a whole.
#[derive(Debug, Clone, Default)]
pub struct SpecGraph {
    /// Roles with a personal schema (the schema shares the role's name).
    pub personal_schemas: BTreeSet<String>,
    /// Schema → owner.
    pub schema_owners: BTreeMap<String, String>,
    /// Superuser roles declared in the spec.
    pub superusers: BTreeSet<String>,
    /// Schema → roles that can create objects there.
    pub schema_writers: SchemaWriters,
}

impl SpecGraph {
    /// Resolve every derived view of `spec` once.
    pub fn build(spec: &Spec) -> Self {
        let superusers = resolve_superusers(spec);
        let graph = Self {
            personal_schemas: resolve_personal_schemas(spec),
            schema_owners: resolve_schema_owners(spec),
            schema_writers: SchemaWriters {
                writers: resolve_schema_writers(spec),
                superusers: superusers.clone(),
            },
            superusers,
        };
        debug!(
            personal_schemas = graph.personal_schemas.len(),
            owned_schemas = graph.schema_owners.len(),
            superusers = graph.superusers.len(),
            "resolved spec graph"
        );
        graph
    }
}
