use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::catalog::{Access, ObjectKind};

/// Reserved target meaning "every role's personal schema" (schemas only).
pub const PERSONAL_SCHEMAS: &str = "personal_schemas";
/// Reserved target meaning "all objects in every personal schema".
pub const PERSONAL_SCHEMAS_STAR: &str = "personal_schemas.*";

/// A boolean that also accepts the string and integer spellings people put in YAML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolLike(pub bool);

impl BoolLike {
    /// The parsed value.
    pub fn get(self) -> bool {
        self.0
    }
}

impl From<bool> for BoolLike {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for BoolLike {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(value) => Ok(Self(value)),
            Raw::Int(0) => Ok(Self(false)),
            Raw::Int(1) => Ok(Self(true)),
            Raw::Int(other) => Err(de::Error::custom(format!(
                "expected a boolean, got integer {other}"
            ))),
            Raw::Str(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Self(true)),
                "false" | "no" | "off" | "0" | "" => Ok(Self(false)),
                _ => Err(de::Error::custom(format!(
                    "expected a boolean, got '{text}'"
                ))),
            },
        }
    }
}

/// Objects a role owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Owns {
    /// Schemas owned by the role.
    pub schemas: Vec<String>,
}

/// Per-kind, per-access privilege targets.
pub type PrivilegeTargets = BTreeMap<ObjectKind, BTreeMap<Access, Vec<String>>>;

/// Configuration for one role. Absent entries in the document become the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Superusers are skipped during privilege analysis and may write anywhere.
    pub is_superuser: BoolLike,
    /// The role owns a schema named after itself.
    pub has_personal_schema: BoolLike,
    /// Group roles this role belongs to.
    pub member_of: Vec<String>,
    /// Objects owned by this role.
    pub owns: Owns,
    /// Desired privileges.
    pub privileges: PrivilegeTargets,
}

impl RoleConfig {
    /// Raw targets listed under `privileges.<kind>.<access>`.
    pub fn targets(&self, kind: ObjectKind, access: Access) -> &[String] {
        self.privileges
            .get(&kind)
            .and_then(|levels| levels.get(&access))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Targets the analyzer should consider for `access`.
    ///
    /// Write access implies read, so read targets include the write targets.
    pub fn desired_items(&self, kind: ObjectKind, access: Access) -> Vec<String> {
        let mut items = self.targets(kind, access).to_vec();
        if access == Access::Read {
            items.extend_from_slice(self.targets(kind, Access::Write));
        }
        items
    }
}

/// The whole access-control document: role name → configuration, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spec {
    roles: IndexMap<String, RoleConfig>,
}

impl Spec {
    /// Build a spec from `(role, config)` pairs, keeping their order.
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = (S, RoleConfig)>,
        S: Into<String>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|(name, config)| (name.into(), config))
                .collect(),
        }
    }

    /// Iterate roles in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleConfig)> {
        self.roles.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Role names in document order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Configuration for `role`, if declared.
    pub fn get(&self, role: &str) -> Option<&RoleConfig> {
        self.roles.get(role)
    }

    /// Number of declared roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// True when no roles are declared.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl<'de> Deserialize<'de> for Spec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Option<RoleConfig>>::deserialize(deserializer)?;
        Ok(Self::from_roles(
            raw.into_iter()
                .map(|(name, config)| (name, config.unwrap_or_default())),
        ))
    }
}
