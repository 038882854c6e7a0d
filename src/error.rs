use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{Access, ObjectKind};

/// Result type used across privsync.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a reconciliation run.
///
/// Authoring errors carry the role, object kind, and access level that
/// triggered them so the offending spec entry can be located.
#[derive(Debug, Error)]
pub enum Error {
    /// `personal_schemas` was requested for an object kind other than schemas.
    #[error(
        "Unable to interpret reserved keyword 'personal_schemas' for rolename '{role}', object_kind '{kind}', access '{access}'"
    )]
    PersonalSchemasKeyword {
        /// Role whose privileges were being analyzed.
        role: String,
        /// Object kind the keyword appeared under.
        kind: ObjectKind,
        /// Access level the keyword appeared under.
        access: Access,
    },

    /// A named object has no owner in the catalog snapshot.
    #[error(
        "{} '{object}' requested for role \"{role}\" ({access} access) does not exist",
        .kind.singular()
    )]
    ObjectDoesNotExist {
        /// Role whose privileges were being analyzed.
        role: String,
        /// Object kind of the missing object.
        kind: ObjectKind,
        /// Access level the object was requested under.
        access: Access,
        /// Identifier as written (after quoting normalization).
        object: String,
    },

    /// The spec document is not valid YAML or does not match the spec shape.
    #[error("invalid spec: {0}")]
    SpecParse(#[from] serde_yaml::Error),

    /// The snapshot document is not valid JSON or does not match the snapshot shape.
    #[error("invalid snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An output file stem that would escape the output directory.
    #[error("invalid output name: {0}")]
    InvalidOutputName(String),

    /// Catalog introspection against a live database failed.
    #[error("database error: {0}")]
    Database(String),
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the spec content rather than the environment.
    pub fn is_authoring_error(&self) -> bool {
        matches!(
            self,
            Self::PersonalSchemasKeyword { .. } | Self::ObjectDoesNotExist { .. }
        )
    }
}
