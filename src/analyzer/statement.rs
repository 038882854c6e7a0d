use std::fmt;

use crate::catalog::names::{quote_identifier, render_schema};
use crate::catalog::{DefaultPrivilege, NondefaultPrivilege, ObjectKind};

/// One step of a reconciliation plan.
///
/// `Display` renders the SQL (or SQL comment) to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `GRANT verb ON KIND object TO role`.
    Grant {
        /// Grantee.
        role: String,
        /// Kind of the target object.
        kind: ObjectKind,
        /// Object and verb being granted.
        privilege: NondefaultPrivilege,
    },
    /// `REVOKE verb ON KIND object FROM role`.
    Revoke {
        /// Grantee losing the privilege.
        role: String,
        /// Kind of the target object.
        kind: ObjectKind,
        /// Object and verb being revoked.
        privilege: NondefaultPrivilege,
    },
    /// Alter the grantor's default privileges so `role` receives the verb on future objects.
    GrantDefault {
        /// Grantee.
        role: String,
        /// Kind of the future objects.
        kind: ObjectKind,
        /// Grantor, schema, and verb.
        privilege: DefaultPrivilege,
    },
    /// Alter the grantor's default privileges so `role` no longer receives the verb.
    RevokeDefault {
        /// Grantee losing the entitlement.
        role: String,
        /// Kind of the future objects.
        kind: ObjectKind,
        /// Grantor, schema, and verb.
        privilege: DefaultPrivilege,
    },
    /// Informational note: superuser privileges are implicit and never managed.
    SkipSuperuser {
        /// The skipped superuser.
        role: String,
    },
}

impl Statement {
    /// Role the statement is about.
    pub fn role(&self) -> &str {
        match self {
            Statement::Grant { role, .. }
            | Statement::Revoke { role, .. }
            | Statement::GrantDefault { role, .. }
            | Statement::RevokeDefault { role, .. }
            | Statement::SkipSuperuser { role } => role,
        }
    }

    /// Whether executing the statement changes the database.
    pub fn is_change(&self) -> bool {
        !matches!(self, Statement::SkipSuperuser { .. })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Grant {
                role,
                kind,
                privilege,
            } => write!(
                f,
                "GRANT {} ON {} {} TO {};",
                privilege.privilege,
                kind.sql_singular(),
                privilege.object,
                quote_identifier(role)
            ),
            Statement::Revoke {
                role,
                kind,
                privilege,
            } => write!(
                f,
                "REVOKE {} ON {} {} FROM {};",
                privilege.privilege,
                kind.sql_singular(),
                privilege.object,
                quote_identifier(role)
            ),
            Statement::GrantDefault {
                role,
                kind,
                privilege,
            } => write!(
                f,
                "SET ROLE {};\nALTER DEFAULT PRIVILEGES IN SCHEMA {} GRANT {} ON {} TO {};\nRESET ROLE;",
                quote_identifier(&privilege.grantor),
                render_schema(&privilege.schema),
                privilege.privilege,
                kind.sql_plural(),
                quote_identifier(role)
            ),
            Statement::RevokeDefault {
                role,
                kind,
                privilege,
            } => write!(
                f,
                "SET ROLE {};\nALTER DEFAULT PRIVILEGES IN SCHEMA {} REVOKE {} ON {} FROM {};\nRESET ROLE;",
                quote_identifier(&privilege.grantor),
                render_schema(&privilege.schema),
                privilege.privilege,
                kind.sql_plural(),
                quote_identifier(role)
            ),
            Statement::SkipSuperuser { role } => write!(
                f,
                "-- Skipping privilege configuration for superuser {}",
                quote_identifier(role)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_statements_impersonate_the_grantor() {
        let statement = Statement::RevokeDefault {
            role: "analyst".to_string(),
            kind: ObjectKind::Tables,
            privilege: DefaultPrivilege::new("svc_etl", "finance", "SELECT"),
        };

        assert_eq!(
            statement.to_string(),
            "SET ROLE \"svc_etl\";\n\
             ALTER DEFAULT PRIVILEGES IN SCHEMA finance REVOKE SELECT ON TABLES FROM \"analyst\";\n\
             RESET ROLE;"
        );
    }

    #[test]
    fn nondefault_statements_use_singular_kind_keyword() {
        let statement = Statement::Grant {
            role: "analyst".to_string(),
            kind: ObjectKind::Sequences,
            privilege: NondefaultPrivilege::new(r#"finance."invoice_id_seq""#, "USAGE"),
        };

        assert_eq!(
            statement.to_string(),
            r#"GRANT USAGE ON SEQUENCE finance."invoice_id_seq" TO "analyst";"#
        );
        assert!(statement.is_change());
    }

    #[test]
    fn superuser_note_is_a_comment() {
        let statement = Statement::SkipSuperuser {
            role: "postgres".to_string(),
        };
        assert!(statement.to_string().starts_with("-- "));
        assert!(!statement.is_change());
        assert_eq!(statement.role(), "postgres");
    }
}
