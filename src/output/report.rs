use std::fmt::Write;

use indexmap::IndexMap;

use crate::analyzer::statement::Statement;

#[derive(Debug, Default)]
struct RoleCounts {
    grants: usize,
    revokes: usize,
    default_grants: usize,
    default_revokes: usize,
}

/// Build a markdown summary of a plan: per-role change counts and skipped superusers.
pub fn build_report(statements: &[Statement]) -> String {
    let mut counts: IndexMap<&str, RoleCounts> = IndexMap::new();
    let mut superusers = Vec::new();

    for statement in statements {
        if let Statement::SkipSuperuser { role } = statement {
            superusers.push(role.as_str());
            continue;
        }
        let entry = counts.entry(statement.role()).or_default();
        match statement {
            Statement::Grant { .. } => entry.grants += 1,
            Statement::Revoke { .. } => entry.revokes += 1,
            Statement::GrantDefault { .. } => entry.default_grants += 1,
            Statement::RevokeDefault { .. } => entry.default_revokes += 1,
            Statement::SkipSuperuser { .. } => {}
        }
    }

    let mut report = String::new();
    let _ = writeln!(report, "# privsync Plan Report");
    let _ = writeln!(report);

    if counts.is_empty() {
        let _ = writeln!(report, "No privilege changes required.");
    } else {
        let _ = writeln!(report, "## Changes");
        let _ = writeln!(report);
        let _ = writeln!(
            report,
            "| Role | Grants | Revokes | Default grants | Default revokes |"
        );
        let _ = writeln!(report, "|------|--------|---------|----------------|-----------------|");
        for (role, c) in &counts {
            let _ = writeln!(
                report,
                "| {role} | {} | {} | {} | {} |",
                c.grants, c.revokes, c.default_grants, c.default_revokes
            );
        }
    }

    if !superusers.is_empty() {
        let _ = writeln!(report);
        let _ = writeln!(report, "## Skipped superusers");
        let _ = writeln!(report);
        for role in superusers {
            let _ = writeln!(report, "- {role}");
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DefaultPrivilege, NondefaultPrivilege, ObjectKind};

    #[test]
    fn report_counts_changes_per_role_in_plan_order() {
        let statements = vec![
            Statement::SkipSuperuser {
                role: "postgres".to_string(),
            },
            Statement::Grant {
                role: "analyst".to_string(),
                kind: ObjectKind::Tables,
                privilege: NondefaultPrivilege::new(r#"finance."ledger""#, "SELECT"),
            },
            Statement::RevokeDefault {
                role: "analyst".to_string(),
                kind: ObjectKind::Tables,
                privilege: DefaultPrivilege::new("svc_etl", "finance", "SELECT"),
            },
            Statement::Revoke {
                role: "auditor".to_string(),
                kind: ObjectKind::Schemas,
                privilege: NondefaultPrivilege::new("finance", "USAGE"),
            },
        ];

        let report = build_report(&statements);

        assert!(report.contains("| analyst | 1 | 0 | 0 | 1 |"), "{report}");
        assert!(report.contains("| auditor | 0 | 1 | 0 | 0 |"), "{report}");
        assert!(report.contains("- postgres"), "{report}");
        assert!(report.find("analyst") < report.find("auditor"));
    }

    #[test]
    fn empty_plan_says_nothing_to_do() {
        assert!(build_report(&[]).contains("No privilege changes required."));
    }
}
