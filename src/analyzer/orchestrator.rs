use tracing::{debug, info};

use super::privilege_analyzer::PrivilegeAnalyzer;
use super::statement::Statement;
use crate::catalog::{Access, ObjectKind, PrivilegeSnapshot};
use crate::error::Result;
use crate::spec::graph::SpecGraph;
use crate::spec::model::Spec;

/// Compute the full, ordered statement list that brings the database in line
/// with `spec`.
///
/// Roles are visited in spec order; within a role, kinds in
/// [`ObjectKind::ALL`] order and access levels read then write. Superusers
/// (per the snapshot) get a single informational note instead of analysis.
///
/// The first authoring error aborts the run: no partial plan is returned.
pub fn analyze_privileges<S>(spec: &Spec, snapshot: &S) -> Result<Vec<Statement>>
where
    S: PrivilegeSnapshot + ?Sized,
{
    debug!(roles = spec.len(), "starting privilege analysis");
    let graph = SpecGraph::build(spec);
    let mut statements = Vec::new();

    for (role, config) in spec.iter() {
        if snapshot.is_superuser(role) {
            statements.push(Statement::SkipSuperuser {
                role: role.to_string(),
            });
            continue;
        }

        for kind in ObjectKind::ALL {
            for access in Access::ALL {
                let desired_items = config.desired_items(kind, access);
                let analyzer =
                    PrivilegeAnalyzer::new(role, kind, access, desired_items, &graph, snapshot);
                statements.extend(analyzer.analyze()?);
            }
        }
    }

    let changes = statements.iter().filter(|s| s.is_change()).count();
    info!(
        roles = spec.len(),
        changes,
        "privilege analysis complete"
    );

    Ok(statements)
}
