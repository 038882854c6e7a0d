/// Role × kind × access iteration over the whole spec.
pub mod orchestrator;
/// Per-combination desired-state expansion and diffing.
pub mod privilege_analyzer;
/// Structured GRANT / REVOKE / default-privilege statements and their SQL rendering.
pub mod statement;

pub use orchestrator::analyze_privileges;
pub use privilege_analyzer::PrivilegeAnalyzer;
pub use statement::Statement;
