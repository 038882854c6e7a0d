//! Reconcile a declarative PostgreSQL role and privilege spec against the live
//! grant state of a database, producing the ordered GRANT / REVOKE /
//! `ALTER DEFAULT PRIVILEGES` statements that close the gap.
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Per-role privilege analysis and the statements it produces.
pub mod analyzer;
/// Object kinds, access levels, the catalog snapshot contract, and its implementations.
pub mod catalog;
/// Error taxonomy shared by every stage.
pub mod error;
/// Plan rendering: SQL script and Markdown report.
pub mod output;
/// Spec document model, loading, and graph resolution.
pub mod spec;

pub use analyzer::{analyze_privileges, Statement};
pub use error::{Error, Result};
