/// Membership, ownership, and schema-writer resolution over the whole spec.
pub mod graph;
/// YAML loading.
pub mod loader;
/// Typed spec document: roles, their attributes, and desired privileges.
pub mod model;

pub use graph::SpecGraph;
pub use loader::{load_spec_file, load_spec_str};
pub use model::{RoleConfig, Spec};
