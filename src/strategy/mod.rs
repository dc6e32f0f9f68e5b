//! Branch strategy resolution.
//!
//! A strategy is either a catalog name (`simple`, `standard`, `gitflow`,
//! `github-flow`, `minimal`) or a custom description from configuration.
//! Both go through the same validation and produce a [`BranchGraph`]:
//!
//! - exactly one private branch, with no forward edge into it
//! - an acyclic forward (promotion) graph over declared branches
//! - one repair edge from every public branch straight to the private branch
//!
//! A graph is rebuilt from configuration whenever it is needed; nothing
//! mutates one after resolution.

mod catalog;
mod graph;
mod resolver;
mod types;


pub use catalog::{CATALOG_NAMES, PRIVATE_BRANCH, catalog_spec};
pub use graph::BranchGraph;
pub use resolver::{is_reserved_branch_name, resolve_custom, resolve_from_config, resolve_named};
pub use types::{BranchRole, BranchSpec, Edge};
