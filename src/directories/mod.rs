//! Directory layout resolution.
//!
//! Resolution is a pure function of its inputs:
//!
//! 1. Start from the named profile's list (which replaces the built-in
//!    default set), or the default set when no profile is given.
//! 2. Union each group in the order given.
//! 3. Union explicit directories last.
//!
//! Duplicates are dropped and the first occurrence keeps its position.

mod catalog;
mod resolver;


pub use catalog::{
    DEFAULT_DIRECTORIES, DirectoryCatalog, builtin_groups, builtin_profiles, private_set_members,
};
pub use resolver::{PrivateDirectorySet, ResolvedDirectorySet, resolve};
