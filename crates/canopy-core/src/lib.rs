//! Permission resolution core for Canopy.
//!
//! This crate answers "may this member view / edit / delete these records?"
//! for hierarchical content trees whose nodes inherit access rules from their
//! parents. Storage is reached only through the adapter traits in
//! `canopy-types`, so the same engine runs on any backend.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod checker;
pub mod default_checker;
pub mod group_set;
pub mod inherited;
pub mod memory_cache;
pub mod perm_settings;
pub mod permission;
pub mod prelude;
pub mod settings;

// Re-export commonly used types
pub use checker::{PermissionChecker, PermissionMap};
pub use default_checker::{DefaultPermissionChecker, RootPermissions};
pub use group_set::GroupSet;
pub use inherited::{InheritedPermissions, InheritedPermissionsBuilder};
pub use memory_cache::MemoryCacheAdapter;
pub use perm_settings::PermissionConfig;
pub use permission::{PermissionFlusher, PermissionService};

// vim: ts=4
