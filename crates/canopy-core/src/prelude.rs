pub use canopy_types::prelude::*;
pub use canopy_types::types::{InheritType, PermissionType, Stage};

// vim: ts=4
