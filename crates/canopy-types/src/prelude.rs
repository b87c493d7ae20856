pub use crate::error::{Error, PermResult};
pub use crate::types::{GroupId, MemberId, PermissionId, RecordId, RoleId};

pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};

// vim: ts=4
