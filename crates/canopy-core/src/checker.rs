//! Record-level permission checker contract

use async_trait::async_trait;
use std::collections::HashMap;

use crate::prelude::*;

/// Result of a batch check: one entry per valid requested ID
pub type PermissionMap = HashMap<RecordId, bool>;

/// Answers view/edit/delete questions for records of one base class.
///
/// `member` is `None` for anonymous callers. The batch variants drop invalid
/// IDs and return `false` for every remaining ID that is not allowed,
/// including IDs that do not exist.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
	async fn can_view_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap>;

	async fn can_edit_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap>;

	async fn can_delete_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap>;

	async fn can_view(&self, id: RecordId, member: Option<MemberId>) -> PermResult<bool> {
		let res = self.can_view_multiple(&[id], member, true).await?;
		Ok(res.get(&id).copied().unwrap_or(false))
	}

	async fn can_edit(&self, id: RecordId, member: Option<MemberId>) -> PermResult<bool> {
		let res = self.can_edit_multiple(&[id], member, true).await?;
		Ok(res.get(&id).copied().unwrap_or(false))
	}

	async fn can_delete(&self, id: RecordId, member: Option<MemberId>) -> PermResult<bool> {
		let res = self.can_delete_multiple(&[id], member, true).await?;
		Ok(res.get(&id).copied().unwrap_or(false))
	}

	/// Dispatch on a runtime permission type
	async fn check_multiple(
		&self,
		ptype: PermissionType,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap> {
		match ptype {
			PermissionType::View => self.can_view_multiple(ids, member, use_cached).await,
			PermissionType::Edit => self.can_edit_multiple(ids, member, use_cached).await,
			PermissionType::Delete => self.can_delete_multiple(ids, member, use_cached).await,
		}
	}
}

// vim: ts=4
