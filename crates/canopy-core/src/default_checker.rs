//! Answers for records at the top of a hierarchy.
//!
//! Records whose policy is `Inherit` but which have no parent take their
//! answer from a `DefaultPermissionChecker`. `RootPermissions` is the stock
//! implementation, configured like a site-wide access settings record.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use canopy_types::types::ADMIN_CODE;

use crate::permission::PermissionService;
use crate::prelude::*;

#[async_trait]
pub trait DefaultPermissionChecker: Debug + Send + Sync {
	async fn can_view(&self, member: Option<MemberId>) -> PermResult<bool>;
	async fn can_edit(&self, member: Option<MemberId>) -> PermResult<bool>;
	async fn can_delete(&self, member: Option<MemberId>) -> PermResult<bool>;
	async fn can_create(&self, member: Option<MemberId>) -> PermResult<bool>;

	async fn check(&self, ptype: PermissionType, member: Option<MemberId>) -> PermResult<bool> {
		match ptype {
			PermissionType::View => self.can_view(member).await,
			PermissionType::Edit => self.can_edit(member).await,
			PermissionType::Delete => self.can_delete(member).await,
		}
	}
}

/// One configured rule: who may do something at the root
#[derive(Debug, Clone)]
struct RootRule {
	kind: InheritType,
	groups: Vec<GroupId>,
}

impl RootRule {
	fn new(kind: InheritType, groups: Vec<GroupId>, allowed: &[InheritType], what: &str) -> PermResult<Self> {
		if !allowed.contains(&kind) {
			return Err(Error::InvalidArgument(format!("{} cannot be used for root {} rules", kind, what)));
		}
		Ok(Self { kind, groups })
	}
}

const VIEW_TYPES: [InheritType; 3] =
	[InheritType::Anyone, InheritType::LoggedInUsers, InheritType::OnlyTheseUsers];
const EDIT_TYPES: [InheritType; 2] = [InheritType::LoggedInUsers, InheritType::OnlyTheseUsers];

/// Site-wide defaults: view Anyone, edit and create LoggedInUsers.
/// Members holding `ADMIN` may always do everything. Delete follows edit.
#[derive(Debug, Clone)]
pub struct RootPermissions {
	permissions: Arc<PermissionService>,
	view: RootRule,
	edit: RootRule,
	create: RootRule,
}

impl RootPermissions {
	pub fn new(permissions: Arc<PermissionService>) -> Self {
		Self {
			permissions,
			view: RootRule { kind: InheritType::Anyone, groups: Vec::new() },
			edit: RootRule { kind: InheritType::LoggedInUsers, groups: Vec::new() },
			create: RootRule { kind: InheritType::LoggedInUsers, groups: Vec::new() },
		}
	}

	/// Anyone, LoggedInUsers or OnlyTheseUsers (with viewer groups)
	pub fn with_view(mut self, kind: InheritType, groups: Vec<GroupId>) -> PermResult<Self> {
		self.view = RootRule::new(kind, groups, &VIEW_TYPES, "view")?;
		Ok(self)
	}

	/// LoggedInUsers or OnlyTheseUsers (with editor groups)
	pub fn with_edit(mut self, kind: InheritType, groups: Vec<GroupId>) -> PermResult<Self> {
		self.edit = RootRule::new(kind, groups, &EDIT_TYPES, "edit")?;
		Ok(self)
	}

	/// LoggedInUsers or OnlyTheseUsers (with creator groups)
	pub fn with_create(mut self, kind: InheritType, groups: Vec<GroupId>) -> PermResult<Self> {
		self.create = RootRule::new(kind, groups, &EDIT_TYPES, "create")?;
		Ok(self)
	}

	async fn allows(&self, rule: &RootRule, member: Option<MemberId>) -> PermResult<bool> {
		let member = member.filter(|m| m.is_valid());
		if rule.kind == InheritType::Anyone {
			return Ok(true);
		}
		let Some(member) = member else {
			return Ok(false);
		};
		if self.permissions.check_member(Some(member), &[ADMIN_CODE]).await? {
			return Ok(true);
		}

		match rule.kind {
			InheritType::LoggedInUsers => Ok(true),
			InheritType::OnlyTheseUsers => self.permissions.member_in_groups(member, &rule.groups).await,
			_ => Ok(false),
		}
	}
}

#[async_trait]
impl DefaultPermissionChecker for RootPermissions {
	async fn can_view(&self, member: Option<MemberId>) -> PermResult<bool> {
		self.allows(&self.view, member).await
	}

	async fn can_edit(&self, member: Option<MemberId>) -> PermResult<bool> {
		self.allows(&self.edit, member).await
	}

	async fn can_delete(&self, member: Option<MemberId>) -> PermResult<bool> {
		self.allows(&self.edit, member).await
	}

	async fn can_create(&self, member: Option<MemberId>) -> PermResult<bool> {
		self.allows(&self.create, member).await
	}
}

// vim: ts=4
