//! Adapter that stores the authorization graph: records with their access
//! policies, groups, members, permission rows and roles.
//!
//! The resolver only ever talks to storage through this trait, so any backend
//! able to answer batched ID lookups can drive it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::{
	prelude::*,
	types::{InheritType, PermissionKind, PolicyField, Stage},
};

/// A record as seen by the resolver: its place in the tree and its policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNode {
	pub record_id: RecordId,
	/// None for records at the top of the hierarchy
	pub parent_id: Option<RecordId>,
	pub can_view_type: InheritType,
	pub can_edit_type: InheritType,
}

impl RecordNode {
	pub fn policy(&self, field: PolicyField) -> InheritType {
		match field {
			PolicyField::View => self.can_view_type,
			PolicyField::Edit => self.can_edit_type,
		}
	}
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
	pub group_id: GroupId,
	pub parent_id: Option<GroupId>,
	pub title: Box<str>,
	pub code: Option<Box<str>>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
	pub member_id: MemberId,
	pub email: Box<str>,
	pub first_name: Option<Box<str>>,
	pub surname: Option<Box<str>>,
}

/// A single grant/deny assertion scoped to a group
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
	pub permission_id: PermissionId,
	pub group_id: GroupId,
	pub code: Box<str>,
	pub kind: PermissionKind,
	/// -1 = all records, 0 = unscoped, otherwise a record ID
	pub arg: i64,
}

/// Named bundle of permission codes assignable to groups
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRole {
	pub role_id: RoleId,
	pub title: Box<str>,
	pub only_admin_can_apply: bool,
	pub codes: Box<[Box<str>]>,
}

/// Data needed to write one stage of a record
#[derive(Debug)]
pub struct WriteRecordData<'a> {
	pub class: &'a str,
	pub record_id: RecordId,
	pub parent_id: Option<RecordId>,
	pub can_view_type: InheritType,
	pub can_edit_type: InheritType,
}

#[derive(Debug, Default)]
pub struct CreateGroupData<'a> {
	pub title: &'a str,
	pub code: Option<&'a str>,
	pub parent_id: Option<GroupId>,
}

#[derive(Debug, Default)]
pub struct CreateMemberData<'a> {
	pub email: &'a str,
	pub first_name: Option<&'a str>,
	pub surname: Option<&'a str>,
}

#[derive(Debug)]
pub struct CreateRoleData<'a> {
	pub title: &'a str,
	pub only_admin_can_apply: bool,
	pub codes: &'a [&'a str],
}

#[async_trait]
pub trait PermissionAdapter: Debug + Send + Sync {
	// Records
	//*********

	/// Read the records of `class` in `stage` with the given IDs. Unknown IDs are skipped.
	async fn read_records(
		&self,
		class: &str,
		stage: Stage,
		ids: &[RecordId],
	) -> PermResult<Vec<RecordNode>>;

	/// IDs among `ids` linked to any of `group_ids` through the viewer/editor group set
	async fn list_group_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		group_ids: &[GroupId],
	) -> PermResult<Vec<RecordId>>;

	/// IDs among `ids` linked to `member_id` through the viewer/editor member set
	async fn list_member_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		member_id: MemberId,
	) -> PermResult<Vec<RecordId>>;

	/// Children of the given parents as (child, parent) pairs
	async fn list_child_records(
		&self,
		class: &str,
		stage: Stage,
		parent_ids: &[RecordId],
	) -> PermResult<Vec<(RecordId, RecordId)>>;

	async fn write_record(&self, stage: Stage, data: &WriteRecordData<'_>) -> PermResult<()>;
	async fn delete_record(&self, class: &str, stage: Stage, record_id: RecordId)
	-> PermResult<()>;
	async fn link_record_group(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		group_id: GroupId,
	) -> PermResult<()>;
	async fn link_record_member(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		member_id: MemberId,
	) -> PermResult<()>;

	// Groups and members
	//********************
	async fn read_group(&self, group_id: GroupId) -> PermResult<Group>;
	async fn create_group(&self, data: &CreateGroupData<'_>) -> PermResult<GroupId>;
	/// Move a group under another parent (or to the top with None)
	async fn set_group_parent(&self, group_id: GroupId, parent_id: Option<GroupId>)
	-> PermResult<()>;
	async fn read_member(&self, member_id: MemberId) -> PermResult<Member>;
	async fn create_member(&self, data: &CreateMemberData<'_>) -> PermResult<MemberId>;
	async fn add_group_member(&self, group_id: GroupId, member_id: MemberId) -> PermResult<()>;
	async fn remove_group_member(&self, group_id: GroupId, member_id: MemberId)
	-> PermResult<()>;

	/// Groups the members belong to directly (no hierarchy expansion)
	async fn list_member_group_ids(&self, member_ids: &[MemberId]) -> PermResult<Vec<GroupId>>;

	/// Distinct non-empty parents of the given groups
	async fn list_group_parent_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>>;

	/// Direct children of the given groups
	async fn list_child_group_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>>;

	/// Direct members of the given groups
	async fn list_group_member_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<MemberId>>;

	// Permissions and roles
	//***********************

	/// Insert or update the row for (group, code, arg)
	async fn write_permission(
		&self,
		group_id: GroupId,
		code: &str,
		kind: PermissionKind,
		arg: i64,
	) -> PermResult<PermissionId>;

	async fn list_group_permissions(&self, group_ids: &[GroupId]) -> PermResult<Vec<Permission>>;

	/// Codes of `kind` rows attached to any of the groups
	async fn list_permission_codes(
		&self,
		group_ids: &[GroupId],
		kind: PermissionKind,
	) -> PermResult<Vec<Box<str>>>;

	/// Codes granted to the groups through their roles
	async fn list_role_codes(&self, group_ids: &[GroupId]) -> PermResult<Vec<Box<str>>>;

	/// First `kind` row matching any code for any group, optionally restricted to args
	async fn find_permission(
		&self,
		codes: &[&str],
		group_ids: &[GroupId],
		kind: PermissionKind,
		args: Option<&[i64]>,
	) -> PermResult<Option<PermissionId>>;

	/// Groups holding any of the codes, directly or through a role
	async fn list_groups_by_codes(
		&self,
		codes: &[&str],
		kind: PermissionKind,
	) -> PermResult<Vec<GroupId>>;

	async fn create_role(&self, data: &CreateRoleData<'_>) -> PermResult<RoleId>;
	async fn read_role(&self, role_id: RoleId) -> PermResult<PermissionRole>;
	async fn add_group_role(&self, group_id: GroupId, role_id: RoleId) -> PermResult<()>;
}


// vim: ts=4
