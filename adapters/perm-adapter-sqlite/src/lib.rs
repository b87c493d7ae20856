//! SQLite implementation of the authorization graph adapter.
//!
//! Records are stored per `(class, stage)` so a versioned class keeps its
//! Draft and Live rows side by side. Group, member and permission tables are
//! shared by all classes.

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use canopy::{
	perm_adapter::{
		self, CreateGroupData, CreateMemberData, CreateRoleData, Group, Member, Permission,
		PermissionRole, RecordNode, WriteRecordData,
	},
	prelude::*,
	types::{PermissionKind, PolicyField, Stage},
};

mod group;
mod permission;
mod record;
mod schema;
mod utils;

#[derive(Debug)]
pub struct PermAdapterSqlite {
	db: SqlitePool,
}

impl PermAdapterSqlite {
	/// Open (or create) `perm.db` inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> PermResult<Self> {
		tokio::fs::create_dir_all(dir.as_ref()).await?;
		let db_path = dir.as_ref().join("perm.db");

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(&db_path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(utils::inspect)
			.or(Err(Error::DbError))?;

		schema::init_db(&db).await.inspect_err(utils::inspect).or(Err(Error::DbError))?;
		debug!("perm adapter opened at {}", db_path.display());

		Ok(Self { db })
	}
}

#[async_trait]
impl perm_adapter::PermissionAdapter for PermAdapterSqlite {
	// Records
	//*********
	async fn read_records(
		&self,
		class: &str,
		stage: Stage,
		ids: &[RecordId],
	) -> PermResult<Vec<RecordNode>> {
		record::read(&self.db, class, stage, ids).await
	}

	async fn list_group_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		group_ids: &[GroupId],
	) -> PermResult<Vec<RecordId>> {
		record::list_group_linked(&self.db, class, field, ids, group_ids).await
	}

	async fn list_member_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		member_id: MemberId,
	) -> PermResult<Vec<RecordId>> {
		record::list_member_linked(&self.db, class, field, ids, member_id).await
	}

	async fn list_child_records(
		&self,
		class: &str,
		stage: Stage,
		parent_ids: &[RecordId],
	) -> PermResult<Vec<(RecordId, RecordId)>> {
		record::list_children(&self.db, class, stage, parent_ids).await
	}

	async fn write_record(&self, stage: Stage, data: &WriteRecordData<'_>) -> PermResult<()> {
		record::write(&self.db, stage, data).await
	}

	async fn delete_record(
		&self,
		class: &str,
		stage: Stage,
		record_id: RecordId,
	) -> PermResult<()> {
		record::delete(&self.db, class, stage, record_id).await
	}

	async fn link_record_group(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		group_id: GroupId,
	) -> PermResult<()> {
		record::link_group(&self.db, class, record_id, field, group_id).await
	}

	async fn link_record_member(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		member_id: MemberId,
	) -> PermResult<()> {
		record::link_member(&self.db, class, record_id, field, member_id).await
	}

	// Groups and members
	//********************
	async fn read_group(&self, group_id: GroupId) -> PermResult<Group> {
		group::read_group(&self.db, group_id).await
	}

	async fn create_group(&self, data: &CreateGroupData<'_>) -> PermResult<GroupId> {
		group::create_group(&self.db, data).await
	}

	async fn set_group_parent(
		&self,
		group_id: GroupId,
		parent_id: Option<GroupId>,
	) -> PermResult<()> {
		group::set_parent(&self.db, group_id, parent_id).await
	}

	async fn read_member(&self, member_id: MemberId) -> PermResult<Member> {
		group::read_member(&self.db, member_id).await
	}

	async fn create_member(&self, data: &CreateMemberData<'_>) -> PermResult<MemberId> {
		group::create_member(&self.db, data).await
	}

	async fn add_group_member(&self, group_id: GroupId, member_id: MemberId) -> PermResult<()> {
		group::add_member(&self.db, group_id, member_id).await
	}

	async fn remove_group_member(
		&self,
		group_id: GroupId,
		member_id: MemberId,
	) -> PermResult<()> {
		group::remove_member(&self.db, group_id, member_id).await
	}

	async fn list_member_group_ids(&self, member_ids: &[MemberId]) -> PermResult<Vec<GroupId>> {
		group::list_member_group_ids(&self.db, member_ids).await
	}

	async fn list_group_parent_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		group::list_parent_ids(&self.db, group_ids).await
	}

	async fn list_child_group_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		group::list_child_ids(&self.db, group_ids).await
	}

	async fn list_group_member_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<MemberId>> {
		group::list_member_ids(&self.db, group_ids).await
	}

	// Permissions and roles
	//***********************
	async fn write_permission(
		&self,
		group_id: GroupId,
		code: &str,
		kind: PermissionKind,
		arg: i64,
	) -> PermResult<PermissionId> {
		permission::write(&self.db, group_id, code, kind, arg).await
	}

	async fn list_group_permissions(&self, group_ids: &[GroupId]) -> PermResult<Vec<Permission>> {
		permission::list_for_groups(&self.db, group_ids).await
	}

	async fn list_permission_codes(
		&self,
		group_ids: &[GroupId],
		kind: PermissionKind,
	) -> PermResult<Vec<Box<str>>> {
		permission::list_codes(&self.db, group_ids, kind).await
	}

	async fn list_role_codes(&self, group_ids: &[GroupId]) -> PermResult<Vec<Box<str>>> {
		permission::list_role_codes(&self.db, group_ids).await
	}

	async fn find_permission(
		&self,
		codes: &[&str],
		group_ids: &[GroupId],
		kind: PermissionKind,
		args: Option<&[i64]>,
	) -> PermResult<Option<PermissionId>> {
		permission::find(&self.db, codes, group_ids, kind, args).await
	}

	async fn list_groups_by_codes(
		&self,
		codes: &[&str],
		kind: PermissionKind,
	) -> PermResult<Vec<GroupId>> {
		permission::list_groups_by_codes(&self.db, codes, kind).await
	}

	async fn create_role(&self, data: &CreateRoleData<'_>) -> PermResult<RoleId> {
		permission::create_role(&self.db, data).await
	}

	async fn read_role(&self, role_id: RoleId) -> PermResult<PermissionRole> {
		permission::read_role(&self.db, role_id).await
	}

	async fn add_group_role(&self, group_id: GroupId, role_id: RoleId) -> PermResult<()> {
		permission::add_group_role(&self.db, group_id, role_id).await
	}
}

// vim: ts=4
