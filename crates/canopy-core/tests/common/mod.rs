//! Shared fixtures for the resolver integration tests
//!
//! Every fixture owns a `TempDir`; keep it alive for the whole test.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use canopy_core::{PermissionConfig, PermissionService};
use canopy_perm_adapter_sqlite::PermAdapterSqlite;
use canopy_types::perm_adapter::{
	CreateGroupData, CreateMemberData, CreateRoleData, Group, Member, Permission,
	PermissionAdapter, PermissionRole, RecordNode, WriteRecordData,
};
use canopy_types::prelude::*;
use canopy_types::types::{InheritType, PermissionKind, PolicyField, Stage};

pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

/// Wraps a real adapter and counts every call made through it
#[derive(Debug)]
pub struct CountingAdapter {
	inner: Arc<dyn PermissionAdapter>,
	calls: AtomicUsize,
}

impl CountingAdapter {
	pub fn new(inner: Arc<dyn PermissionAdapter>) -> Self {
		Self { inner, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn reset(&self) {
		self.calls.store(0, Ordering::SeqCst);
	}

	fn hit(&self) -> &dyn PermissionAdapter {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.as_ref()
	}
}

#[async_trait]
impl PermissionAdapter for CountingAdapter {
	async fn read_records(&self, class: &str, stage: Stage, ids: &[RecordId]) -> PermResult<Vec<RecordNode>> {
		self.hit().read_records(class, stage, ids).await
	}

	async fn list_group_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		group_ids: &[GroupId],
	) -> PermResult<Vec<RecordId>> {
		self.hit().list_group_linked_records(class, field, ids, group_ids).await
	}

	async fn list_member_linked_records(
		&self,
		class: &str,
		field: PolicyField,
		ids: &[RecordId],
		member_id: MemberId,
	) -> PermResult<Vec<RecordId>> {
		self.hit().list_member_linked_records(class, field, ids, member_id).await
	}

	async fn list_child_records(
		&self,
		class: &str,
		stage: Stage,
		parent_ids: &[RecordId],
	) -> PermResult<Vec<(RecordId, RecordId)>> {
		self.hit().list_child_records(class, stage, parent_ids).await
	}

	async fn write_record(&self, stage: Stage, data: &WriteRecordData<'_>) -> PermResult<()> {
		self.hit().write_record(stage, data).await
	}

	async fn delete_record(&self, class: &str, stage: Stage, record_id: RecordId) -> PermResult<()> {
		self.hit().delete_record(class, stage, record_id).await
	}

	async fn link_record_group(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		group_id: GroupId,
	) -> PermResult<()> {
		self.hit().link_record_group(class, record_id, field, group_id).await
	}

	async fn link_record_member(
		&self,
		class: &str,
		record_id: RecordId,
		field: PolicyField,
		member_id: MemberId,
	) -> PermResult<()> {
		self.hit().link_record_member(class, record_id, field, member_id).await
	}

	async fn read_group(&self, group_id: GroupId) -> PermResult<Group> {
		self.hit().read_group(group_id).await
	}

	async fn create_group(&self, data: &CreateGroupData<'_>) -> PermResult<GroupId> {
		self.hit().create_group(data).await
	}

	async fn set_group_parent(&self, group_id: GroupId, parent_id: Option<GroupId>) -> PermResult<()> {
		self.hit().set_group_parent(group_id, parent_id).await
	}

	async fn read_member(&self, member_id: MemberId) -> PermResult<Member> {
		self.hit().read_member(member_id).await
	}

	async fn create_member(&self, data: &CreateMemberData<'_>) -> PermResult<MemberId> {
		self.hit().create_member(data).await
	}

	async fn add_group_member(&self, group_id: GroupId, member_id: MemberId) -> PermResult<()> {
		self.hit().add_group_member(group_id, member_id).await
	}

	async fn remove_group_member(&self, group_id: GroupId, member_id: MemberId) -> PermResult<()> {
		self.hit().remove_group_member(group_id, member_id).await
	}

	async fn list_member_group_ids(&self, member_ids: &[MemberId]) -> PermResult<Vec<GroupId>> {
		self.hit().list_member_group_ids(member_ids).await
	}

	async fn list_group_parent_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		self.hit().list_group_parent_ids(group_ids).await
	}

	async fn list_child_group_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		self.hit().list_child_group_ids(group_ids).await
	}

	async fn list_group_member_ids(&self, group_ids: &[GroupId]) -> PermResult<Vec<MemberId>> {
		self.hit().list_group_member_ids(group_ids).await
	}

	async fn write_permission(
		&self,
		group_id: GroupId,
		code: &str,
		kind: PermissionKind,
		arg: i64,
	) -> PermResult<PermissionId> {
		self.hit().write_permission(group_id, code, kind, arg).await
	}

	async fn list_group_permissions(&self, group_ids: &[GroupId]) -> PermResult<Vec<Permission>> {
		self.hit().list_group_permissions(group_ids).await
	}

	async fn list_permission_codes(
		&self,
		group_ids: &[GroupId],
		kind: PermissionKind,
	) -> PermResult<Vec<Box<str>>> {
		self.hit().list_permission_codes(group_ids, kind).await
	}

	async fn list_role_codes(&self, group_ids: &[GroupId]) -> PermResult<Vec<Box<str>>> {
		self.hit().list_role_codes(group_ids).await
	}

	async fn find_permission(
		&self,
		codes: &[&str],
		group_ids: &[GroupId],
		kind: PermissionKind,
		args: Option<&[i64]>,
	) -> PermResult<Option<PermissionId>> {
		self.hit().find_permission(codes, group_ids, kind, args).await
	}

	async fn list_groups_by_codes(&self, codes: &[&str], kind: PermissionKind) -> PermResult<Vec<GroupId>> {
		self.hit().list_groups_by_codes(codes, kind).await
	}

	async fn create_role(&self, data: &CreateRoleData<'_>) -> PermResult<RoleId> {
		self.hit().create_role(data).await
	}

	async fn read_role(&self, role_id: RoleId) -> PermResult<PermissionRole> {
		self.hit().read_role(role_id).await
	}

	async fn add_group_role(&self, group_id: GroupId, role_id: RoleId) -> PermResult<()> {
		self.hit().add_group_role(group_id, role_id).await
	}
}

/// A SQLite-backed permission service behind a counting adapter
pub struct Fixture {
	pub adapter: Arc<CountingAdapter>,
	pub permissions: Arc<PermissionService>,
	pub temp_dir: TempDir,
}

pub async fn create_fixture() -> Fixture {
	create_fixture_with(PermissionConfig::default()).await
}

pub async fn create_fixture_with(config: PermissionConfig) -> Fixture {
	setup_test_logging();
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let sqlite = PermAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	let adapter = Arc::new(CountingAdapter::new(Arc::new(sqlite)));
	let permissions = Arc::new(PermissionService::new(adapter.clone(), Arc::new(config)));
	Fixture { adapter, permissions, temp_dir }
}

impl Fixture {
	pub async fn record(&self, class: &str, stage: Stage, id: i64, parent: Option<i64>, view: InheritType, edit: InheritType) {
		let data = WriteRecordData {
			class,
			record_id: RecordId(id),
			parent_id: parent.map(RecordId),
			can_view_type: view,
			can_edit_type: edit,
		};
		self.adapter.write_record(stage, &data).await.expect("write record");
	}

	/// A Draft `Page` record
	pub async fn page(&self, id: i64, parent: Option<i64>, view: InheritType, edit: InheritType) {
		self.record("Page", Stage::Draft, id, parent, view, edit).await;
	}

	pub async fn group(&self, title: &str, parent: Option<GroupId>) -> GroupId {
		self.adapter
			.create_group(&CreateGroupData { title, code: None, parent_id: parent })
			.await
			.expect("create group")
	}

	pub async fn member(&self, email: &str, groups: &[GroupId]) -> MemberId {
		let member_id = self
			.adapter
			.create_member(&CreateMemberData { email, ..Default::default() })
			.await
			.expect("create member");
		for group in groups {
			self.permissions.add_member(*group, member_id).await.expect("add member");
		}
		member_id
	}
}

// vim: ts=4
