//! Permission row and role tests

use canopy::perm_adapter::{CreateGroupData, CreateRoleData, PermissionAdapter};
use canopy::prelude::*;
use canopy::types::{PermissionKind, ARG_ALL, ARG_NONE};
use canopy_perm_adapter_sqlite::PermAdapterSqlite;
use tempfile::TempDir;

async fn create_test_adapter() -> (PermAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = PermAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

async fn create_group(adapter: &PermAdapterSqlite, title: &str) -> GroupId {
	adapter
		.create_group(&CreateGroupData { title, ..Default::default() })
		.await
		.expect("Failed to create group")
}

#[tokio::test]
async fn test_write_permission_upserts_kind() {
	let (adapter, _temp) = create_test_adapter().await;
	let group = create_group(&adapter, "Editors").await;

	let first = adapter
		.write_permission(group, "CMS_ACCESS", PermissionKind::Grant, ARG_NONE)
		.await
		.expect("grant");
	let second = adapter
		.write_permission(group, "CMS_ACCESS", PermissionKind::Deny, ARG_NONE)
		.await
		.expect("deny");
	assert_eq!(first, second, "Same (group, code, arg) keeps a single row");

	let perms = adapter.list_group_permissions(&[group]).await.expect("list");
	assert_eq!(perms.len(), 1);
	assert_eq!(perms[0].kind, PermissionKind::Deny);
	assert_eq!(&*perms[0].code, "CMS_ACCESS");

	// A different arg is a separate row
	adapter.write_permission(group, "CMS_ACCESS", PermissionKind::Grant, 42).await.expect("grant scoped");
	assert_eq!(adapter.list_group_permissions(&[group]).await.expect("list").len(), 2);

	let empty = adapter.write_permission(group, " ", PermissionKind::Grant, ARG_NONE).await;
	assert!(matches!(empty, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_list_permission_codes_by_kind() {
	let (adapter, _temp) = create_test_adapter().await;
	let g1 = create_group(&adapter, "One").await;
	let g2 = create_group(&adapter, "Two").await;

	adapter.write_permission(g1, "B_CODE", PermissionKind::Grant, ARG_NONE).await.expect("grant");
	adapter.write_permission(g2, "A_CODE", PermissionKind::Grant, ARG_NONE).await.expect("grant");
	adapter.write_permission(g2, "B_CODE", PermissionKind::Grant, ARG_NONE).await.expect("grant");
	adapter.write_permission(g2, "C_CODE", PermissionKind::Deny, ARG_NONE).await.expect("deny");

	let granted = adapter.list_permission_codes(&[g1, g2], PermissionKind::Grant).await.expect("list");
	let granted: Vec<&str> = granted.iter().map(AsRef::as_ref).collect();
	assert_eq!(granted, vec!["A_CODE", "B_CODE"]);

	let denied = adapter.list_permission_codes(&[g1, g2], PermissionKind::Deny).await.expect("list");
	assert_eq!(denied.len(), 1);
	assert_eq!(&*denied[0], "C_CODE");

	assert!(adapter.list_permission_codes(&[], PermissionKind::Grant).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_find_permission_with_args() {
	let (adapter, _temp) = create_test_adapter().await;
	let group = create_group(&adapter, "Editors").await;

	adapter.write_permission(group, "EDIT_PAGE", PermissionKind::Grant, 5).await.expect("grant");
	adapter.write_permission(group, "PUBLISH", PermissionKind::Grant, ARG_ALL).await.expect("grant");

	let scoped = adapter
		.find_permission(&["EDIT_PAGE"], &[group], PermissionKind::Grant, Some(&[ARG_ALL, 5]))
		.await
		.expect("find");
	assert!(scoped.is_some());

	let other_record = adapter
		.find_permission(&["EDIT_PAGE"], &[group], PermissionKind::Grant, Some(&[ARG_ALL, 6]))
		.await
		.expect("find");
	assert!(other_record.is_none());

	let all = adapter
		.find_permission(&["PUBLISH", "MISSING"], &[group], PermissionKind::Grant, Some(&[ARG_ALL]))
		.await
		.expect("find");
	assert!(all.is_some());

	let any_arg = adapter
		.find_permission(&["EDIT_PAGE"], &[group], PermissionKind::Grant, None)
		.await
		.expect("find");
	assert!(any_arg.is_some());

	let wrong_kind = adapter
		.find_permission(&["EDIT_PAGE"], &[group], PermissionKind::Deny, None)
		.await
		.expect("find");
	assert!(wrong_kind.is_none());
}

#[tokio::test]
async fn test_roles() {
	let (adapter, _temp) = create_test_adapter().await;
	let group = create_group(&adapter, "Authors").await;

	let role = adapter
		.create_role(&CreateRoleData {
			title: "Content author",
			only_admin_can_apply: false,
			codes: &["CMS_ACCESS", "SITETREE_REORGANISE"],
		})
		.await
		.expect("create role");

	let read = adapter.read_role(role).await.expect("read role");
	assert_eq!(&*read.title, "Content author");
	assert!(!read.only_admin_can_apply);
	assert_eq!(read.codes.len(), 2);

	assert!(adapter.list_role_codes(&[group]).await.expect("codes").is_empty());
	adapter.add_group_role(group, role).await.expect("assign");
	adapter.add_group_role(group, role).await.expect("assign twice");

	let codes = adapter.list_role_codes(&[group]).await.expect("codes");
	let codes: Vec<&str> = codes.iter().map(AsRef::as_ref).collect();
	assert_eq!(codes, vec!["CMS_ACCESS", "SITETREE_REORGANISE"]);

	assert!(matches!(adapter.read_role(RoleId(999)).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_list_groups_by_codes_includes_roles() {
	let (adapter, _temp) = create_test_adapter().await;
	let direct = create_group(&adapter, "Direct").await;
	let via_role = create_group(&adapter, "Via role").await;
	let denied = create_group(&adapter, "Denied").await;

	adapter.write_permission(direct, "CMS_ACCESS", PermissionKind::Grant, ARG_NONE).await.expect("grant");
	adapter.write_permission(denied, "CMS_ACCESS", PermissionKind::Deny, ARG_NONE).await.expect("deny");
	let role = adapter
		.create_role(&CreateRoleData { title: "Access", only_admin_can_apply: false, codes: &["CMS_ACCESS"] })
		.await
		.expect("role");
	adapter.add_group_role(via_role, role).await.expect("assign");

	let granted = adapter.list_groups_by_codes(&["CMS_ACCESS"], PermissionKind::Grant).await.expect("list");
	assert_eq!(granted, vec![direct, via_role]);

	let deny_rows = adapter.list_groups_by_codes(&["CMS_ACCESS"], PermissionKind::Deny).await.expect("list");
	assert_eq!(deny_rows, vec![denied]);
}

// vim: ts=4
