//! Permission rows and permission roles

use sqlx::{Row, SqlitePool};

use canopy::perm_adapter::{CreateRoleData, Permission, PermissionRole};
use canopy::prelude::*;
use canopy::types::PermissionKind;

use crate::utils::{collect_res, inspect, map_res, push_in, push_in_str};

pub(crate) async fn write(
	db: &SqlitePool,
	group_id: GroupId,
	code: &str,
	kind: PermissionKind,
	arg: i64,
) -> PermResult<PermissionId> {
	if code.trim().is_empty() {
		return Err(Error::ValidationError("permission code cannot be empty".into()));
	}

	let res = sqlx::query(
		"INSERT INTO permissions (group_id, code, kind, arg) VALUES (?, ?, ?, ?)
		ON CONFLICT (group_id, code, arg) DO UPDATE SET kind=excluded.kind
		RETURNING perm_id",
	)
	.bind(group_id.0)
	.bind(code)
	.bind(kind.code())
	.bind(arg)
	.fetch_one(db)
	.await;

	map_res(res, |row| row.try_get(0).map(PermissionId))
}

pub(crate) async fn list_for_groups(
	db: &SqlitePool,
	group_ids: &[GroupId],
) -> PermResult<Vec<Permission>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT perm_id, group_id, code, kind, arg FROM permissions WHERE group_id IN ",
	);
	query = push_in(query, group_ids.iter().map(|id| id.0));
	query.push(" ORDER BY perm_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	let raw = collect_res(rows.iter().map(|row| {
		Ok((
			row.try_get::<i64, _>("perm_id")?,
			row.try_get::<i64, _>("group_id")?,
			row.try_get::<Box<str>, _>("code")?,
			row.try_get::<i64, _>("kind")?,
			row.try_get::<i64, _>("arg")?,
		))
	}))?;

	raw.into_iter()
		.map(|(perm_id, group_id, code, kind, arg)| {
			Ok(Permission {
				permission_id: PermissionId(perm_id),
				group_id: GroupId(group_id),
				code,
				kind: PermissionKind::from_code(kind).map_err(|_| Error::DbError)?,
				arg,
			})
		})
		.collect()
}

pub(crate) async fn list_codes(
	db: &SqlitePool,
	group_ids: &[GroupId],
	kind: PermissionKind,
) -> PermResult<Vec<Box<str>>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new("SELECT DISTINCT code FROM permissions WHERE kind=");
	query.push_bind(kind.code()).push(" AND group_id IN ");
	query = push_in(query, group_ids.iter().map(|id| id.0));
	query.push(" ORDER BY code");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get::<Box<str>, _>("code")))
}

pub(crate) async fn list_role_codes(
	db: &SqlitePool,
	group_ids: &[GroupId],
) -> PermResult<Vec<Box<str>>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT DISTINCT rc.code FROM role_codes rc
		JOIN group_roles gr ON gr.role_id=rc.role_id
		WHERE gr.group_id IN ",
	);
	query = push_in(query, group_ids.iter().map(|id| id.0));
	query.push(" ORDER BY rc.code");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get::<Box<str>, _>("code")))
}

pub(crate) async fn find(
	db: &SqlitePool,
	codes: &[&str],
	group_ids: &[GroupId],
	kind: PermissionKind,
	args: Option<&[i64]>,
) -> PermResult<Option<PermissionId>> {
	if codes.is_empty() || group_ids.is_empty() {
		return Ok(None);
	}

	let mut query = sqlx::QueryBuilder::new("SELECT perm_id FROM permissions WHERE code IN ");
	query = push_in_str(query, codes);
	query.push(" AND kind=").push_bind(kind.code()).push(" AND group_id IN ");
	query = push_in(query, group_ids.iter().map(|id| id.0));
	if let Some(args) = args {
		query.push(" AND arg IN ");
		query = push_in(query, args.iter().copied());
	}
	query.push(" ORDER BY perm_id LIMIT 1");

	let row =
		query.build().fetch_optional(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	match row {
		Some(row) => {
			Ok(Some(PermissionId(row.try_get(0).inspect_err(inspect).or(Err(Error::DbError))?)))
		}
		None => Ok(None),
	}
}

pub(crate) async fn list_groups_by_codes(
	db: &SqlitePool,
	codes: &[&str],
	kind: PermissionKind,
) -> PermResult<Vec<GroupId>> {
	if codes.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT group_id FROM permissions WHERE kind=");
	query.push_bind(kind.code()).push(" AND code IN ");
	query = push_in_str(query, codes);
	if kind == PermissionKind::Grant {
		query.push(
			" UNION SELECT gr.group_id FROM group_roles gr
			JOIN role_codes rc ON rc.role_id=gr.role_id WHERE rc.code IN ",
		);
		query = push_in_str(query, codes);
	}
	query.push(" ORDER BY group_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("group_id").map(GroupId)))
}

pub(crate) async fn create_role(db: &SqlitePool, data: &CreateRoleData<'_>) -> PermResult<RoleId> {
	if data.title.trim().is_empty() {
		return Err(Error::ValidationError("role title cannot be empty".into()));
	}

	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	let role_id: i64 = sqlx::query(
		"INSERT INTO roles (title, only_admin_can_apply) VALUES (?, ?) RETURNING role_id",
	)
	.bind(data.title)
	.bind(data.only_admin_can_apply)
	.fetch_one(&mut *tx)
	.await
	.and_then(|row| row.try_get(0))
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	for code in data.codes {
		sqlx::query("INSERT OR IGNORE INTO role_codes (role_id, code) VALUES (?, ?)")
			.bind(role_id)
			.bind(*code)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
	}

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(RoleId(role_id))
}

pub(crate) async fn read_role(db: &SqlitePool, role_id: RoleId) -> PermResult<PermissionRole> {
	let res = sqlx::query("SELECT role_id, title, only_admin_can_apply FROM roles WHERE role_id=?")
		.bind(role_id.0)
		.fetch_one(db)
		.await;
	let (title, only_admin_can_apply) = map_res(res, |row| {
		Ok((row.try_get::<Box<str>, _>("title")?, row.try_get::<bool, _>("only_admin_can_apply")?))
	})?;

	let rows = sqlx::query("SELECT code FROM role_codes WHERE role_id=? ORDER BY code")
		.bind(role_id.0)
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	let codes = collect_res(rows.iter().map(|row| row.try_get::<Box<str>, _>("code")))?;

	Ok(PermissionRole { role_id, title, only_admin_can_apply, codes: codes.into_boxed_slice() })
}

pub(crate) async fn add_group_role(
	db: &SqlitePool,
	group_id: GroupId,
	role_id: RoleId,
) -> PermResult<()> {
	sqlx::query("INSERT OR IGNORE INTO group_roles (group_id, role_id) VALUES (?, ?)")
		.bind(group_id.0)
		.bind(role_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(())
}

// vim: ts=4
