//! Groups, members and group membership

use sqlx::{Row, SqlitePool};

use canopy::perm_adapter::{CreateGroupData, CreateMemberData, Group, Member};
use canopy::prelude::*;

use crate::utils::{collect_res, inspect, map_res, parent_opt, push_in};

pub(crate) async fn read_group(db: &SqlitePool, group_id: GroupId) -> PermResult<Group> {
	let res = sqlx::query("SELECT group_id, parent_id, title, code FROM perm_groups WHERE group_id=?")
		.bind(group_id.0)
		.fetch_one(db)
		.await;

	map_res(res, |row| {
		Ok(Group {
			group_id: GroupId(row.try_get("group_id")?),
			parent_id: parent_opt(row.try_get("parent_id")?).map(GroupId),
			title: row.try_get("title")?,
			code: row.try_get("code")?,
		})
	})
}

pub(crate) async fn create_group(
	db: &SqlitePool,
	data: &CreateGroupData<'_>,
) -> PermResult<GroupId> {
	if let Some(parent_id) = data.parent_id {
		match read_group(db, parent_id).await {
			Ok(_) => {}
			Err(Error::NotFound) => {
				return Err(Error::ValidationError(format!(
					"parent group {} does not exist",
					parent_id
				)));
			}
			Err(err) => return Err(err),
		}
	}

	let res = sqlx::query(
		"INSERT INTO perm_groups (parent_id, title, code) VALUES (?, ?, ?) RETURNING group_id",
	)
	.bind(data.parent_id.map(|id| id.0))
	.bind(data.title)
	.bind(data.code)
	.fetch_one(db)
	.await;

	map_res(res, |row| row.try_get(0).map(GroupId))
}

pub(crate) async fn set_parent(
	db: &SqlitePool,
	group_id: GroupId,
	parent_id: Option<GroupId>,
) -> PermResult<()> {
	let res = sqlx::query("UPDATE perm_groups SET parent_id=? WHERE group_id=?")
		.bind(parent_id.map(|id| id.0))
		.bind(group_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn read_member(db: &SqlitePool, member_id: MemberId) -> PermResult<Member> {
	let res =
		sqlx::query("SELECT member_id, email, first_name, surname FROM members WHERE member_id=?")
			.bind(member_id.0)
			.fetch_one(db)
			.await;

	map_res(res, |row| {
		Ok(Member {
			member_id: MemberId(row.try_get("member_id")?),
			email: row.try_get("email")?,
			first_name: row.try_get("first_name")?,
			surname: row.try_get("surname")?,
		})
	})
}

pub(crate) async fn create_member(
	db: &SqlitePool,
	data: &CreateMemberData<'_>,
) -> PermResult<MemberId> {
	if data.email.trim().is_empty() {
		return Err(Error::ValidationError("member email cannot be empty".into()));
	}

	let res = sqlx::query(
		"INSERT INTO members (email, first_name, surname) VALUES (?, ?, ?) RETURNING member_id",
	)
	.bind(data.email)
	.bind(data.first_name)
	.bind(data.surname)
	.fetch_one(db)
	.await;

	map_res(res, |row| row.try_get(0).map(MemberId))
}

pub(crate) async fn add_member(
	db: &SqlitePool,
	group_id: GroupId,
	member_id: MemberId,
) -> PermResult<()> {
	sqlx::query("INSERT OR IGNORE INTO group_members (group_id, member_id) VALUES (?, ?)")
		.bind(group_id.0)
		.bind(member_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn remove_member(
	db: &SqlitePool,
	group_id: GroupId,
	member_id: MemberId,
) -> PermResult<()> {
	sqlx::query("DELETE FROM group_members WHERE group_id=? AND member_id=?")
		.bind(group_id.0)
		.bind(member_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn list_member_group_ids(
	db: &SqlitePool,
	member_ids: &[MemberId],
) -> PermResult<Vec<GroupId>> {
	if member_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT DISTINCT group_id FROM group_members WHERE member_id IN ");
	query = push_in(query, member_ids.iter().map(|id| id.0));
	query.push(" ORDER BY group_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("group_id").map(GroupId)))
}

pub(crate) async fn list_parent_ids(
	db: &SqlitePool,
	group_ids: &[GroupId],
) -> PermResult<Vec<GroupId>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT DISTINCT parent_id FROM perm_groups WHERE parent_id > 0 AND group_id IN ",
	);
	query = push_in(query, group_ids.iter().map(|id| id.0));

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("parent_id").map(GroupId)))
}

pub(crate) async fn list_child_ids(
	db: &SqlitePool,
	group_ids: &[GroupId],
) -> PermResult<Vec<GroupId>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new("SELECT group_id FROM perm_groups WHERE parent_id IN ");
	query = push_in(query, group_ids.iter().map(|id| id.0));

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("group_id").map(GroupId)))
}

pub(crate) async fn list_member_ids(
	db: &SqlitePool,
	group_ids: &[GroupId],
) -> PermResult<Vec<MemberId>> {
	if group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT DISTINCT member_id FROM group_members WHERE group_id IN ");
	query = push_in(query, group_ids.iter().map(|id| id.0));
	query.push(" ORDER BY member_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("member_id").map(MemberId)))
}

// vim: ts=4
