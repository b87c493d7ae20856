//! Staged records and their viewer/editor link sets

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use canopy::perm_adapter::{RecordNode, WriteRecordData};
use canopy::prelude::*;
use canopy::types::{InheritType, PolicyField, Stage};

use crate::utils::{collect_res, inspect, parent_opt, push_in};

fn row_to_node(row: &SqliteRow) -> PermResult<RecordNode> {
	let record_id: i64 = row.try_get("record_id").inspect_err(inspect).or(Err(Error::DbError))?;
	let parent_id: Option<i64> =
		row.try_get("parent_id").inspect_err(inspect).or(Err(Error::DbError))?;
	let view: &str = row.try_get("can_view_type").inspect_err(inspect).or(Err(Error::DbError))?;
	let edit: &str = row.try_get("can_edit_type").inspect_err(inspect).or(Err(Error::DbError))?;

	Ok(RecordNode {
		record_id: RecordId(record_id),
		parent_id: parent_opt(parent_id).map(RecordId),
		can_view_type: view.parse::<InheritType>().map_err(|_| Error::DbError)?,
		can_edit_type: edit.parse::<InheritType>().map_err(|_| Error::DbError)?,
	})
}

pub(crate) async fn read(
	db: &SqlitePool,
	class: &str,
	stage: Stage,
	ids: &[RecordId],
) -> PermResult<Vec<RecordNode>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT record_id, parent_id, can_view_type, can_edit_type FROM records WHERE class=",
	);
	query.push_bind(class).push(" AND stage=").push_bind(stage.code()).push(" AND record_id IN ");
	query = push_in(query, ids.iter().map(|id| id.0));
	query.push(" ORDER BY record_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	rows.iter().map(row_to_node).collect()
}

pub(crate) async fn list_group_linked(
	db: &SqlitePool,
	class: &str,
	field: PolicyField,
	ids: &[RecordId],
	group_ids: &[GroupId],
) -> PermResult<Vec<RecordId>> {
	if ids.is_empty() || group_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT DISTINCT record_id FROM record_groups WHERE class=");
	query.push_bind(class).push(" AND field=").push_bind(field.code()).push(" AND record_id IN ");
	query = push_in(query, ids.iter().map(|id| id.0));
	query.push(" AND group_id IN ");
	query = push_in(query, group_ids.iter().map(|id| id.0));

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("record_id").map(RecordId)))
}

pub(crate) async fn list_member_linked(
	db: &SqlitePool,
	class: &str,
	field: PolicyField,
	ids: &[RecordId],
	member_id: MemberId,
) -> PermResult<Vec<RecordId>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT DISTINCT record_id FROM record_members WHERE class=");
	query
		.push_bind(class)
		.push(" AND field=")
		.push_bind(field.code())
		.push(" AND member_id=")
		.push_bind(member_id.0)
		.push(" AND record_id IN ");
	query = push_in(query, ids.iter().map(|id| id.0));

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| row.try_get("record_id").map(RecordId)))
}

pub(crate) async fn list_children(
	db: &SqlitePool,
	class: &str,
	stage: Stage,
	parent_ids: &[RecordId],
) -> PermResult<Vec<(RecordId, RecordId)>> {
	if parent_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT record_id, parent_id FROM records WHERE class=");
	query.push_bind(class).push(" AND stage=").push_bind(stage.code()).push(" AND parent_id IN ");
	query = push_in(query, parent_ids.iter().map(|id| id.0));
	query.push(" ORDER BY record_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.iter().map(|row| {
		let child: i64 = row.try_get("record_id")?;
		let parent: i64 = row.try_get("parent_id")?;
		Ok((RecordId(child), RecordId(parent)))
	}))
}

pub(crate) async fn write(
	db: &SqlitePool,
	stage: Stage,
	data: &WriteRecordData<'_>,
) -> PermResult<()> {
	if !data.record_id.is_valid() {
		return Err(Error::ValidationError(format!("invalid record id {}", data.record_id)));
	}

	sqlx::query(
		"INSERT INTO records (class, stage, record_id, parent_id, can_view_type, can_edit_type)
		VALUES (?, ?, ?, ?, ?, ?)
		ON CONFLICT (class, stage, record_id) DO UPDATE SET
			parent_id=excluded.parent_id,
			can_view_type=excluded.can_view_type,
			can_edit_type=excluded.can_edit_type",
	)
	.bind(data.class)
	.bind(stage.code())
	.bind(data.record_id.0)
	.bind(data.parent_id.map(|id| id.0))
	.bind(data.can_view_type.as_str())
	.bind(data.can_edit_type.as_str())
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn delete(
	db: &SqlitePool,
	class: &str,
	stage: Stage,
	record_id: RecordId,
) -> PermResult<()> {
	let res = sqlx::query("DELETE FROM records WHERE class=? AND stage=? AND record_id=?")
		.bind(class)
		.bind(stage.code())
		.bind(record_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn link_group(
	db: &SqlitePool,
	class: &str,
	record_id: RecordId,
	field: PolicyField,
	group_id: GroupId,
) -> PermResult<()> {
	sqlx::query(
		"INSERT OR IGNORE INTO record_groups (class, record_id, field, group_id) VALUES (?, ?, ?, ?)",
	)
	.bind(class)
	.bind(record_id.0)
	.bind(field.code())
	.bind(group_id.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn link_member(
	db: &SqlitePool,
	class: &str,
	record_id: RecordId,
	field: PolicyField,
	member_id: MemberId,
) -> PermResult<()> {
	sqlx::query(
		"INSERT OR IGNORE INTO record_members (class, record_id, field, member_id) VALUES (?, ?, ?, ?)",
	)
	.bind(class)
	.bind(record_id.0)
	.bind(field.code())
	.bind(member_id.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

// vim: ts=4
