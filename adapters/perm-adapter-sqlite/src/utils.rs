//! Shared utilities for the SQLite adapter
//!
//! Helper functions and error mapping used across all domain modules.

use canopy::prelude::*;
use sqlx::sqlite::SqliteRow;

/// Build an IN clause with parameterized integer values
pub(crate) fn push_in<'a>(
	mut query: sqlx::QueryBuilder<'a, sqlx::Sqlite>,
	values: impl IntoIterator<Item = i64>,
) -> sqlx::QueryBuilder<'a, sqlx::Sqlite> {
	query.push("(");
	for (i, value) in values.into_iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(value);
	}
	query.push(")");
	query
}

/// Build an IN clause with parameterized string values
pub(crate) fn push_in_str<'a>(
	mut query: sqlx::QueryBuilder<'a, sqlx::Sqlite>,
	values: &'a [&'a str],
) -> sqlx::QueryBuilder<'a, sqlx::Sqlite> {
	query.push("(");
	for (i, value) in values.iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(*value);
	}
	query.push(")");
	query
}

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating SQL errors to PermResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> PermResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of query results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>> + Unpin,
) -> PermResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Treat a stored 0/NULL parent as "no parent"
pub(crate) fn parent_opt(parent_id: Option<i64>) -> Option<i64> {
	parent_id.filter(|id| *id > 0)
}

// vim: ts=4
