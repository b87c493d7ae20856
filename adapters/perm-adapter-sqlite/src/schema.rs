//! Database schema initialization
//!
//! Creates the tables and indexes holding the authorization graph.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Records
	//*********
	// One row per (class, stage, record). Unversioned classes only use stage 'D'.
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS records (
		class text NOT NULL,
		stage char(1) NOT NULL,
		record_id integer NOT NULL,
		parent_id integer,
		can_view_type text NOT NULL DEFAULT 'Inherit',
		can_edit_type text NOT NULL DEFAULT 'Inherit',
		PRIMARY KEY(class, stage, record_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_records_parent ON records(class, stage, parent_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Viewer/editor link sets. field: 'V' = view, 'E' = edit
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS record_groups (
		class text NOT NULL,
		record_id integer NOT NULL,
		field char(1) NOT NULL,
		group_id integer NOT NULL,
		PRIMARY KEY(class, record_id, field, group_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS record_members (
		class text NOT NULL,
		record_id integer NOT NULL,
		field char(1) NOT NULL,
		member_id integer NOT NULL,
		PRIMARY KEY(class, record_id, field, member_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Groups and members
	//********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS perm_groups (
		group_id integer NOT NULL,
		parent_id integer,
		title text NOT NULL,
		code text,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_perm_groups_parent ON perm_groups(parent_id)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS members (
		member_id integer NOT NULL,
		email text NOT NULL,
		first_name text,
		surname text,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(member_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_members_email ON members(email)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_members (
		group_id integer NOT NULL,
		member_id integer NOT NULL,
		PRIMARY KEY(group_id, member_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_group_members_member ON group_members(member_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Permissions and roles
	//***********************
	// kind: 1 = grant, -1 = deny, 0 = inherit. arg: -1 = all, 0 = unscoped, else record ID
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS permissions (
		perm_id integer NOT NULL,
		group_id integer NOT NULL,
		code text NOT NULL,
		kind integer NOT NULL DEFAULT 1,
		arg integer NOT NULL DEFAULT 0,
		PRIMARY KEY(perm_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_permissions_group_code_arg ON permissions(group_id, code, arg)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_permissions_code ON permissions(code)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS roles (
		role_id integer NOT NULL,
		title text NOT NULL,
		only_admin_can_apply boolean NOT NULL DEFAULT 0,
		PRIMARY KEY(role_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS role_codes (
		role_id integer NOT NULL,
		code text NOT NULL,
		PRIMARY KEY(role_id, code)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_roles (
		group_id integer NOT NULL,
		role_id integer NOT NULL,
		PRIMARY KEY(group_id, role_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
