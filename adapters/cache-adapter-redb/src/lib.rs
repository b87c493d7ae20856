//! Redb-based permission cache store
//!
//! Implements the CacheAdapter trait on top of a single redb file
//! (`{storage_path}/perm_cache.db`). Entries are opaque strings: the
//! resolver stores one JSON map of record ID -> allowed per
//! `{type}-{class}-{member}` key.

use async_trait::async_trait;
use canopy::cache_adapter::CacheAdapter;
use canopy::error::{Error as PermError, PermResult};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

mod error;
pub use error::Error;

mod tables {
	use redb::TableDefinition;

	/// Cached permission maps: cache_key -> json
	pub const TABLE_ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("perm_cache");
}

use tables::TABLE_ENTRIES;

fn db_err(context: &str, err: impl std::fmt::Display) -> PermError {
	PermError::from(Error::DbError(format!("{}: {}", context, err)))
}

/// Persistent permission cache backed by a redb file
pub struct CacheAdapterRedb {
	storage_path: PathBuf,
	db: redb::Database,
}

impl CacheAdapterRedb {
	pub async fn new(storage_path: impl AsRef<Path>) -> PermResult<Self> {
		let storage_path = storage_path.as_ref().to_path_buf();
		tokio::fs::create_dir_all(&storage_path).await.map_err(Error::from)?;

		let db = redb::Database::create(storage_path.join("perm_cache.db"))
			.map_err(|e| db_err("Failed to open database", e))?;

		// Create the table up front so readers never see a missing table
		let tx = db.begin_write().map_err(|e| db_err("Failed to begin write transaction", e))?;
		tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;
		tx.commit().map_err(|e| db_err("Failed to commit table creation", e))?;

		debug!("Initializing permission cache at {:?}", storage_path);
		Ok(Self { storage_path, db })
	}

	pub fn storage_path(&self) -> &Path {
		&self.storage_path
	}

	/// Number of stored entries
	pub fn len(&self) -> PermResult<u64> {
		let tx = self.db.begin_read().map_err(|e| db_err("Failed to begin read transaction", e))?;
		let table = tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;
		table.len().map_err(|e| db_err("Failed to count entries", e))
	}

	pub fn is_empty(&self) -> PermResult<bool> {
		Ok(self.len()? == 0)
	}
}

impl std::fmt::Debug for CacheAdapterRedb {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CacheAdapterRedb").field("storage_path", &self.storage_path).finish()
	}
}

#[async_trait]
impl CacheAdapter for CacheAdapterRedb {
	async fn get(&self, key: &str) -> PermResult<Option<String>> {
		let tx = self.db.begin_read().map_err(|e| db_err("Failed to begin read transaction", e))?;
		let table = tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;

		let value = table
			.get(key)
			.map_err(|e| db_err("Failed to read entry", e))?
			.map(|guard| guard.value().to_string());
		trace!("cache get {} -> {}", key, if value.is_some() { "hit" } else { "miss" });
		Ok(value)
	}

	async fn set(&self, key: &str, value: &str) -> PermResult<()> {
		let tx = self.db.begin_write().map_err(|e| db_err("Failed to begin write transaction", e))?;
		{
			let mut table =
				tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;
			table.insert(key, value).map_err(|e| db_err("Failed to store entry", e))?;
		}
		tx.commit().map_err(|e| db_err("Failed to commit entry", e))?;
		trace!("cache set {}", key);
		Ok(())
	}

	async fn delete(&self, key: &str) -> PermResult<()> {
		let tx = self.db.begin_write().map_err(|e| db_err("Failed to begin write transaction", e))?;
		{
			let mut table =
				tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;
			table.remove(key).map_err(|e| db_err("Failed to delete entry", e))?;
		}
		tx.commit().map_err(|e| db_err("Failed to commit deletion", e))?;
		Ok(())
	}

	async fn clear(&self) -> PermResult<()> {
		let tx = self.db.begin_write().map_err(|e| db_err("Failed to begin write transaction", e))?;
		let removed = {
			let mut table =
				tx.open_table(TABLE_ENTRIES).map_err(|e| db_err("Failed to open table", e))?;

			let mut keys = Vec::new();
			for item in table.iter().map_err(|e| db_err("Failed to iterate entries", e))? {
				let (key, _) = item.map_err(|e| db_err("Failed to read entry", e))?;
				keys.push(key.value().to_string());
			}
			for key in &keys {
				table.remove(key.as_str()).map_err(|e| db_err("Failed to delete entry", e))?;
			}
			keys.len()
		};
		tx.commit().map_err(|e| db_err("Failed to commit clear", e))?;
		debug!("cleared {} permission cache entries", removed);
		Ok(())
	}
}

// vim: ts=4
