//! In-process LRU implementation of the permission cache store

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;

use canopy_types::cache_adapter::CacheAdapter;

use crate::prelude::*;

/// Bounded in-memory cache store. Contents are lost with the process.
pub struct MemoryCacheAdapter {
	entries: parking_lot::Mutex<LruCache<String, String>>,
}

impl MemoryCacheAdapter {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
		Self { entries: parking_lot::Mutex::new(LruCache::new(capacity)) }
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl Default for MemoryCacheAdapter {
	fn default() -> Self {
		Self::new(1000)
	}
}

impl std::fmt::Debug for MemoryCacheAdapter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.entries.lock();
		f.debug_struct("MemoryCacheAdapter")
			.field("len", &entries.len())
			.field("cap", &entries.cap())
			.finish()
	}
}

#[async_trait]
impl CacheAdapter for MemoryCacheAdapter {
	async fn get(&self, key: &str) -> PermResult<Option<String>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> PermResult<()> {
		self.entries.lock().put(key.to_string(), value.to_string());
		Ok(())
	}

	async fn delete(&self, key: &str) -> PermResult<()> {
		self.entries.lock().pop(key);
		Ok(())
	}

	async fn clear(&self) -> PermResult<()> {
		self.entries.lock().clear();
		Ok(())
	}
}


// vim: ts=4
