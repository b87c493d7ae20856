//! Key-value store used to persist resolved permission maps between resolver instances.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// Simple cache interface. Values are opaque strings (the resolver stores JSON).
#[async_trait]
pub trait CacheAdapter: Debug + Send + Sync {
	async fn get(&self, key: &str) -> PermResult<Option<String>>;
	async fn set(&self, key: &str, value: &str) -> PermResult<()>;
	async fn delete(&self, key: &str) -> PermResult<()>;
	async fn clear(&self) -> PermResult<()>;
}

// vim: ts=4
