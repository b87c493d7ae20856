//! Basic cache store operation tests

use canopy::cache_adapter::CacheAdapter;
use canopy_cache_adapter_redb::CacheAdapterRedb;
use tempfile::TempDir;

async fn create_test_adapter() -> (CacheAdapterRedb, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = CacheAdapterRedb::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_set_and_get() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.set("edit-Page-7", r#"{"1":true}"#).await.expect("Failed to set");
	let value = adapter.get("edit-Page-7").await.expect("Failed to get");
	assert_eq!(value.as_deref(), Some(r#"{"1":true}"#));

	assert!(adapter.get("view-Page-7").await.expect("Failed to get").is_none());
}

#[tokio::test]
async fn test_overwrite() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.set("k", "a").await.expect("Failed to set");
	adapter.set("k", "b").await.expect("Failed to set");
	assert_eq!(adapter.get("k").await.expect("Failed to get").as_deref(), Some("b"));
	assert_eq!(adapter.len().expect("len"), 1);
}

#[tokio::test]
async fn test_delete_only_named_key() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.set("view-Page-7", "{}").await.expect("Failed to set");
	adapter.set("view-Page-8", "{}").await.expect("Failed to set");
	adapter.delete("view-Page-7").await.expect("Failed to delete");
	// Deleting a missing key is not an error
	adapter.delete("view-Page-9").await.expect("Failed to delete");

	assert!(adapter.get("view-Page-7").await.expect("get").is_none());
	assert!(adapter.get("view-Page-8").await.expect("get").is_some());
}

#[tokio::test]
async fn test_clear() {
	let (adapter, _temp) = create_test_adapter().await;

	for i in 0..5 {
		adapter.set(&format!("key-{}", i), "{}").await.expect("Failed to set");
	}
	assert_eq!(adapter.len().expect("len"), 5);

	adapter.clear().await.expect("Failed to clear");
	assert!(adapter.is_empty().expect("is_empty"));
}

#[tokio::test]
async fn test_entries_survive_reopen() {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");

	{
		let adapter = CacheAdapterRedb::new(temp_dir.path()).await.expect("Failed to create adapter");
		adapter.set("delete-Page-3", r#"{"4":false}"#).await.expect("Failed to set");
	}

	let adapter = CacheAdapterRedb::new(temp_dir.path()).await.expect("Failed to reopen adapter");
	assert_eq!(
		adapter.get("delete-Page-3").await.expect("get").as_deref(),
		Some(r#"{"4":false}"#)
	);
	assert_eq!(adapter.storage_path(), temp_dir.path());
}

// vim: ts=4
