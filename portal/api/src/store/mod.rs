use std::future::Future;

use serde_json::Value;

use self::memory::MemoryStore;
use self::rest::{RestStore, RestStoreError};
use crate::config::StoreConfig;

pub mod memory;
pub mod rest;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("rest: {0}")]
	Rest(#[from] RestStoreError),
	#[error("invalid row: {0}")]
	Row(#[from] serde_json::Error),
}

/// Row level access to named collections. Rows are JSON objects carrying an
/// integer `id` column assigned by the store.
pub trait Store {
	/// Inserts a row and returns it as stored.
	fn insert(&self, collection: &str, row: Value) -> impl Future<Output = Result<Value, StoreError>> + Send;

	fn get_all(&self, collection: &str) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;

	/// The first row whose `column` equals `value`.
	fn get_by(
		&self,
		collection: &str,
		column: &str,
		value: &Value,
	) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

	/// Returns whether a row was deleted.
	fn delete_by_id(&self, collection: &str, id: i64) -> impl Future<Output = Result<bool, StoreError>> + Send;

	/// Merges `patch` into every row whose `column` equals `value` and returns
	/// the updated rows.
	fn update_by(
		&self,
		collection: &str,
		column: &str,
		value: &Value,
		patch: Value,
	) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;
}

#[derive(Debug)]
pub enum AnyStore {
	Rest(RestStore),
	Memory(MemoryStore),
}

impl Store for AnyStore {
	async fn insert(&self, collection: &str, row: Value) -> Result<Value, StoreError> {
		match self {
			AnyStore::Rest(store) => store.insert(collection, row).await,
			AnyStore::Memory(store) => store.insert(collection, row).await,
		}
	}

	async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
		match self {
			AnyStore::Rest(store) => store.get_all(collection).await,
			AnyStore::Memory(store) => store.get_all(collection).await,
		}
	}

	async fn get_by(&self, collection: &str, column: &str, value: &Value) -> Result<Option<Value>, StoreError> {
		match self {
			AnyStore::Rest(store) => store.get_by(collection, column, value).await,
			AnyStore::Memory(store) => store.get_by(collection, column, value).await,
		}
	}

	async fn delete_by_id(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
		match self {
			AnyStore::Rest(store) => store.delete_by_id(collection, id).await,
			AnyStore::Memory(store) => store.delete_by_id(collection, id).await,
		}
	}

	async fn update_by(&self, collection: &str, column: &str, value: &Value, patch: Value) -> Result<Vec<Value>, StoreError> {
		match self {
			AnyStore::Rest(store) => store.update_by(collection, column, value, patch).await,
			AnyStore::Memory(store) => store.update_by(collection, column, value, patch).await,
		}
	}
}

pub fn build_store(config: &StoreConfig) -> Result<AnyStore, StoreError> {
	match config {
		StoreConfig::Rest(rest) => Ok(AnyStore::Rest(RestStore::new(rest)?)),
		StoreConfig::Memory => Ok(AnyStore::Memory(MemoryStore::default())),
	}
}

/// Filter values compare as text, the way PostgREST compares them.
pub(crate) fn filter_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}
