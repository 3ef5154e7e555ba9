use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{filter_text, Store, StoreError};

#[derive(Debug, Default)]
struct Collection {
	last_id: i64,
	rows: Vec<Value>,
}

/// Keeps collections in process. Ids are assigned sequentially per
/// collection and `created_at` is filled in on insert when missing.
#[derive(Debug, Default)]
pub struct MemoryStore {
	collections: RwLock<HashMap<String, Collection>>,
}

fn column_matches(row: &Value, column: &str, value: &Value) -> bool {
	row.get(column)
		.is_some_and(|cell| cell == value || filter_text(cell) == filter_text(value))
}

impl Store for MemoryStore {
	async fn insert(&self, collection: &str, mut row: Value) -> Result<Value, StoreError> {
		let mut collections = self.collections.write().await;
		let collection = collections.entry(collection.to_owned()).or_default();

		if let Value::Object(fields) = &mut row {
			collection.last_id += 1;
			fields.insert("id".to_owned(), Value::from(collection.last_id));
			fields
				.entry("created_at")
				.or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
		}

		collection.rows.push(row.clone());

		Ok(row)
	}

	async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
		Ok(self
			.collections
			.read()
			.await
			.get(collection)
			.map(|collection| collection.rows.clone())
			.unwrap_or_default())
	}

	async fn get_by(&self, collection: &str, column: &str, value: &Value) -> Result<Option<Value>, StoreError> {
		Ok(self.collections.read().await.get(collection).and_then(|collection| {
			collection
				.rows
				.iter()
				.find(|row| column_matches(row, column, value))
				.cloned()
		}))
	}

	async fn delete_by_id(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(collection) = collections.get_mut(collection) else {
			return Ok(false);
		};

		let before = collection.rows.len();
		collection.rows.retain(|row| !column_matches(row, "id", &Value::from(id)));

		Ok(collection.rows.len() != before)
	}

	async fn update_by(&self, collection: &str, column: &str, value: &Value, patch: Value) -> Result<Vec<Value>, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(collection) = collections.get_mut(collection) else {
			return Ok(Vec::new());
		};

		let Value::Object(patch) = patch else {
			return Ok(Vec::new());
		};

		let mut updated = Vec::new();
		for row in collection.rows.iter_mut().filter(|row| column_matches(row, column, value)) {
			if let Value::Object(fields) = row {
				fields.extend(patch.clone());
			}
			updated.push(row.clone());
		}

		Ok(updated)
	}
}
