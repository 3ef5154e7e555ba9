//! Typed access to the collections kept in the [`Store`].
//!
//! Rows travel as JSON and keep the store's column names on the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{Store, StoreError};

mod request;
mod staff;

pub use request::{NewRequest, Request};
pub use staff::{Staff, StaffStatusUpdate};

pub trait Model: DeserializeOwned + Send {
	const COLLECTION: &'static str;
}

fn decode<M: Model>(row: Value) -> Result<M, StoreError> {
	Ok(serde_json::from_value(row)?)
}

fn encode(row: impl Serialize) -> Result<Value, StoreError> {
	Ok(serde_json::to_value(row)?)
}

pub async fn insert<M: Model>(store: &impl Store, row: impl Serialize) -> Result<M, StoreError> {
	decode(store.insert(M::COLLECTION, encode(row)?).await?)
}

pub async fn all<M: Model>(store: &impl Store) -> Result<Vec<M>, StoreError> {
	store.get_all(M::COLLECTION).await?.into_iter().map(decode).collect()
}

pub async fn find_by<M: Model>(store: &impl Store, column: &str, value: impl Into<Value>) -> Result<Option<M>, StoreError> {
	store.get_by(M::COLLECTION, column, &value.into()).await?.map(decode).transpose()
}

/// Returns `false` when no row had the id.
pub async fn delete<M: Model>(store: &impl Store, id: i64) -> Result<bool, StoreError> {
	store.delete_by_id(M::COLLECTION, id).await
}

pub async fn update_by<M: Model>(
	store: &impl Store,
	column: &str,
	value: impl Into<Value>,
	patch: impl Serialize,
) -> Result<Vec<M>, StoreError> {
	store
		.update_by(M::COLLECTION, column, &value.into(), encode(patch)?)
		.await?
		.into_iter()
		.map(decode)
		.collect()
}
