use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use url::Url;

use super::{filter_text, Store, StoreError};
use crate::config::RestStoreConfig;

/// A PostgREST endpoint, as exposed by Supabase under `/rest/v1/`.
#[derive(Debug)]
pub struct RestStore {
	base_url: Url,
	client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum RestStoreError {
	#[error("invalid url: {0}")]
	InvalidUrl(#[from] url::ParseError),
	#[error("invalid key")]
	InvalidKey(#[from] reqwest::header::InvalidHeaderValue),
	#[error("reqwest: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("unexpected status {status}: {body}")]
	Status { status: reqwest::StatusCode, body: String },
	#[error("expected a list of rows")]
	NotAList,
}

impl RestStore {
	#[tracing::instrument(skip(config), name = "RestStore::new", fields(url = %config.url), err)]
	pub fn new(config: &crate::config::RestStoreConfig) -> Result<Self, RestStoreError> {
		let RestStoreConfig { url, key, timeout } = config;

		let mut headers = HeaderMap::new();
		headers.insert("apikey", HeaderValue::from_str(key)?);
		headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);

		Ok(Self {
			base_url: url.join("rest/v1/")?,
			client: reqwest::Client::builder()
				.default_headers(headers)
				.timeout(*timeout)
				.build()?,
		})
	}

	fn request(
		&self,
		method: Method,
		collection: &str,
		filter: Option<(&str, &Value)>,
	) -> Result<RequestBuilder, RestStoreError> {
		let mut url = self.base_url.join(collection)?;

		{
			let mut query = url.query_pairs_mut();
			query.append_pair("select", "*");
			if let Some((column, value)) = filter {
				query.append_pair(column, &format!("eq.{}", filter_text(value)));
			}
		}

		Ok(self
			.client
			.request(method, url)
			.header("Prefer", "return=representation"))
	}

	async fn rows(&self, request: RequestBuilder) -> Result<Vec<Value>, RestStoreError> {
		let response = request.send().await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(RestStoreError::Status { status, body });
		}

		match response.json::<Value>().await? {
			Value::Array(rows) => Ok(rows),
			_ => Err(RestStoreError::NotAList),
		}
	}
}

impl Store for RestStore {
	#[tracing::instrument(skip(self, row), name = "RestStore::insert", err)]
	async fn insert(&self, collection: &str, row: Value) -> Result<Value, StoreError> {
		let request = self.request(Method::POST, collection, None)?.json(&row);
		let rows = self.rows(request).await?;
		Ok(rows.into_iter().next().ok_or(RestStoreError::NotAList)?)
	}

	#[tracing::instrument(skip(self), name = "RestStore::get_all", err)]
	async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
		Ok(self.rows(self.request(Method::GET, collection, None)?).await?)
	}

	#[tracing::instrument(skip(self), name = "RestStore::get_by", err)]
	async fn get_by(&self, collection: &str, column: &str, value: &Value) -> Result<Option<Value>, StoreError> {
		let request = self
			.request(Method::GET, collection, Some((column, value)))?
			.query(&[("limit", "1")]);
		Ok(self.rows(request).await?.into_iter().next())
	}

	#[tracing::instrument(skip(self), name = "RestStore::delete_by_id", err)]
	async fn delete_by_id(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
		let request = self.request(Method::DELETE, collection, Some(("id", &Value::from(id))))?;
		Ok(!self.rows(request).await?.is_empty())
	}

	#[tracing::instrument(skip(self, patch), name = "RestStore::update_by", err)]
	async fn update_by(&self, collection: &str, column: &str, value: &Value, patch: Value) -> Result<Vec<Value>, StoreError> {
		let request = self
			.request(Method::PATCH, collection, Some((column, value)))?
			.json(&patch);
		Ok(self.rows(request).await?)
	}
}
