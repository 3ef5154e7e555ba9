use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::config::RadioConfig;

/// Talks to the Azuracast server the station streams from.
#[derive(Debug)]
pub struct RadioClient {
	base_url: Url,
	station: String,
	client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum RadioError {
	#[error("base url cannot have path segments: {0}")]
	InvalidBaseUrl(Url),
	#[error("reqwest: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("upstream responded with {0}")]
	Status(StatusCode),
}

/// An album art response, passed through as received.
#[derive(Debug)]
pub struct Artwork {
	pub status: StatusCode,
	pub content_type: Option<String>,
	pub body: Bytes,
}

impl RadioClient {
	pub fn new(config: &RadioConfig) -> Result<Self, RadioError> {
		Ok(Self {
			base_url: config.base_url.clone(),
			station: config.station.clone(),
			client: reqwest::Client::builder().timeout(config.timeout).build()?,
		})
	}

	fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, RadioError> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|_| RadioError::InvalidBaseUrl(self.base_url.clone()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	/// Fetches the art for a track. Non success statuses are not errors here,
	/// the caller decides what to relay.
	#[tracing::instrument(skip(self), name = "RadioClient::art", err)]
	pub async fn art(&self, id: &str) -> Result<Artwork, RadioError> {
		let url = self.url(["api", "station", self.station.as_str(), "art", id])?;

		let response = self.client.get(url).send().await?;

		let status = response.status();
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		Ok(Artwork {
			status,
			content_type,
			body: response.bytes().await?,
		})
	}

	/// The station's now playing document.
	#[tracing::instrument(skip(self), name = "RadioClient::now_playing", err)]
	pub async fn now_playing(&self) -> Result<Value, RadioError> {
		let url = self.url(["api", "nowplaying", self.station.as_str()])?;

		let response = self.client.get(url).send().await?;

		if !response.status().is_success() {
			return Err(RadioError::Status(response.status()));
		}

		Ok(response.json().await?)
	}
}
