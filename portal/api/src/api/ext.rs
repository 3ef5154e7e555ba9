use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use utils::http::ext::ResultExt;

use super::error::Result;

/// Request bodies are small JSON documents, anything larger is refused.
const MAX_BODY_SIZE: usize = 64 * 1024;

pub trait RequestExt {
	/// A header value as text, `None` when missing or not valid text.
	fn header_str(&self, name: &str) -> Option<&str>;

	/// The first value of a query string parameter.
	fn query_param(&self, name: &str) -> Option<String>;
}

impl<B> RequestExt for hyper::Request<B> {
	fn header_str(&self, name: &str) -> Option<&str> {
		self.headers().get(name).and_then(|value| value.to_str().ok())
	}

	fn query_param(&self, name: &str) -> Option<String> {
		url::form_urlencoded::parse(self.uri().query()?.as_bytes())
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.into_owned())
	}
}

/// Reads the whole body and decodes it as JSON. Both failures are client
/// errors.
pub async fn json_body<T: DeserializeOwned>(req: hyper::Request<Incoming>) -> Result<T> {
	let body = Limited::new(req.into_body(), MAX_BODY_SIZE)
		.collect()
		.await
		.map_err_route((StatusCode::BAD_REQUEST, "failed to read request body"))?
		.to_bytes();

	serde_json::from_slice(&body).map_err_route((StatusCode::BAD_REQUEST, "invalid request body"))
}
