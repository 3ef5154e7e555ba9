use http::header;
use http::HeaderValue;

use super::{Middleware, NextFn};
use crate::http::router::builder::RouterBuilder;

#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
	/// Origins allowed to read responses, `*` allows any origin and an empty
	/// list disables CORS entirely
	pub allow_origin: Vec<String>,
	pub allow_methods: Vec<String>,
	pub allow_headers: Vec<String>,
	pub expose_headers: Vec<String>,
	pub max_age_seconds: Option<u64>,
}

/// Adds CORS headers to responses for allowed origins and answers preflight
/// `OPTIONS` requests with `204 No Content`.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
	allow_origins: fnv::FnvHashSet<String>,
	allow_methods: Option<HeaderValue>,
	allow_headers: Option<HeaderValue>,
	expose_headers: Option<HeaderValue>,
	max_age: Option<HeaderValue>,
}

fn join_header(values: &[String]) -> Option<HeaderValue> {
	if values.is_empty() {
		return None;
	}

	HeaderValue::from_str(&values.join(", ")).ok()
}

impl CorsMiddleware {
	pub fn new(options: &CorsOptions) -> Self {
		Self {
			allow_origins: options.allow_origin.iter().map(|s| s.to_lowercase()).collect(),
			allow_methods: join_header(&options.allow_methods),
			allow_headers: join_header(&options.allow_headers),
			expose_headers: join_header(&options.expose_headers),
			max_age: options.max_age_seconds.map(HeaderValue::from),
		}
	}

	fn allows(&self, origin: &str) -> bool {
		self.allow_origins.contains("*") || self.allow_origins.contains(&origin.to_lowercase())
	}
}

#[async_trait::async_trait]
impl<I: Send + 'static, O: Default + Send + 'static, E: Send + 'static> Middleware<I, O, E> for CorsMiddleware {
	async fn handle(&self, req: hyper::Request<I>, next: NextFn<I, O, E>) -> Result<hyper::Response<O>, E> {
		let origin = req.headers().get(header::ORIGIN).cloned();

		let mut resp = next(req).await?;

		let Some(origin) = origin.filter(|origin| origin.to_str().is_ok_and(|origin| self.allows(origin))) else {
			return Ok(resp);
		};

		let headers = resp.headers_mut();
		headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
		headers.insert(header::VARY, HeaderValue::from_static("Origin"));

		for (name, value) in [
			(header::ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods),
			(header::ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers),
			(header::ACCESS_CONTROL_EXPOSE_HEADERS, &self.expose_headers),
			(header::ACCESS_CONTROL_MAX_AGE, &self.max_age),
		] {
			if let Some(value) = value {
				headers.insert(name, value.clone());
			}
		}

		Ok(resp)
	}

	fn extend(&self, builder: RouterBuilder<I, O, E>) -> RouterBuilder<I, O, E> {
		builder.options("/*", |_| async move {
			let mut resp = hyper::Response::new(O::default());
			*resp.status_mut() = hyper::StatusCode::NO_CONTENT;
			Ok(resp)
		})
	}
}
