use std::fmt::{Debug, Display};
use std::panic::Location;

use bytes::Bytes;
use http::header::{HeaderValue, IntoHeaderName};
use http::StatusCode;
use http_body_util::Full;
use serde_json::json;

pub mod router;

/// Builds a JSON response with the given status and a value that renders to
/// JSON through `to_string`.
#[macro_export]
macro_rules! make_response {
	($status:expr, $body:expr) => {
		::hyper::Response::builder()
			.status($status)
			.header(::hyper::header::CONTENT_TYPE, "application/json")
			.body(::hyper::body::Bytes::from($body.to_string()).into())
			.expect("failed to build response")
	};
}

/// The router error handler: logs the error according to its severity and
/// hands back the response it carries.
pub async fn error_handler<E: std::error::Error + 'static, B: From<Bytes>>(
	req: hyper::Request<()>,
	err: RouteError<E, B>,
) -> hyper::Response<B> {
	let location = err.location();

	err.span().in_scope(|| match err.should_log() {
		ShouldLog::Yes => {
			tracing::error!(path = %req.uri(), method = %req.method(), location = %location, error = ?err, "http error")
		}
		ShouldLog::Debug => {
			tracing::debug!(path = %req.uri(), method = %req.method(), location = %location, error = ?err, "http error")
		}
		ShouldLog::No => (),
	});

	err.response()
}

/// A failed request: the response to send back, plus enough context to log
/// where and why it failed.
pub struct RouteError<E, B: From<Bytes> = Full<Bytes>> {
	source: Option<E>,
	location: &'static Location<'static>,
	span: tracing::Span,
	response: hyper::Response<B>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldLog {
	Yes,
	Debug,
	No,
}

fn message_response<B: From<Bytes>>(status: StatusCode, message: &str) -> hyper::Response<B> {
	make_response!(status, json!({ "message": message, "success": false }))
}

impl<E, B: From<Bytes>> RouteError<E, B> {
	#[track_caller]
	fn new(response: hyper::Response<B>) -> Self {
		Self {
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
			response,
		}
	}

	/// A `303 See Other` pointing the client at `location`.
	#[track_caller]
	pub fn redirect(location: &str) -> Self {
		let mut response = message_response(StatusCode::SEE_OTHER, "redirecting");
		if let Ok(value) = HeaderValue::from_str(location) {
			response.headers_mut().insert(http::header::LOCATION, value);
		}

		Self::new(response)
	}

	pub fn span(&self) -> &tracing::Span {
		&self.span
	}

	pub fn location(&self) -> &'static Location<'static> {
		self.location
	}

	pub fn response(self) -> hyper::Response<B> {
		self.response
	}

	pub fn should_log(&self) -> ShouldLog {
		if self.response.status().is_server_error() {
			ShouldLog::Yes
		} else if self.source.is_some() {
			ShouldLog::Debug
		} else {
			ShouldLog::No
		}
	}

	pub fn with_source(mut self, source: Option<E>) -> Self {
		self.source = source;
		self
	}

	pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
		self.location = location;
		self
	}

	/// Adds a header to the error response, invalid values are dropped.
	pub fn with_header<K: IntoHeaderName>(mut self, key: K, value: impl AsRef<str>) -> Self {
		if let Ok(value) = HeaderValue::from_str(value.as_ref()) {
			self.response.headers_mut().insert(key, value);
		}

		self
	}
}

impl<E, S: AsRef<str>, B: From<Bytes>> From<(StatusCode, S)> for RouteError<E, B> {
	#[track_caller]
	fn from((status, message): (StatusCode, S)) -> Self {
		Self::new(message_response(status, message.as_ref()))
	}
}

impl<E, S: AsRef<str>, T, B: From<Bytes>> From<(StatusCode, S, T)> for RouteError<E, B>
where
	T: Into<E>,
{
	#[track_caller]
	fn from((status, message, source): (StatusCode, S, T)) -> Self {
		Self::new(message_response(status, message.as_ref())).with_source(Some(source.into()))
	}
}

impl<E: Debug, B: From<Bytes>> Debug for RouteError<E, B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {:?}", self.response.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.response.status()),
		}
	}
}

impl<E: Display, B: From<Bytes>> Display for RouteError<E, B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {}", self.response.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.response.status()),
		}
	}
}

impl<E: std::error::Error + 'static, B: From<Bytes>> std::error::Error for RouteError<E, B> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source.as_ref().map(|err| err as _)
	}
}

pub mod ext {
	use std::panic::Location;

	use bytes::Bytes;

	use super::RouteError;

	/// Converts failures into a [`RouteError`] built from `ctx`, usually a
	/// `(StatusCode, &str)` pair.
	pub trait ResultExt<T, E, E2>: Sized {
		/// Keeps the original error as the source of the route error.
		fn map_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E2, B>>
		where
			RouteError<E2, B>: From<C>,
			E2: From<E>;

		/// Discards the original error.
		fn map_ignore_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E2, B>>
		where
			RouteError<E2, B>: From<C>;
	}

	impl<T, E, E2> ResultExt<T, E, E2> for Result<T, E> {
		#[track_caller]
		fn map_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E2, B>>
		where
			RouteError<E2, B>: From<C>,
			E2: From<E>,
		{
			let location = Location::caller();
			self.map_err(|err| {
				RouteError::from(ctx)
					.with_source(Some(err.into()))
					.with_location(location)
			})
		}

		#[track_caller]
		fn map_ignore_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E2, B>>
		where
			RouteError<E2, B>: From<C>,
		{
			let location = Location::caller();
			self.map_err(|_| RouteError::from(ctx).with_location(location))
		}
	}

	pub trait OptionExt<T, E>: Sized {
		fn map_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E, B>>
		where
			RouteError<E, B>: From<C>;
	}

	impl<T, E> OptionExt<T, E> for Option<T> {
		#[track_caller]
		fn map_err_route<C, B: From<Bytes>>(self, ctx: C) -> Result<T, RouteError<E, B>>
		where
			RouteError<E, B>: From<C>,
		{
			let location = Location::caller();
			self.ok_or_else(|| RouteError::from(ctx).with_location(location))
		}
	}
}
