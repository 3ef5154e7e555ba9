use std::sync::Arc;

use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use serde_json::json;
use utils::http::ext::ResultExt;
use utils::http::RouteError;
use utils::make_response;

use super::error::Result;
use super::ext::{json_body, RequestExt};
use super::Body;
use crate::config::IntakeConfig;
use crate::database::{self, NewRequest};
use crate::global::ApiGlobal;

/// Used when the caller's address is unknown, all such callers share a quota.
const UNKNOWN_IP: &str = "0.0.0.0";

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SongRequest {
	name: Option<String>,
	message: Option<String>,
}

/// The first `x-forwarded-for` entry, the client as seen by the first proxy.
fn client_ip<B>(req: &Request<B>) -> String {
	req.header_str("x-forwarded-for")
		.and_then(|value| value.split(',').next())
		.map(str::trim)
		.filter(|ip| !ip.is_empty())
		.unwrap_or(UNKNOWN_IP)
		.to_owned()
}

/// Whitespace counts as content, only missing or empty fields are rejected.
fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

pub async fn submit<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;
	let config = global.config::<IntakeConfig>();

	if req.header_str("x-api-key") != Some(config.api_key.as_str()) {
		return Err((StatusCode::FORBIDDEN, "Unauthorized").into());
	}

	let ip = client_ip(&req);
	let bypass = req.header_str("isBot") == Some("true") || config.ip_allow_list.contains(&ip);

	// Anything but an object with both fields is a validation failure
	let body = json_body::<serde_json::Value>(req)
		.await
		.ok()
		.filter(serde_json::Value::is_object)
		.and_then(|body| serde_json::from_value::<SongRequest>(body).ok())
		.unwrap_or_default();

	let (Some(name), Some(message)) = (non_empty(body.name), non_empty(body.message)) else {
		return Err((StatusCode::BAD_REQUEST, "Name and message are required").into());
	};

	if bypass {
		tracing::debug!(%ip, "rate limit bypassed");
	} else {
		consume(&global, &ip)?;
	}

	let request = database::insert::<database::Request>(
		global.store(),
		NewRequest {
			by: &name,
			ip: &ip,
			song: &message,
		},
	)
	.await
	.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit request. Please try again."))?;

	tracing::info!(id = request.id, %ip, "song request submitted");

	Ok(make_response!(
		StatusCode::OK,
		json!({
			"message": "Request submitted successfully",
			"data": request,
		})
	))
}

fn consume<G: ApiGlobal>(global: &Arc<G>, ip: &str) -> Result<()> {
	match global.rate_limiter().consume(ip) {
		Ok(response) => {
			tracing::debug!(%ip, remaining = response.remaining, "rate limit consumed");
			Ok(())
		}
		Err(exceeded) => {
			tracing::warn!(%ip, consumed = exceeded.consumed, "rate limit exceeded");

			let err = RouteError::from((StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded. Please try again later."));

			Err(match exceeded.retry_after {
				Some(retry_after) => {
					let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
					err.with_header(header::RETRY_AFTER, secs.to_string())
				}
				None => err,
			})
		}
	}
}
