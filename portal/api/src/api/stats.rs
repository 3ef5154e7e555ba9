use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::make_response;

use super::error::Result;
use super::Body;
use crate::global::ApiGlobal;
use crate::radio::RadioError;

/// What the station is playing right now, as reported by the streaming server.
pub async fn get<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	match global.radio().now_playing().await {
		Ok(doc) => Ok(make_response!(StatusCode::OK, json!({ "data": doc }))),
		Err(RadioError::Status(status)) => Err((status, "Failed to fetch now playing").into()),
		Err(err) => Err((StatusCode::BAD_GATEWAY, "Failed to fetch now playing", err).into()),
	}
}
