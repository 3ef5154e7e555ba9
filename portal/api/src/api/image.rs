use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use utils::http::ext::{OptionExt, ResultExt};

use super::error::Result;
use super::ext::RequestExt;
use super::Body;
use crate::global::ApiGlobal;

/// Relays track art from the streaming server as is.
pub async fn get<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	let id = req
		.query_param("id")
		.filter(|id| !id.is_empty())
		.map_err_route((StatusCode::BAD_REQUEST, "Missing ID parameter"))?;

	let artwork = global
		.radio()
		.art(&id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))?;

	if !artwork.status.is_success() {
		return Err((artwork.status, "Failed to fetch image").into());
	}

	let content_type = artwork
		.content_type
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Invalid content type"))?;

	Response::builder()
		.status(artwork.status)
		.header(header::CONTENT_TYPE, content_type)
		.body(Body::new(artwork.body))
		.map_ignore_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
}
