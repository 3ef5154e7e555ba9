use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::http::ext::ResultExt;
use utils::make_response;

use super::path_id;
use crate::api::error::Result;
use crate::api::Body;
use crate::database;
use crate::global::ApiGlobal;

pub async fn list<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	let requests = database::all::<database::Request>(global.store())
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch requests"))?;

	Ok(make_response!(StatusCode::OK, json!({ "data": requests })))
}

pub async fn delete<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;
	let id = path_id(&req)?;

	let deleted = database::delete::<database::Request>(global.store(), id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to delete request"))?;

	if !deleted {
		return Err((StatusCode::NOT_FOUND, "request not found").into());
	}

	tracing::info!(id, "song request deleted");

	Ok(make_response!(StatusCode::OK, json!({ "message": "Request deleted" })))
}
