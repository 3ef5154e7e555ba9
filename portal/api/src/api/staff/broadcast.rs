use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::http::ext::{OptionExt, ResultExt};
use utils::make_response;

use crate::api::error::Result;
use crate::api::middleware::auth::StaffSession;
use crate::api::Body;
use crate::config::RadioConfig;
use crate::database::{self, Staff};
use crate::global::ApiGlobal;

/// The caller's staff record and what they need to connect their broadcast
/// software to the stream.
pub async fn me<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	let session = req
		.extensions()
		.get::<StaffSession>()
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "missing staff session"))?;

	let staff = database::find_by::<Staff>(global.store(), Staff::USER_ID, session.account_id.as_str())
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch staff record"))?
		.map_err_route((StatusCode::NOT_FOUND, "staff record not found"))?;

	Ok(make_response!(
		StatusCode::OK,
		json!({
			"data": {
				"staff": staff,
				"stream": global.config::<RadioConfig>().stream,
			}
		})
	))
}
