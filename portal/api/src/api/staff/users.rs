use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::http::ext::ResultExt;
use utils::make_response;

use super::path_id;
use crate::api::error::Result;
use crate::api::ext::{json_body, RequestExt};
use crate::api::middleware::auth::StaffSession;
use crate::api::Body;
use crate::config::IntakeConfig;
use crate::database::{self, Staff, StaffStatusUpdate};
use crate::global::ApiGlobal;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleActive {
	/// The user's id on the streaming server
	id: i64,
	/// The state the caller saw, the record is set to the opposite
	is_active: bool,
}

pub async fn list<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	let staff = database::all::<Staff>(global.store())
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch staff"))?;

	Ok(make_response!(StatusCode::OK, json!({ "data": staff })))
}

pub async fn delete<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;
	let id = path_id(&req)?;

	let deleted = database::delete::<Staff>(global.store(), id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to delete staff member"))?;

	if !deleted {
		return Err((StatusCode::NOT_FOUND, "staff member not found").into());
	}

	let by = req.extensions().get::<StaffSession>().map(|session| session.account_id.as_str());
	tracing::info!(id, by, "staff member revoked");

	Ok(make_response!(StatusCode::OK, json!({ "message": "Staff member revoked" })))
}

pub async fn toggle_active<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G, Body>()?;

	if req.header_str("x-api-key") != Some(global.config::<IntakeConfig>().api_key.as_str()) {
		return Err((StatusCode::FORBIDDEN, "Unauthorized").into());
	}

	let body: ToggleActive = json_body(req).await?;
	let active = !body.is_active;

	let updated = database::update_by::<Staff>(
		global.store(),
		Staff::AZURACAST_USER_ID,
		body.id,
		StaffStatusUpdate { active },
	)
	.await
	.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to update staff member"))?;

	if updated.is_empty() {
		return Err((StatusCode::NOT_FOUND, "staff member not found").into());
	}

	tracing::info!(azuracast_user_id = body.id, active, "staff member status changed");

	let message = if active { "User activated" } else { "User deactivated" };

	Ok(make_response!(StatusCode::OK, json!({ "message": message })))
}
