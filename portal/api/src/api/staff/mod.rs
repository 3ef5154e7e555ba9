use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use utils::http::ext::{OptionExt, ResultExt};
use utils::http::router::builder::RouterBuilder;
use utils::http::router::ext::RequestExt;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::middleware::auth::{management_gate, staff_gate};
use super::Body;
use crate::global::ApiGlobal;

mod broadcast;
mod requests;
mod users;

/// Routes for the staff area. Everything is behind the staff gate, user
/// management is further limited to staff with management permission.
pub fn routes<G: ApiGlobal>() -> RouterBuilder<Incoming, Body, RouteError<ApiError>> {
	RouterBuilder::new()
		.middleware(staff_gate::<G>())
		.get("/me", broadcast::me::<G>)
		.get("/requests", requests::list::<G>)
		.delete("/requests/:id", requests::delete::<G>)
		.scope(
			"/",
			RouterBuilder::new()
				.middleware(management_gate::<G>())
				.post("/", users::toggle_active::<G>)
				.get("/users", users::list::<G>)
				.delete("/users/:id", users::delete::<G>),
		)
}

/// The `:id` path parameter as a row id.
fn path_id(req: &Request<Incoming>) -> Result<i64> {
	req.param("id")
		.map_err_route((StatusCode::BAD_REQUEST, "invalid id"))?
		.parse()
		.map_ignore_err_route((StatusCode::BAD_REQUEST, "invalid id"))
}
