use binary_helper::global::RequestGlobalExt;
use hyper::body::Incoming;
use hyper::header;
use hyper::StatusCode;
use utils::http::ext::ResultExt;
use utils::http::router::middleware::{middleware_fn, Middleware, NextFn};
use utils::http::RouteError;

use crate::api::error::ApiError;
use crate::api::Body;
use crate::config::IdentityConfig;
use crate::database::{self, Staff};
use crate::global::ApiGlobal;

/// The cookie the identity provider keeps the session token in.
const SESSION_COOKIE: &str = "__session";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
	#[error("not signed in")]
	NotSignedIn,
	#[error("no linked {0} account")]
	NoLinkedAccount(String),
	#[error("account {0} is not authorised")]
	NotAuthorised(String),
	#[error("account {0} lacks management permission")]
	NoManagementPermission(String),
}

/// Who is calling a staff route, set by [`staff_gate`].
#[derive(Debug, Clone)]
pub struct StaffSession {
	/// The id of the linked account that granted access
	pub account_id: String,
}

fn session_token<B>(req: &hyper::Request<B>) -> Option<String> {
	if let Some(token) = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
	{
		return Some(token.trim().to_owned());
	}

	req.headers()
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|cookies| cookies.split(';'))
		.filter_map(|cookie| cookie.trim().split_once('='))
		.find(|(name, _)| *name == SESSION_COOKIE)
		.map(|(_, value)| value.to_owned())
}

fn redirect(path: &str, reason: AuthError) -> RouteError<ApiError> {
	RouteError::redirect(path).with_source(Some(reason.into()))
}

/// Lets through signed in callers whose linked account is on the authorised
/// list. Everyone else is redirected to sign in or to the unauthorised page.
pub fn staff_gate<G: ApiGlobal>() -> impl Middleware<Incoming, Body, RouteError<ApiError>> {
	middleware_fn(|mut req: hyper::Request<Incoming>, next: NextFn<Incoming, Body, RouteError<ApiError>>| async move {
		let global = req.get_global::<G, Body>()?;
		let config = global.config::<IdentityConfig>();

		let identity = global
			.identity()
			.resolve(session_token(&req).as_deref())
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to resolve identity"))?;

		if !identity.signed_in {
			return Err(redirect(&config.sign_in_path, AuthError::NotSignedIn));
		}

		let Some(account_id) = identity.account_id(&config.provider).map(str::to_owned) else {
			return Err(redirect(
				&config.unauthorised_path,
				AuthError::NoLinkedAccount(config.provider.clone()),
			));
		};

		if !config.authorised_ids.contains(&account_id) {
			return Err(redirect(&config.unauthorised_path, AuthError::NotAuthorised(account_id)));
		}

		req.extensions_mut().insert(StaffSession { account_id });

		next(req).await
	})
}

/// Narrows [`staff_gate`] to staff records holding management permission.
/// Must sit inside a scope guarded by [`staff_gate`].
pub fn management_gate<G: ApiGlobal>() -> impl Middleware<Incoming, Body, RouteError<ApiError>> {
	middleware_fn(|req: hyper::Request<Incoming>, next: NextFn<Incoming, Body, RouteError<ApiError>>| async move {
		let global = req.get_global::<G, Body>()?;
		let config = global.config::<IdentityConfig>();

		let Some(session) = req.extensions().get::<StaffSession>() else {
			return Err(redirect(&config.sign_in_path, AuthError::NotSignedIn));
		};

		let staff = database::find_by::<Staff>(global.store(), Staff::USER_ID, session.account_id.as_str())
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to look up staff record"))?;

		if !staff.is_some_and(|staff| staff.management_permission) {
			return Err(redirect(
				&config.unauthorised_path,
				AuthError::NoManagementPermission(session.account_id.clone()),
			));
		}

		next(req).await
	})
}
