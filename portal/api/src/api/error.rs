use utils::http::RouteError;

use super::middleware::auth::AuthError;
use crate::identity::IdentityError;
use crate::radio::RadioError;
use crate::store::StoreError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("failed to read http body: {0}")]
	Body(#[from] Box<dyn std::error::Error + Send + Sync>),
	#[error("invalid json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("store: {0}")]
	Store(#[from] StoreError),
	#[error("radio: {0}")]
	Radio(#[from] RadioError),
	#[error("identity: {0}")]
	Identity(#[from] IdentityError),
	#[error("auth: {0}")]
	Auth(#[from] AuthError),
}
