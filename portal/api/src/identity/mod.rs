//! Resolves a session token into the identity behind it, using the identity
//! provider's backend API for the accounts linked to the user.

use reqwest::StatusCode;
use url::Url;

use crate::config::IdentityConfig;

mod jwt;

pub use jwt::{SessionToken, TokenVerifier};

/// An account on another platform linked to the user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ExternalAccount {
	/// The platform, without any `oauth_` prefix the provider adds
	pub provider: String,
	pub provider_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalIdentity {
	pub signed_in: bool,
	pub external_accounts: Vec<ExternalAccount>,
}

impl ExternalIdentity {
	pub fn signed_out() -> Self {
		Self::default()
	}

	/// The id of the first linked account on `provider`.
	pub fn account_id(&self, provider: &str) -> Option<&str> {
		self.external_accounts
			.iter()
			.find(|account| account.provider == provider)
			.map(|account| account.provider_user_id.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	#[error("invalid url: {0}")]
	InvalidUrl(#[from] url::ParseError),
	#[error("reqwest: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("openssl: {0}")]
	Openssl(#[from] openssl::error::ErrorStack),
	#[error("invalid key: {0}")]
	InvalidKey(String),
}

#[derive(serde::Deserialize)]
struct UserResponse {
	#[serde(default)]
	external_accounts: Vec<ExternalAccount>,
}

#[derive(Debug)]
pub struct IdentityClient {
	verifier: TokenVerifier,
	api_url: Url,
	secret_key: String,
	client: reqwest::Client,
}

impl IdentityClient {
	pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
		Ok(Self {
			verifier: TokenVerifier::new(&config.jwt)?,
			api_url: config.api_url.clone(),
			secret_key: config.secret_key.clone(),
			client: reqwest::Client::builder().timeout(config.timeout).build()?,
		})
	}

	/// A missing, invalid or expired token, or a user the provider no longer
	/// knows, resolves to a signed out identity rather than an error.
	#[tracing::instrument(skip_all, name = "IdentityClient::resolve", err)]
	pub async fn resolve(&self, token: Option<&str>) -> Result<ExternalIdentity, IdentityError> {
		let Some(session) = token.and_then(|token| self.verifier.verify(token)) else {
			return Ok(ExternalIdentity::signed_out());
		};

		let url = self.api_url.join(&format!("v1/users/{}", session.user_id))?;

		let response = self.client.get(url).bearer_auth(&self.secret_key).send().await?;

		if response.status() == StatusCode::NOT_FOUND {
			tracing::debug!(user_id = %session.user_id, "session for unknown user");
			return Ok(ExternalIdentity::signed_out());
		}

		let user: UserResponse = response.error_for_status()?.json().await?;

		Ok(ExternalIdentity {
			signed_in: true,
			external_accounts: user
				.external_accounts
				.into_iter()
				.map(|account| ExternalAccount {
					provider: account
						.provider
						.strip_prefix("oauth_")
						.map(str::to_owned)
						.unwrap_or(account.provider),
					provider_user_id: account.provider_user_id,
				})
				.collect(),
		})
	}
}
