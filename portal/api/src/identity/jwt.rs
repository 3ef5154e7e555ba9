use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, PKeyWithDigest, RegisteredClaims, SignWithKey, SigningAlgorithm, Token, VerifyWithKey};
use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey, Public};
use sha2::Sha256;

use super::IdentityError;
use crate::config::{JwtAlgorithm, JwtConfig};

/// A signed in session as carried by the session token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionToken {
	/// The identity provider's user id
	pub user_id: String,
	pub session_id: Option<String>,
	pub issued_at: DateTime<Utc>,
	pub expiration: Option<DateTime<Utc>>,
	pub not_before: Option<DateTime<Utc>>,
}

fn timestamp(secs: Option<u64>) -> Option<DateTime<Utc>> {
	Utc.timestamp_opt(i64::try_from(secs?).ok()?, 0).single()
}

impl SessionToken {
	/// Signs the session with any key the `jwt` crate supports.
	pub fn sign(&self, issuer: &str, key: &impl SigningAlgorithm) -> Option<String> {
		let claims = Claims {
			registered: RegisteredClaims {
				issuer: Some(issuer.to_owned()),
				subject: Some(self.user_id.clone()),
				audience: None,
				expiration: self.expiration.map(|x| x.timestamp() as u64),
				not_before: self.not_before.map(|x| x.timestamp() as u64),
				issued_at: Some(self.issued_at.timestamp() as u64),
				json_web_token_id: self.session_id.clone(),
			},
			private: Default::default(),
		};

		claims.sign_with_key(key).ok()
	}

	/// Signs the session with the shared secret, `None` unless `config` uses
	/// HS256.
	pub fn serialize(&self, config: &JwtConfig) -> Option<String> {
		if config.algorithm != JwtAlgorithm::Hs256 {
			return None;
		}

		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		self.sign(&config.issuer, &key)
	}

	fn from_claims(claims: &Claims) -> Option<Self> {
		let now = Utc::now();
		let registered = &claims.registered;

		let issued_at = timestamp(registered.issued_at)?;
		if issued_at > now {
			return None;
		}

		let not_before = timestamp(registered.not_before);
		if not_before.is_some_and(|nbf| nbf > now) {
			return None;
		}

		let expiration = timestamp(registered.expiration);
		if expiration.is_some_and(|exp| exp < now) {
			return None;
		}

		// Some providers carry the session id in `sid` rather than `jti`
		let session_id = registered.json_web_token_id.clone().or_else(|| {
			claims
				.private
				.get("sid")
				.and_then(|sid| sid.as_str())
				.map(str::to_owned)
		});

		Some(Self {
			user_id: registered.subject.clone()?,
			session_id,
			issued_at,
			expiration,
			not_before,
		})
	}
}

enum VerifyingKey {
	Hmac(Hmac<Sha256>),
	Rsa(PKeyWithDigest<Public>),
}

/// Checks session tokens against the configured algorithm, key and issuer.
pub struct TokenVerifier {
	key: VerifyingKey,
	issuer: String,
}

impl fmt::Debug for TokenVerifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let algorithm = match self.key {
			VerifyingKey::Hmac(_) => "HS256",
			VerifyingKey::Rsa(_) => "RS256",
		};

		f.debug_struct("TokenVerifier")
			.field("algorithm", &algorithm)
			.field("issuer", &self.issuer)
			.finish()
	}
}

impl TokenVerifier {
	pub fn new(config: &JwtConfig) -> Result<Self, IdentityError> {
		let key = match config.algorithm {
			JwtAlgorithm::Hs256 => VerifyingKey::Hmac(
				Hmac::<Sha256>::new_from_slice(config.secret.as_bytes())
					.map_err(|_| IdentityError::InvalidKey("unusable jwt secret".to_owned()))?,
			),
			JwtAlgorithm::Rs256 => {
				let key = PKey::public_key_from_pem(config.public_key.as_bytes())?;
				if key.id() != Id::RSA {
					return Err(IdentityError::InvalidKey("jwt public key is not an RSA key".to_owned()));
				}

				VerifyingKey::Rsa(PKeyWithDigest {
					digest: MessageDigest::sha256(),
					key,
				})
			}
		};

		Ok(Self {
			key,
			issuer: config.issuer.clone(),
		})
	}

	/// Checks the algorithm, signature, issuer and time bounds of `token`.
	pub fn verify(&self, token: &str) -> Option<SessionToken> {
		let token: Token<Header, Claims, _> = match &self.key {
			VerifyingKey::Hmac(key) => token.verify_with_key(key),
			VerifyingKey::Rsa(key) => token.verify_with_key(key),
		}
		.ok()?;

		if token.claims().registered.issuer.as_ref() != Some(&self.issuer) {
			return None;
		}

		SessionToken::from_claims(token.claims())
	}
}
