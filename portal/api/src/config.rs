use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExtConfig {
	/// HTTP server config
	pub api: ApiConfig,

	/// Song request intake config
	pub intake: IntakeConfig,

	/// Upstream streaming server config
	pub radio: RadioConfig,

	/// Where requests and staff records are kept
	pub store: StoreConfig,

	/// Staff sign in config
	pub identity: IdentityConfig,
}

impl binary_helper::config::ConfigExtention for ExtConfig {
	const APP_NAME: &'static str = "portal-api";
	const ENV_PREFIX: &'static str = "PORTAL";
	const LIST_KEYS: &'static [&'static str] = &["api.allow_origins", "intake.ip_allow_list", "identity.authorised_ids"];

	fn pre_hook(config: &mut AppConfig) -> anyhow::Result<()> {
		anyhow::ensure!(!config.extra.intake.api_key.is_empty(), "intake.api_key must be set");

		let jwt = &config.extra.identity.jwt;
		match jwt.algorithm {
			JwtAlgorithm::Hs256 => anyhow::ensure!(!jwt.secret.is_empty(), "identity.jwt.secret must be set"),
			JwtAlgorithm::Rs256 => anyhow::ensure!(!jwt.public_key.is_empty(), "identity.jwt.public_key must be set"),
		}

		Ok(())
	}
}

pub type AppConfig = binary_helper::config::AppConfig<ExtConfig>;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,

	/// Origins allowed to call the API from a browser, `*` allows any
	pub allow_origins: Vec<String>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
			allow_origins: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
	/// Shared secret expected in the `x-api-key` header
	pub api_key: String,

	pub rate_limit: RateLimitConfig,

	/// Caller IPs that are never rate limited
	pub ip_allow_list: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
	/// Requests allowed per window
	pub points: u32,

	/// Window length, either seconds or a duration such as `5m`
	#[serde(with = "duration")]
	pub duration: Duration,

	/// How long a caller stays blocked after exceeding the window
	#[serde(with = "duration")]
	pub block_duration: Duration,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			points: 4,
			duration: Duration::from_secs(300),
			block_duration: Duration::from_secs(300),
		}
	}
}

impl From<RateLimitConfig> for utils::ratelimiter::RateLimiterOptions {
	fn from(config: RateLimitConfig) -> Self {
		Self {
			points: config.points,
			duration: config.duration,
			block_duration: config.block_duration,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RadioConfig {
	/// Base URL of the Azuracast server
	pub base_url: Url,

	/// Station short name
	pub station: String,

	/// Timeout for upstream requests
	#[serde(with = "humantime_serde")]
	pub timeout: Duration,

	/// Connection details handed to broadcasters
	pub stream: StreamConfig,
}

impl Default for RadioConfig {
	fn default() -> Self {
		Self {
			base_url: Url::parse("https://radio.limeradio.net").expect("valid default url"),
			station: "lime".to_owned(),
			timeout: Duration::from_secs(10),
			stream: StreamConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StreamConfig {
	pub host: String,
	pub port: u16,
	pub protocol: String,
}

impl Default for StreamConfig {
	fn default() -> Self {
		Self {
			host: "radio.limeradio.net".to_owned(),
			port: 8005,
			protocol: "Icecast".to_owned(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StoreConfig {
	/// A PostgREST compatible API, such as Supabase
	Rest(RestStoreConfig),
	/// Kept in process, lost on restart
	#[default]
	Memory,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RestStoreConfig {
	/// Base URL of the project, `/rest/v1/` is appended
	pub url: Url,

	/// Service key sent as both `apikey` and bearer token
	pub key: String,

	#[serde(default = "default_store_timeout", with = "humantime_serde")]
	pub timeout: Duration,
}

fn default_store_timeout() -> Duration {
	Duration::from_secs(10)
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
	pub jwt: JwtConfig,

	/// Backend API of the identity provider
	pub api_url: Url,

	/// Secret key for the backend API
	pub secret_key: String,

	/// The linked account provider staff sign in with
	pub provider: String,

	/// Provider user ids allowed into the staff area
	pub authorised_ids: Vec<String>,

	/// Where signed out callers are sent
	pub sign_in_path: String,

	/// Where callers without access are sent
	pub unauthorised_path: String,

	#[serde(with = "humantime_serde")]
	pub timeout: Duration,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			jwt: JwtConfig::default(),
			api_url: Url::parse("https://api.clerk.com").expect("valid default url"),
			secret_key: String::new(),
			provider: "discord".to_owned(),
			authorised_ids: vec!["1137093225576935485".to_owned()],
			sign_in_path: "/staff/auth".to_owned(),
			unauthorised_path: "/staff/unauthorised".to_owned(),
			timeout: Duration::from_secs(10),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
	/// Shared secret, for tokens minted alongside this service
	#[default]
	Hs256,
	/// The identity provider's public key, as Clerk signs its session tokens
	Rs256,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
	pub algorithm: JwtAlgorithm,

	/// JWT secret, used with HS256
	pub secret: String,

	/// PEM encoded RSA public key, used with RS256
	pub public_key: String,

	/// JWT issuer, for Clerk the instance's frontend API URL
	pub issuer: String,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			algorithm: JwtAlgorithm::default(),
			issuer: "limeradio".to_owned(),
			secret: String::new(),
			public_key: String::new(),
		}
	}
}

/// Accepts a plain number of seconds as well as humantime strings.
mod duration {
	use std::time::Duration;

	use serde::Deserialize;

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Seconds(u64),
		Human(String),
	}

	pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		match Raw::deserialize(deserializer)? {
			Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
			Raw::Human(text) => humantime_serde::re::humantime::parse_duration(&text).map_err(serde::de::Error::custom),
		}
	}
}
