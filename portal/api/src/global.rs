use anyhow::Context as _;
use binary_helper::global::{GlobalConfig, GlobalConfigProvider, GlobalCtx};
use utils::context::Context;
use utils::ratelimiter::RateLimiter;

use crate::config::{ApiConfig, AppConfig, IdentityConfig, IntakeConfig, RadioConfig};
use crate::identity::IdentityClient;
use crate::radio::RadioClient;
use crate::store::{build_store, AnyStore};

pub trait ApiState {
	fn rate_limiter(&self) -> &RateLimiter;
	fn store(&self) -> &AnyStore;
	fn radio(&self) -> &RadioClient;
	fn identity(&self) -> &IdentityClient;
}

pub trait ApiGlobal:
	GlobalCtx
	+ GlobalConfigProvider<ApiConfig>
	+ GlobalConfigProvider<IntakeConfig>
	+ GlobalConfigProvider<RadioConfig>
	+ GlobalConfigProvider<IdentityConfig>
	+ GlobalConfig
	+ ApiState
	+ Send
	+ Sync
	+ 'static
{
}

impl<T> ApiGlobal for T where
	T: GlobalCtx
		+ GlobalConfigProvider<ApiConfig>
		+ GlobalConfigProvider<IntakeConfig>
		+ GlobalConfigProvider<RadioConfig>
		+ GlobalConfigProvider<IdentityConfig>
		+ GlobalConfig
		+ ApiState
		+ Send
		+ Sync
		+ 'static
{
}

pub struct GlobalState {
	ctx: Context,
	config: AppConfig,
	rate_limiter: RateLimiter,
	store: AnyStore,
	radio: RadioClient,
	identity: IdentityClient,
}

impl GlobalState {
	/// Builds the state without touching the network, the store and clients
	/// connect lazily on first use.
	pub fn from_config(ctx: Context, config: AppConfig) -> anyhow::Result<Self> {
		let rate_limiter = RateLimiter::new(config.extra.intake.rate_limit.into());
		let store = build_store(&config.extra.store).context("failed to set up store")?;
		let radio = RadioClient::new(&config.extra.radio).context("failed to set up radio client")?;
		let identity = IdentityClient::new(&config.extra.identity).context("failed to set up identity client")?;

		Ok(Self {
			ctx,
			config,
			rate_limiter,
			store,
			radio,
			identity,
		})
	}
}

impl binary_helper::Global<AppConfig> for GlobalState {
	async fn new(ctx: Context, config: AppConfig) -> anyhow::Result<Self> {
		tracing::debug!("setting up global state");
		Self::from_config(ctx, config)
	}
}

impl GlobalCtx for GlobalState {
	#[inline(always)]
	fn ctx(&self) -> &Context {
		&self.ctx
	}
}

impl GlobalConfig for GlobalState {}

macro_rules! provide_config {
	($($ty:ty => $field:ident),* $(,)?) => {
		$(
			impl GlobalConfigProvider<$ty> for GlobalState {
				#[inline(always)]
				fn provide_config(&self) -> &$ty {
					&self.config.extra.$field
				}
			}
		)*
	};
}

provide_config! {
	ApiConfig => api,
	IntakeConfig => intake,
	RadioConfig => radio,
	IdentityConfig => identity,
}

impl ApiState for GlobalState {
	#[inline(always)]
	fn rate_limiter(&self) -> &RateLimiter {
		&self.rate_limiter
	}

	#[inline(always)]
	fn store(&self) -> &AnyStore {
		&self.store
	}

	#[inline(always)]
	fn radio(&self) -> &RadioClient {
		&self.radio
	}

	#[inline(always)]
	fn identity(&self) -> &IdentityClient {
		&self.identity
	}
}
