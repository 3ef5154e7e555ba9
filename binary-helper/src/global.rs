use std::sync::{Arc, Weak};

use bytes::Bytes;
use hyper::StatusCode;
use utils::context::Context;
use utils::http::RouteError;

use crate::config::Config;

/// The state shared by every task of a binary, built once the config is
/// loaded. It must hold on to `ctx` for as long as it does work.
#[allow(async_fn_in_trait)]
pub trait Global<C: Config>: Sized {
	async fn new(ctx: Context, config: C) -> anyhow::Result<Self>;
}

pub trait GlobalCtx {
	fn ctx(&self) -> &utils::context::Context;
}

pub trait GlobalConfig {
	#[inline(always)]
	fn config<C>(&self) -> &C
	where
		Self: GlobalConfigProvider<C>,
	{
		GlobalConfigProvider::provide_config(self)
	}
}

pub trait GlobalConfigProvider<C> {
	fn provide_config(&self) -> &C;
}

/// Handlers only hold a `Weak` reference to the global state so that an
/// in-flight request never keeps it alive past shutdown.
pub trait RequestGlobalExt<E> {
	fn get_global<G: Sync + Send + 'static, B: From<Bytes>>(&self) -> Result<Arc<G>, RouteError<E, B>>;
}

impl<E, B> RequestGlobalExt<E> for hyper::Request<B> {
	fn get_global<G: Sync + Send + 'static, B2: From<Bytes>>(&self) -> Result<Arc<G>, RouteError<E, B2>> {
		self.extensions()
			.get::<Weak<G>>()
			.and_then(Weak::upgrade)
			.ok_or_else(|| (StatusCode::INTERNAL_SERVER_ERROR, "global state unavailable").into())
	}
}
