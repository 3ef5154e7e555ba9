use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::builder::RouterBuilder;

pub(crate) type RouteHandler<I, O, E> = Arc<
	dyn Fn(hyper::Request<I>) -> Pin<Box<dyn Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>>
		+ Send
		+ Sync
		+ 'static,
>;

pub(crate) enum RouterItem<I, O, E> {
	Route {
		method: Option<hyper::Method>,
		handler: RouteHandler<I, O, E>,
	},
	Scope(RouterBuilder<I, O, E>),
}

impl<I, O, E> Debug for RouterItem<I, O, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Route { method, .. } => f.debug_struct("Route").field("method", method).finish(),
			Self::Scope(builder) => write!(f, "Scope({builder:?})"),
		}
	}
}
