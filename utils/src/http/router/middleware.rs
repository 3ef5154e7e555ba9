use std::future::Future;
use std::pin::Pin;

mod cors;

pub use cors::{CorsMiddleware, CorsOptions};

use super::builder::RouterBuilder;

/// The rest of the chain: the middlewares below this one and finally the
/// route itself.
pub type NextFn<I, O, E> = Box<dyn FnOnce(hyper::Request<I>) -> NextFut<O, E> + Sync + Send + 'static>;
pub type NextFut<O, E> = Pin<Box<dyn Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>>;

/// Wraps the routes of a scope. A middleware may answer on its own,
/// rewrite the request before calling `next`, or rewrite the response after.
#[async_trait::async_trait]
pub trait Middleware<I: Send, O: Send, E: Send>: Sync + Send + 'static {
	async fn handle(&self, req: hyper::Request<I>, next: NextFn<I, O, E>) -> Result<hyper::Response<O>, E>;

	/// Called once when the middleware is attached to a scope, so that it can
	/// register routes of its own.
	fn extend(&self, builder: RouterBuilder<I, O, E>) -> RouterBuilder<I, O, E> {
		builder
	}
}

/// Pins down the types of a closure middleware, which the compiler cannot
/// always infer from the blanket impl alone.
pub fn middleware_fn<I, O, E, F, Fut>(f: F) -> impl Middleware<I, O, E>
where
	I: Send + 'static,
	O: Send + 'static,
	E: Send + 'static,
	F: Fn(hyper::Request<I>, NextFn<I, O, E>) -> Fut + Sync + Send + 'static,
	Fut: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static,
{
	f
}

#[async_trait::async_trait]
impl<I, O, E, F, Fut> Middleware<I, O, E> for F
where
	I: Send + 'static,
	O: Send + 'static,
	E: Send + 'static,
	F: Fn(hyper::Request<I>, NextFn<I, O, E>) -> Fut + Sync + Send + 'static,
	Fut: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static,
{
	async fn handle(&self, req: hyper::Request<I>, next: NextFn<I, O, E>) -> Result<hyper::Response<O>, E> {
		(self)(req, next).await
	}
}
