use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use self::builder::RouterBuilder;
use self::error::RouterError;
use self::middleware::{Middleware, NextFn, NextFut};
use self::route::RouteHandler;
use self::types::{RouteInfo, RouteParams};

pub mod builder;
pub mod error;
pub mod ext;
pub mod middleware;
pub mod route;
pub mod types;


/// Marks routes that accept every method.
pub(crate) const ANY_METHOD: &str = "ANY";

/// A method aware path router. Routes are stored in the tree as
/// `/{METHOD}/{path}`, method specific routes win over [`ANY_METHOD`] ones.
pub struct Router<I, O, E> {
	routes: Vec<RouteHandler<I, O, E>>,
	middlewares: Vec<Arc<dyn Middleware<I, O, E>>>,
	tree: path_tree::PathTree<RouteInfo>,
}

impl<I: Send + 'static, O: Send + 'static, E: Send + 'static> Router<I, O, E> {
	pub fn builder() -> RouterBuilder<I, O, E> {
		RouterBuilder::new()
	}

	fn lookup(&self, method: &hyper::Method, path: &str) -> Option<(&RouteInfo, RouteParams)> {
		[method.as_str(), ANY_METHOD].into_iter().find_map(|method| {
			let key = format!("/{method}{path}");
			let (info, path) = self.tree.find(&key)?;
			let params = path.params_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
			Some((info, RouteParams(params)))
		})
	}

	pub async fn handle(&self, mut req: hyper::Request<I>) -> Result<hyper::Response<O>, RouterError<E>> {
		let (info, params) = self
			.lookup(req.method(), req.uri().path())
			.ok_or(RouterError::NotFound)?;

		req.extensions_mut().insert(params);

		let handler = self.routes[info.route].clone();
		let next: NextFn<I, O, E> = Box::new(move |req| Box::pin(async move { handler(req).await }) as NextFut<O, E>);

		let chain = info
			.middleware
			.iter()
			.rev()
			.map(|idx| self.middlewares[*idx].clone())
			.fold(next, |next, middleware| {
				Box::new(move |req| Box::pin(async move { middleware.handle(req, next).await }) as NextFut<O, E>)
					as NextFn<I, O, E>
			});

		chain(req).await.map_err(RouterError::Unhandled)
	}
}

impl<I, O, E> Debug for Router<I, O, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router").field("routes", &self.routes.len()).finish()
	}
}
