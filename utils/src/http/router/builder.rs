use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use super::middleware::{Middleware, NextFn};
use super::route::RouterItem;
use super::types::RouteInfo;
use super::{Router, ANY_METHOD};

/// Middlewares run in this order regardless of the order they were added:
/// data first so that everything below can see it, then the error handler so
/// that it catches failures raised by the remaining middlewares.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Clone, Copy)]
enum MiddlewareKind {
	Data,
	Error,
	Generic,
}

pub struct RouterBuilder<I, O, E> {
	tree: Vec<(&'static str, RouterItem<I, O, E>)>,
	middlewares: Vec<(Arc<dyn Middleware<I, O, E>>, MiddlewareKind)>,
}

impl<I, O, E> Debug for RouterBuilder<I, O, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterBuilder").field("tree", &self.tree).finish()
	}
}

impl<I: Send + 'static, O: Send + 'static, E: Send + 'static> Default for RouterBuilder<I, O, E> {
	fn default() -> Self {
		Self::new()
	}
}

fn join_path(parent: &str, path: &str) -> String {
	let parent = parent.trim_matches('/');
	let path = path.trim_matches('/');

	match (parent.is_empty(), path.is_empty()) {
		(true, _) => path.to_owned(),
		(_, true) => parent.to_owned(),
		_ => format!("{parent}/{path}"),
	}
}

/// Shorthands for [`RouterBuilder::add_route`] with a fixed method.
macro_rules! method_routes {
	($($(#[$meta:meta])* $name:ident => $method:expr),* $(,)?) => {
		$(
			$(#[$meta])*
			pub fn $name<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
				self,
				path: &'static str,
				handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
			) -> Self {
				self.add_route($method, path, handler)
			}
		)*
	};
}

impl<I: Send + 'static, O: Send + 'static, E: Send + 'static> RouterBuilder<I, O, E> {
	pub fn new() -> Self {
		Self {
			tree: Vec::new(),
			middlewares: Vec::new(),
		}
	}

	/// Wraps every route in this scope, and the scopes nested in it, with
	/// `middleware`. The middleware may also register routes of its own.
	pub fn middleware(mut self, middleware: impl Middleware<I, O, E>) -> Self {
		let middleware: Arc<dyn Middleware<I, O, E>> = Arc::new(middleware);
		self = middleware.extend(self);
		self.middlewares.push((middleware, MiddlewareKind::Generic));
		self
	}

	/// Inserts a clone of `data` into the extensions of every request.
	pub fn data<T: Clone + Send + Sync + 'static>(mut self, data: T) -> Self {
		self.middlewares.push((
			Arc::new(move |mut req: hyper::Request<I>, next: NextFn<I, O, E>| {
				req.extensions_mut().insert(data.clone());
				next(req)
			}),
			MiddlewareKind::Data,
		));

		self
	}

	/// Turns errors returned by routes and middlewares into responses.
	pub fn error_handler<F: Future<Output = hyper::Response<O>> + Send + 'static>(
		mut self,
		handler: impl Fn(hyper::Request<()>, E) -> F + Send + Sync + 'static,
	) -> Self {
		let handler = Arc::new(handler);
		self.middlewares.push((
			Arc::new(move |req: hyper::Request<I>, next: NextFn<I, O, E>| {
				let handler = handler.clone();
				async move {
					let (parts, body) = req.into_parts();

					match next(hyper::Request::from_parts(parts.clone(), body)).await {
						Ok(res) => Ok(res),
						Err(err) => Ok(handler(hyper::Request::from_parts(parts, ()), err).await),
					}
				}
			}),
			MiddlewareKind::Error,
		));

		self
	}

	method_routes! {
		get => Some(hyper::Method::GET),
		post => Some(hyper::Method::POST),
		delete => Some(hyper::Method::DELETE),
		options => Some(hyper::Method::OPTIONS),
		/// Matches every method that has no route of its own on `path`.
		any => None,
	}

	/// Registers `handler` for `method`, or for every method when `None`.
	pub fn add_route<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		mut self,
		method: Option<hyper::Method>,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.tree.push((
			path,
			RouterItem::Route {
				method,
				handler: Arc::new(move |req| Box::pin(handler(req))),
			},
		));
		self
	}

	/// Nests `router` under `path`. The nested routes inherit the middlewares
	/// of this scope.
	pub fn scope(mut self, path: &'static str, router: RouterBuilder<I, O, E>) -> Self {
		self.tree.push((path, RouterItem::Scope(router)));
		self
	}

	/// Catches every request that no other route in this scope matched.
	pub fn not_found<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(None, "/*", handler)
	}

	fn build_scoped(mut self, parent_path: &str, target: &mut Router<I, O, E>, inherited: &[usize]) {
		self.middlewares.sort_by_key(|(_, kind)| *kind);

		let middlewares = inherited
			.iter()
			.copied()
			.chain(self.middlewares.into_iter().map(|(middleware, _)| {
				target.middlewares.push(middleware);
				target.middlewares.len() - 1
			}))
			.collect::<Vec<_>>();

		for (path, item) in self.tree {
			match item {
				RouterItem::Route { method, handler } => {
					target.routes.push(handler);

					let method = method.as_ref().map(|m| m.as_str()).unwrap_or(ANY_METHOD);
					let full_path = format!("/{method}/{}", join_path(parent_path, path));

					tracing::debug!(full_path, "adding route");

					let _ = target.tree.insert(
						&full_path,
						RouteInfo {
							route: target.routes.len() - 1,
							middleware: middlewares.clone(),
						},
					);
				}
				RouterItem::Scope(router) => router.build_scoped(&join_path(parent_path, path), target, &middlewares),
			}
		}
	}

	pub fn build(self) -> Router<I, O, E> {
		let mut router = Router {
			routes: Vec::new(),
			middlewares: Vec::new(),
			tree: path_tree::PathTree::new(),
		};

		self.build_scoped("", &mut router, &[]);

		router
	}
}
