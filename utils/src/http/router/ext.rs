use super::types::RouteParams;

pub trait RequestExt {
	/// A path parameter captured by the matched route, such as `id` in
	/// `/requests/:id`.
	fn param(&self, key: &str) -> Option<&str>;

	fn data<T: Send + Sync + 'static>(&self) -> Option<&T>;
}

impl<I> RequestExt for hyper::Request<I> {
	fn param(&self, key: &str) -> Option<&str> {
		self.extensions()
			.get::<RouteParams>()
			.and_then(|params| params.get(key))
	}

	fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.extensions().get::<T>()
	}
}
