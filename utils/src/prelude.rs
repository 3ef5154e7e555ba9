use std::future::IntoFuture;
use std::time::Duration;

use tokio::time::Timeout;

/// `.timeout(duration)` on anything that can be awaited.
pub trait FutureTimeout: IntoFuture + Sized {
	fn timeout(self, duration: Duration) -> Timeout<Self::IntoFuture> {
		tokio::time::timeout(duration, self)
	}
}

impl<F: IntoFuture> FutureTimeout for F {}
