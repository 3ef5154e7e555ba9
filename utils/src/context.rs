use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

struct RawContext {
	// Dropped once every clone of the context is gone, which releases `Handler::cancel`.
	_alive: oneshot::Sender<()>,
	cancel_receiver: broadcast::Receiver<()>,
}

/// A cloneable cancellation signal shared by every long-lived task of the
/// process.
///
/// The paired [`Handler`] cancels the context and then waits until every
/// clone has been dropped, so holding a context keeps shutdown pending.
#[derive(Clone)]
pub struct Context(Arc<RawContext>);

pub struct Handler {
	alive: oneshot::Receiver<()>,
	cancel_sender: broadcast::Sender<()>,
}

impl Context {
	#[must_use]
	pub fn new() -> (Self, Handler) {
		let (alive_sender, alive) = oneshot::channel();
		let (cancel_sender, cancel_receiver) = broadcast::channel(1);

		(
			Self(Arc::new(RawContext {
				_alive: alive_sender,
				cancel_receiver,
			})),
			Handler { alive, cancel_sender },
		)
	}

	/// Resolves once the handler has cancelled the context.
	pub async fn done(&self) {
		let mut recv = self.0.cancel_receiver.resubscribe();
		// The sender is never used to send, so the only way out is it being dropped.
		let _ = recv.recv().await;
	}
}

impl Handler {
	/// Resolves once every context clone has been dropped, without cancelling.
	pub async fn done(&mut self) {
		let _ = (&mut self.alive).await;
	}

	/// Cancels every context and waits for all of them to be dropped.
	pub async fn cancel(self) {
		drop(self.cancel_sender);

		let _ = self.alive.await;
	}
}
