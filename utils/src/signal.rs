use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Fans several unix signals into a single receiver.
pub struct SignalHandler {
	send: mpsc::Sender<SignalKind>,
	recv: mpsc::Receiver<SignalKind>,
}

impl Default for SignalHandler {
	fn default() -> Self {
		let (send, recv) = mpsc::channel(1);
		Self { send, recv }
	}
}

impl SignalHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Listens for `SIGINT` and `SIGTERM`.
	pub fn shutdown() -> io::Result<Self> {
		Self::new()
			.with_signal(SignalKind::interrupt())?
			.with_signal(SignalKind::terminate())
	}

	/// Must be called from within a tokio runtime.
	pub fn with_signal(self, kind: SignalKind) -> io::Result<Self> {
		let mut stream = signal(kind)?;

		let send = self.send.clone();
		tokio::spawn(async move {
			while stream.recv().await.is_some() {
				if send.send(kind).await.is_err() {
					break;
				}
			}
		});

		Ok(self)
	}

	/// The next signal received. Never resolves if no signal is registered.
	pub async fn recv(&mut self) -> SignalKind {
		loop {
			// The handler keeps a sender alive, so the channel never closes.
			if let Some(kind) = self.recv.recv().await {
				return kind;
			}
		}
	}
}
