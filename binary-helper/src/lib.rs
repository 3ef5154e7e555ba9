use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
pub use config::Config;
pub use global::Global;
use tokio::task::JoinHandle;
use tokio::{select, time};
use utils::context::{Context, Handler};
use utils::signal::SignalHandler;

pub mod config;
pub mod global;
pub mod logging;

/// How long running tasks get to wind down after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Runs a binary: loads its config, sets up logging and the global state,
/// then drives `process` until it exits or the process is signalled.
pub async fn bootstrap<C: Config, G: Global<C>, F: Future<Output = anyhow::Result<()>> + Send + 'static>(
	process: impl FnOnce(Arc<G>) -> F,
) -> anyhow::Result<()> {
	let (ctx, handler) = Context::new();

	let config = C::parse()
		.and_then(|mut config| {
			config.pre_hook()?;
			Ok(config)
		})
		.map_err(|err| {
			// Nothing is configured yet, make sure the failure is still visible.
			let _ = logging::init("info", Default::default());
			tracing::error!("{err:#}");
			err
		})
		.context("failed to parse config")?;

	logging::init(&config.logging().level, config.logging().mode).context("failed to init logging")?;

	tracing::info!(name = config.name(), "starting up");

	let global = Arc::new(G::new(ctx, config).await.context("failed to create global state")?);

	tracing::debug!("global state created, starting process");

	let mut signal_handler = SignalHandler::shutdown().context("failed to listen for signals")?;

	supervise(tokio::spawn(process(global)), &mut signal_handler, handler, SHUTDOWN_GRACE).await
}

/// Waits for `process` to exit or for a signal, then cancels every context.
/// Anything but a signal is reported as an error once shutdown is done.
async fn supervise(
	process: JoinHandle<anyhow::Result<()>>,
	signal_handler: &mut SignalHandler,
	handler: Handler,
	grace: Duration,
) -> anyhow::Result<()> {
	let result = select! {
		_ = signal_handler.recv() => {
			tracing::info!("shutting down");
			Ok(())
		}
		r = process => match r {
			Ok(Ok(())) => Err(anyhow::anyhow!("process stopped unexpectedly")),
			Ok(Err(err)) => Err(err.context("process stopped unexpectedly")),
			Err(err) => Err(anyhow::Error::new(err).context("process panicked")),
		},
	};

	tracing::info!("waiting for tasks to finish");

	select! {
		_ = time::sleep(grace) => tracing::warn!("force shutting down"),
		_ = signal_handler.recv() => tracing::warn!("force shutting down"),
		_ = handler.cancel() => tracing::info!("shut down cleanly"),
	}

	result
}
