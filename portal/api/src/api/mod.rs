use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpSocket;
use tokio::select;
use utils::http::router::error::RouterError;
use utils::http::router::middleware::{CorsMiddleware, CorsOptions};
use utils::http::router::Router;
use utils::http::RouteError;
use utils::make_response;

use self::error::ApiError;
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub mod error;
pub mod ext;
mod image;
mod intake;
pub mod middleware;
mod staff;
mod stats;

pub type Body = Full<Bytes>;

fn cors_options(config: &ApiConfig) -> CorsOptions {
	CorsOptions {
		allow_origin: config.allow_origins.clone(),
		allow_methods: ["GET", "POST", "DELETE", "OPTIONS"].map(String::from).to_vec(),
		allow_headers: ["content-type", "authorization", "x-api-key", "isbot"].map(String::from).to_vec(),
		expose_headers: vec!["retry-after".to_owned()],
		max_age_seconds: Some(3600),
	}
}

fn not_found() -> hyper::Response<Body> {
	make_response!(StatusCode::NOT_FOUND, json!({ "message": "not found", "success": false }))
}

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> Router<Incoming, Body, RouteError<ApiError>> {
	let weak = Arc::downgrade(global);

	Router::builder()
		.data(weak)
		// Outside the error handler so that error responses get CORS headers too
		.middleware(CorsMiddleware::new(&cors_options(global.config::<ApiConfig>())))
		.scope(
			"/",
			Router::builder()
				.error_handler(utils::http::error_handler::<ApiError, _>)
				.get("/health", |_| async { Ok(make_response!(StatusCode::OK, json!({ "status": "ok" }))) })
				.scope(
					"/api",
					Router::builder()
						.post("/request", intake::submit::<G>)
						.get("/image", image::get::<G>)
						.get("/stats", stats::get::<G>)
						.scope("/staff", staff::routes::<G>()),
				)
				.not_found(|_| async { Ok(not_found()) }),
		)
		.build()
}

pub async fn run<G: ApiGlobal>(global: Arc<G>) -> anyhow::Result<()> {
	let config = global.config::<ApiConfig>();

	tracing::info!("listening on {}", config.bind_address);
	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	// Requests only see a Weak reference to the global state, an open
	// keep-alive connection must not hold up shutdown.
	let router = Arc::new(routes(&global));
	let service = service_fn(move |req| {
		let router = router.clone();
		async move {
			Ok::<_, Infallible>(match router.handle(req).await {
				Ok(res) => res,
				Err(RouterError::NotFound) => not_found(),
				Err(RouterError::Unhandled(err)) => err.response(),
			})
		}
	});

	loop {
		select! {
			_ = global.ctx().done() => {
				return Ok(());
			},
			r = listener.accept() => {
				let (socket, addr) = r?;
				let service = service.clone();

				tracing::debug!("accepted connection from {}", addr);

				tokio::spawn(async move {
					if let Err(err) = http1::Builder::new().serve_connection(TokioIo::new(socket), service).await {
						tracing::debug!(error = %err, "connection closed with error");
					}
				});
			},
		}
	}
}
