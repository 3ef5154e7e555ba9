use portal_api::config::AppConfig;
use portal_api::global::GlobalState;

#[tokio::main]
pub async fn main() {
	if let Err(err) = binary_helper::bootstrap::<AppConfig, GlobalState, _>(|global| async move {
		portal_api::api::run(global).await
	})
	.await
	{
		tracing::error!("{:#}", err);
		std::process::exit(1);
	}
}
