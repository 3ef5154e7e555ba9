use hyper::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use super::{json_response, MockServer, TestServer};
use crate::tests::global::mock_config;

fn now_playing() -> Value {
	json!({
		"now_playing": {
			"song": {
				"title": "Midnight City",
				"artist": "M83",
				"art": "https://radio.limeradio.net/api/station/lime/art/42",
			}
		},
		"live": {
			"is_live": true,
			"streamer_name": "DJ Troy",
			"avatar_url": null,
		}
	})
}

#[serial]
#[tokio::test]
async fn test_serial_stats() {
	let radio = MockServer::start(|req| match req.uri().path() {
		"/api/nowplaying/lime" => json_response(StatusCode::OK, now_playing()),
		_ => json_response(StatusCode::NOT_FOUND, json!({})),
	})
	.await;

	let mut config = mock_config();
	config.extra.radio.base_url = radio.url.clone();
	let server = TestServer::start(config).await;

	let resp = server.client.get(server.url("/api/stats?t=1700000000")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.unwrap();
	assert_eq!(body, json!({ "data": now_playing() }));
	assert_eq!(body["data"]["now_playing"]["song"]["title"], "Midnight City");

	// The cache buster is not forwarded
	assert_eq!(radio.hits(), vec!["/api/nowplaying/lime"]);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_stats_upstream_failures() {
	let radio = MockServer::start(|_| json_response(StatusCode::SERVICE_UNAVAILABLE, json!({}))).await;

	let mut config = mock_config();
	config.extra.radio.base_url = radio.url.clone();
	let server = TestServer::start(config).await;

	let resp = server.client.get(server.url("/api/stats")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(resp.json::<Value>().await.unwrap()["success"], false);

	server.shutdown().await;

	let unused = portpicker::pick_unused_port().expect("failed to pick port");
	let mut config = mock_config();
	config.extra.radio.base_url = format!("http://127.0.0.1:{unused}").parse().unwrap();
	let server = TestServer::start(config).await;

	let resp = server.client.get(server.url("/api/stats")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

	server.shutdown().await;
}
