use hyper::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use super::{json_response, response, MockServer, TestServer};
use crate::tests::global::mock_config;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

async fn mock_radio() -> MockServer {
	MockServer::start(|req| match req.uri().path() {
		"/api/station/lime/art/42" => response(StatusCode::OK, Some("image/png"), PNG),
		"/api/station/lime/art/untyped" => response(StatusCode::OK, None, PNG),
		_ => json_response(StatusCode::NOT_FOUND, json!({ "error": "not found" })),
	})
	.await
}

async fn start(radio: &MockServer) -> TestServer {
	let mut config = mock_config();
	config.extra.radio.base_url = radio.url.clone();
	TestServer::start(config).await
}

#[serial]
#[tokio::test]
async fn test_serial_image_relayed() {
	let radio = mock_radio().await;
	let server = start(&radio).await;

	let resp = server.client.get(server.url("/api/image?id=42")).send().await.unwrap();

	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()["content-type"], "image/png");
	assert_eq!(resp.bytes().await.unwrap().as_ref(), PNG);
	assert_eq!(radio.hits(), vec!["/api/station/lime/art/42"]);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_image_missing_id() {
	let radio = mock_radio().await;
	let server = start(&radio).await;

	for path in ["/api/image", "/api/image?id=", "/api/image?other=42"] {
		let resp = server.client.get(server.url(path)).send().await.unwrap();
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{path}");
		assert_eq!(
			resp.json::<Value>().await.unwrap(),
			json!({ "message": "Missing ID parameter", "success": false })
		);
	}

	assert!(radio.hits().is_empty());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_image_upstream_failures() {
	let radio = mock_radio().await;
	let server = start(&radio).await;

	let resp = server.client.get(server.url("/api/image?id=7")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	assert_eq!(
		resp.json::<Value>().await.unwrap(),
		json!({ "message": "Failed to fetch image", "success": false })
	);

	let resp = server.client.get(server.url("/api/image?id=untyped")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		resp.json::<Value>().await.unwrap(),
		json!({ "message": "Invalid content type", "success": false })
	);

	assert_eq!(radio.hits(), vec!["/api/station/lime/art/7", "/api/station/lime/art/untyped"]);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_image_upstream_unreachable() {
	let unused = portpicker::pick_unused_port().expect("failed to pick port");

	let mut config = mock_config();
	config.extra.radio.base_url = format!("http://127.0.0.1:{unused}").parse().unwrap();
	let server = TestServer::start(config).await;

	let resp = server.client.get(server.url("/api/image?id=42")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		resp.json::<Value>().await.unwrap(),
		json!({ "message": "Internal Server Error", "success": false })
	);

	server.shutdown().await;
}
