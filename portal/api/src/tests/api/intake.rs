use std::time::Duration;

use hyper::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use super::TestServer;
use crate::config::{RestStoreConfig, StoreConfig};
use crate::database;
use crate::global::ApiState;
use crate::tests::global::{mock_config, API_KEY};

impl TestServer {
	async fn submit(&self, ip: &str, body: Value) -> reqwest::Response {
		self.client
			.post(self.url("/api/request"))
			.header("x-api-key", API_KEY)
			.header("x-forwarded-for", ip)
			.json(&body)
			.send()
			.await
			.unwrap()
	}
}

fn song(name: &str) -> Value {
	json!({ "name": name, "message": "Never Gonna Give You Up" })
}

#[serial]
#[tokio::test]
async fn test_serial_submit_request() {
	let server = TestServer::start(mock_config()).await;

	let resp = server.submit("1.2.3.4, 10.0.0.1", song("troy")).await;
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.unwrap();
	assert_eq!(body["message"], "Request submitted successfully");
	assert_eq!(body["data"]["by"], "troy");
	assert_eq!(body["data"]["song"], "Never Gonna Give You Up");
	assert_eq!(body["data"]["ip"], "1.2.3.4");
	assert!(body["data"]["id"].is_i64());

	let stored = database::all::<database::Request>(server.global.store()).await.unwrap();
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].by, "troy");
	assert_eq!(stored[0].ip, "1.2.3.4");

	// No forwarding header, the sentinel address is used
	let resp = server
		.client
		.post(server.url("/api/request"))
		.header("x-api-key", API_KEY)
		.json(&song("anon"))
		.send()
		.await
		.unwrap();

	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.json::<Value>().await.unwrap()["data"]["ip"], "0.0.0.0");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_api_key_checked_first() {
	let mut config = mock_config();
	config.extra.intake.rate_limit.points = 1;
	let server = TestServer::start(config).await;

	// Exhaust the quota
	assert_eq!(server.submit("1.2.3.4", song("a")).await.status(), StatusCode::OK);
	assert_eq!(server.submit("1.2.3.4", song("a")).await.status(), StatusCode::TOO_MANY_REQUESTS);

	for key in [None, Some("wrong")] {
		let mut req = server
			.client
			.post(server.url("/api/request"))
			.header("x-forwarded-for", "1.2.3.4")
			.body("not json");

		if let Some(key) = key {
			req = req.header("x-api-key", key);
		}

		let resp = req.send().await.unwrap();
		assert_eq!(resp.status(), StatusCode::FORBIDDEN);
		assert_eq!(
			resp.json::<Value>().await.unwrap(),
			json!({ "message": "Unauthorized", "success": false })
		);
	}

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_whitespace_is_content() {
	let server = TestServer::start(mock_config()).await;

	let resp = server.submit("1.2.3.4", json!({ "name": "   ", "message": " \t" })).await;
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.unwrap();
	assert_eq!(body["data"]["by"], "   ");
	assert_eq!(body["data"]["song"], " \t");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_validation() {
	let mut config = mock_config();
	config.extra.intake.rate_limit.points = 1;
	let server = TestServer::start(config).await;

	let invalid = [
		json!({ "name": "troy" }),
		json!({ "message": "a song" }),
		json!({ "name": "", "message": "a song" }),
		json!({ "name": "troy", "message": "" }),
		json!({ "name": 5, "message": "a song" }),
		json!(["troy", "a song"]),
		json!({}),
	];

	// Validation failures do not use up the quota
	for body in invalid {
		let resp = server.submit("1.2.3.4", body.clone()).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
		assert_eq!(
			resp.json::<Value>().await.unwrap(),
			json!({ "message": "Name and message are required", "success": false })
		);
	}

	let resp = server
		.client
		.post(server.url("/api/request"))
		.header("x-api-key", API_KEY)
		.body("{ not json")
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::OK);

	// Once limited, validation is still reported first
	assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(
		server.submit("1.2.3.4", json!({ "name": "troy" })).await.status(),
		StatusCode::BAD_REQUEST
	);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_rate_limit() {
	let server = TestServer::start(mock_config()).await;

	for _ in 0..4 {
		assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::OK);
	}

	let resp = server.submit("1.2.3.4", song("troy")).await;
	assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(resp.headers()["retry-after"], "300");
	assert_eq!(
		resp.json::<Value>().await.unwrap(),
		json!({ "message": "Rate limit exceeded. Please try again later.", "success": false })
	);

	// Other callers keep their own quota
	assert_eq!(server.submit("5.6.7.8", song("kim")).await.status(), StatusCode::OK);

	let stored = database::all::<database::Request>(server.global.store()).await.unwrap();
	assert_eq!(stored.len(), 5);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_rate_limit_block_expires() {
	let mut config = mock_config();
	config.extra.intake.rate_limit.points = 2;
	config.extra.intake.rate_limit.block_duration = Duration::from_secs(1);
	let server = TestServer::start(config).await;

	assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::OK);
	assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::OK);

	let resp = server.submit("1.2.3.4", song("troy")).await;
	assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(resp.headers()["retry-after"], "1");

	tokio::time::sleep(Duration::from_millis(1100)).await;

	assert_eq!(server.submit("1.2.3.4", song("troy")).await.status(), StatusCode::OK);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_rate_limit_bypass() {
	let mut config = mock_config();
	config.extra.intake.rate_limit.points = 1;
	config.extra.intake.ip_allow_list = vec!["9.9.9.9".to_owned()];
	let server = TestServer::start(config).await;

	for _ in 0..5 {
		assert_eq!(server.submit("9.9.9.9", song("allowed")).await.status(), StatusCode::OK);

		let resp = server
			.client
			.post(server.url("/api/request"))
			.header("x-api-key", API_KEY)
			.header("x-forwarded-for", "1.2.3.4")
			.header("isBot", "true")
			.json(&song("bot"))
			.send()
			.await
			.unwrap();
		assert_eq!(resp.status(), StatusCode::OK);
	}

	// The bot requests did not touch the caller's quota
	assert_eq!(server.submit("1.2.3.4", song("human")).await.status(), StatusCode::OK);
	assert_eq!(server.submit("1.2.3.4", song("human")).await.status(), StatusCode::TOO_MANY_REQUESTS);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_store_failure() {
	let unused = portpicker::pick_unused_port().expect("failed to pick port");

	let mut config = mock_config();
	config.extra.store = StoreConfig::Rest(RestStoreConfig {
		url: format!("http://127.0.0.1:{unused}").parse().unwrap(),
		key: "service-key".to_owned(),
		timeout: Duration::from_secs(1),
	});
	let server = TestServer::start(config).await;

	let resp = server.submit("1.2.3.4", song("troy")).await;
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		resp.json::<Value>().await.unwrap(),
		json!({ "message": "Failed to submit request. Please try again.", "success": false })
	);

	server.shutdown().await;
}
