use chrono::{Duration, Utc};
use hyper::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use super::{json_response, MockServer, TestServer};
use crate::config::JwtConfig;
use crate::database::{self, NewRequest, Staff};
use crate::global::ApiState;
use crate::identity::SessionToken;
use crate::tests::global::{mock_config, API_KEY, IDENTITY_SECRET_KEY, JWT_SECRET};

const STAFF_ID: &str = "1000000000000000001";
const MANAGER_ID: &str = "1000000000000000002";
const OUTSIDER_ID: &str = "1000000000000000003";

async fn mock_identity() -> MockServer {
	MockServer::start(|req| {
		let authorised = req
			.headers()
			.get("authorization")
			.is_some_and(|value| value == format!("Bearer {IDENTITY_SECRET_KEY}").as_str());

		if !authorised {
			return json_response(StatusCode::UNAUTHORIZED, json!({}));
		}

		let discord = |id: &str| json!({ "external_accounts": [{ "provider": "oauth_discord", "provider_user_id": id }] });

		match req.uri().path() {
			"/v1/users/user_staff" => json_response(StatusCode::OK, discord(STAFF_ID)),
			"/v1/users/user_manager" => json_response(StatusCode::OK, discord(MANAGER_ID)),
			"/v1/users/user_outsider" => json_response(StatusCode::OK, discord(OUTSIDER_ID)),
			"/v1/users/user_unlinked" => json_response(
				StatusCode::OK,
				json!({ "external_accounts": [{ "provider": "oauth_google", "provider_user_id": STAFF_ID }] }),
			),
			_ => json_response(StatusCode::NOT_FOUND, json!({})),
		}
	})
	.await
}

fn token(user_id: &str) -> String {
	SessionToken {
		user_id: user_id.to_owned(),
		session_id: Some("sess_1".to_owned()),
		issued_at: Utc::now() - Duration::seconds(10),
		expiration: Some(Utc::now() + Duration::minutes(5)),
		not_before: None,
	}
	.serialize(&JwtConfig {
		secret: JWT_SECRET.to_owned(),
		..Default::default()
	})
	.expect("failed to sign token")
}

async fn start(identity: &MockServer) -> TestServer {
	let mut config = mock_config();
	config.extra.identity.api_url = identity.url.clone();
	config.extra.identity.authorised_ids = vec![STAFF_ID.to_owned(), MANAGER_ID.to_owned()];

	let server = TestServer::start(config).await;

	let store = server.global.store();
	for (name, userid, management, azuracast_id) in [("Troy", STAFF_ID, false, 5), ("Kim", MANAGER_ID, true, 6)] {
		database::insert::<Staff>(
			store,
			json!({
				"name": name,
				"userid": userid,
				"broadcaster": true,
				"managementPermission": management,
				"active": true,
				"azuracastUserID": azuracast_id,
			}),
		)
		.await
		.unwrap();
	}

	server
}

impl TestServer {
	async fn get_as(&self, path: &str, user: &str) -> reqwest::Response {
		self.client
			.get(self.url(path))
			.bearer_auth(token(user))
			.send()
			.await
			.unwrap()
	}

	async fn delete_as(&self, path: &str, user: &str) -> reqwest::Response {
		self.client
			.delete(self.url(path))
			.bearer_auth(token(user))
			.send()
			.await
			.unwrap()
	}
}

fn location(resp: &reqwest::Response) -> &str {
	resp.headers()["location"].to_str().unwrap()
}

#[serial]
#[tokio::test]
async fn test_serial_gate_redirects() {
	let identity = mock_identity().await;
	let server = start(&identity).await;

	// No token at all
	let resp = server.client.get(server.url("/api/staff/requests")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&resp), "/staff/auth");

	// Garbage and unknown users count as signed out
	let resp = server
		.client
		.get(server.url("/api/staff/requests"))
		.bearer_auth("not-a-token")
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&resp), "/staff/auth");

	let resp = server.get_as("/api/staff/requests", "user_deleted").await;
	assert_eq!(resp.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&resp), "/staff/auth");

	// Signed in, but not allowed in
	for user in ["user_outsider", "user_unlinked"] {
		let resp = server.get_as("/api/staff/requests", user).await;
		assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{user}");
		assert_eq!(location(&resp), "/staff/unauthorised");
	}

	// Staff without management permission
	let resp = server.get_as("/api/staff/users", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&resp), "/staff/unauthorised");

	let resp = server.get_as("/api/staff/requests", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::OK);

	// The session cookie is accepted as well
	let resp = server
		.client
		.get(server.url("/api/staff/requests"))
		.header("cookie", format!("theme=dark; __session={}", token("user_staff")))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_manage_requests() {
	let identity = mock_identity().await;
	let server = start(&identity).await;

	let request = database::insert::<database::Request>(
		server.global.store(),
		NewRequest {
			by: "troy",
			ip: "1.2.3.4",
			song: "Midnight City",
		},
	)
	.await
	.unwrap();

	let resp = server.get_as("/api/staff/requests", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: Value = resp.json().await.unwrap();
	assert_eq!(body["data"].as_array().unwrap().len(), 1);
	assert_eq!(body["data"][0]["song"], "Midnight City");

	let resp = server.delete_as("/api/staff/requests/abc", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let path = format!("/api/staff/requests/{}", request.id);
	let resp = server.delete_as(&path, "user_staff").await;
	assert_eq!(resp.status(), StatusCode::OK);

	let resp = server.delete_as(&path, "user_staff").await;
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	assert!(database::all::<database::Request>(server.global.store())
		.await
		.unwrap()
		.is_empty());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_broadcast_details() {
	let identity = mock_identity().await;
	let server = start(&identity).await;

	let resp = server.get_as("/api/staff/me", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.unwrap();
	assert_eq!(body["data"]["staff"]["userid"], STAFF_ID);
	assert_eq!(body["data"]["staff"]["name"], "Troy");
	assert_eq!(
		body["data"]["stream"],
		json!({ "host": "radio.limeradio.net", "port": 8005, "protocol": "Icecast" })
	);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_manage_users() {
	let identity = mock_identity().await;
	let server = start(&identity).await;

	let resp = server.get_as("/api/staff/users", "user_manager").await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: Value = resp.json().await.unwrap();
	assert_eq!(body["data"].as_array().unwrap().len(), 2);

	let troy = database::find_by::<Staff>(server.global.store(), Staff::USER_ID, STAFF_ID)
		.await
		.unwrap()
		.unwrap();

	let resp = server.delete_as("/api/staff/users/x", "user_manager").await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let path = format!("/api/staff/users/{}", troy.id);
	let resp = server.delete_as(&path, "user_manager").await;
	assert_eq!(resp.status(), StatusCode::OK);

	let resp = server.delete_as(&path, "user_manager").await;
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	// A revoked record no longer opens the broadcast screen
	let resp = server.get_as("/api/staff/me", "user_staff").await;
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_toggle_active() {
	let identity = mock_identity().await;
	let server = start(&identity).await;

	let toggle = |key: &'static str, body: Value| {
		server
			.client
			.post(server.url("/api/staff"))
			.bearer_auth(token("user_manager"))
			.header("x-api-key", key)
			.json(&body)
			.send()
	};

	let resp = toggle("wrong", json!({ "id": 5, "isActive": true })).await.unwrap();
	assert_eq!(resp.status(), StatusCode::FORBIDDEN);

	let resp = toggle(API_KEY, json!({ "id": 5, "isActive": true })).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "message": "User deactivated" }));

	let troy = database::find_by::<Staff>(server.global.store(), Staff::USER_ID, STAFF_ID)
		.await
		.unwrap()
		.unwrap();
	assert!(!troy.active);

	let resp = toggle(API_KEY, json!({ "id": 5, "isActive": false })).await.unwrap();
	assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "message": "User activated" }));

	let resp = toggle(API_KEY, json!({ "id": 404, "isActive": true })).await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	let resp = toggle(API_KEY, json!({ "id": "five" })).await.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	// Staff without management permission are sent away before the key is checked
	let resp = server
		.client
		.post(server.url("/api/staff"))
		.bearer_auth(token("user_staff"))
		.header("x-api-key", API_KEY)
		.json(&json!({ "id": 5, "isActive": true }))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::SEE_OTHER);

	server.shutdown().await;
}
