use chrono::{DateTime, Utc};

use super::Model;

/// A listener's song request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Request {
	pub id: i64,
	/// The requester's name
	pub by: String,
	pub song: String,
	pub ip: String,
	pub created_at: DateTime<Utc>,
}

impl Model for Request {
	const COLLECTION: &'static str = "rdb";
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NewRequest<'a> {
	pub by: &'a str,
	pub ip: &'a str,
	pub song: &'a str,
}
