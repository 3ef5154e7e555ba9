use super::Model;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Staff {
	pub id: i64,
	pub name: String,
	/// Id of the linked chat platform account
	pub userid: String,
	#[serde(default)]
	pub broadcaster: bool,
	#[serde(default)]
	pub credentials: Option<String>,
	#[serde(rename = "managementPermission", default)]
	pub management_permission: bool,
	#[serde(default)]
	pub active: bool,
	/// Id of the matching user on the streaming server
	#[serde(rename = "azuracastUserID", default)]
	pub azuracast_user_id: Option<i64>,
}

impl Model for Staff {
	const COLLECTION: &'static str = "staff";
}

impl Staff {
	pub const USER_ID: &'static str = "userid";
	pub const AZURACAST_USER_ID: &'static str = "azuracastUserID";
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StaffStatusUpdate {
	pub active: bool,
}
