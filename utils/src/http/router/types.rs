#[derive(Debug, Clone, Default)]
pub struct RouteParams(pub Box<[(String, String)]>);

impl RouteParams {
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}
}

#[derive(Debug)]
pub(crate) struct RouteInfo {
	pub route: usize,
	pub middleware: Vec<usize>,
}
