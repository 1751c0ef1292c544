// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, http::Method};

/// Normalized identity of a request, used to coalesce identical concurrent reads.
///
/// Two keys are equal when their method, path, and query pairs match. Query pairs are
/// stable-sorted by name, so `?b=2&a=1` and `?a=1&b=2` name the same read while repeated
/// names keep their relative order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
}
impl RequestKey {
	/// Parses a key from a method and an API path that may carry a query string.
	pub fn new(method: Method, path_and_query: &str) -> Self {
		let (path, raw_query) = match path_and_query.split_once('?') {
			Some((path, query)) => (path, query),
			None => (path_and_query, ""),
		};
		let mut query = form_urlencoded::parse(raw_query.as_bytes())
			.map(|(name, value)| (name.into_owned(), value.into_owned()))
			.collect::<Vec<_>>();

		query.sort_by(|a, b| a.0.cmp(&b.0));

		Self { method, path: path.to_owned(), query }
	}

	/// Shorthand for a `GET` key.
	pub fn get(path_and_query: &str) -> Self {
		Self::new(Method::Get, path_and_query)
	}

	/// Appends a query pair, keeping pairs sorted by name.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();
		let at = self.query.partition_point(|(existing, _)| *existing <= name);

		self.query.insert(at, (name, value.into()));

		self
	}

	/// Returns the HTTP method.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Returns the path without its query.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns the sorted query pairs.
	pub fn query(&self) -> &[(String, String)] {
		&self.query
	}

	/// Renders the normalized path and query.
	pub fn path_and_query(&self) -> String {
		if self.query.is_empty() {
			return self.path.clone();
		}

		let query = form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.query.iter().map(|(name, value)| (name.as_str(), value.as_str())))
			.finish();

		format!("{}?{query}", self.path)
	}
}
impl Display for RequestKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} {}", self.method, self.path_and_query())
	}
}
