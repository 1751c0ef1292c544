//! Transport primitives for API calls.
//!
//! The module exposes [`ApiTransport`] alongside the owned [`ApiRequest`] and
//! [`ApiResponse`] values so downstream crates (and tests) can plug in custom HTTP stacks
//! without touching the session or request layers. Transports only move bytes: status
//! classification, credential attachment, and retries live above this module.

// self
use crate::{_prelude::*, error::PayloadError, error::TransportError};

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing API calls.
///
/// The trait is the client's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by every clone of a session, and
/// the returned futures must be `Send` so callers can spawn them on multi-threaded
/// executors. Implementations report transport failures only; any HTTP response, including
/// 4xx and 5xx, is a successful [`ApiResponse`].
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the task API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// Idempotent read.
	Get,
	/// Create or action.
	Post,
	/// Full replacement.
	Put,
	/// Partial update.
	Patch,
	/// Removal.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	/// Returns `true` for methods whose concurrent duplicates may share one network call.
	pub const fn is_idempotent_read(self) -> bool {
		matches!(self, Method::Get)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Owned request handed to an [`ApiTransport`].
///
/// Header names are stored lowercase.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// JSON body bytes, if any.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None }
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Attaches a serialized JSON body and the matching content type.
	pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self.with_header("content-type", "application/json")
	}

	/// Serializes `body` as JSON and attaches it.
	pub fn with_json<B>(self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(PayloadError::encode)?;

		Ok(self.with_json_body(bytes))
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let shown = if is_sensitive_header(name) { "<redacted>" } else { value.as_str() };

				(name.as_str(), shown)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Raw API response; cheap to clone so coalesced readers can share one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Response body bytes.
	pub body: Arc<[u8]>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<Arc<[u8]>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for 401 responses.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|e| PayloadError::decode(e, self.status).into())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::from_config`] enables a cookie store so ambient session cookies set by
/// the API (including a cookie-borne refresh token) ride along on every request.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a cookie-aware client honoring the configured timeout and user agent.
	pub fn from_config(
		config: &crate::config::ClientConfig,
	) -> Result<Self, crate::error::ConfigError> {
		let timeout = std::time::Duration::try_from(config.timeout)
			.map_err(|_| crate::error::ConfigError::NonPositiveTimeout)?;
		let mut builder = ReqwestClient::builder().cookie_store(true).timeout(timeout);

		if let Some(user_agent) = config.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		let client = builder.build().map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body } = request;
			let mut builder = client.request(method.into(), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?;

			Ok(ApiResponse { status, headers, body: Arc::from(body.as_ref()) })
		})
	}
}

fn is_sensitive_header(name: &str) -> bool {
	matches!(name, "authorization" | "cookie") || name.contains("token")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Envelope {
		#[allow(dead_code)]
		session: Session,
	}

	#[derive(Debug, Deserialize)]
	struct Session {
		#[allow(dead_code)]
		token: String,
	}

	#[test]
	fn request_debug_redacts_credentials() {
		let url = Url::parse("https://api.example.com/tasks").expect("Fixture URL should parse.");
		let request = ApiRequest::new(Method::Get, url)
			.with_header("Authorization", "Bearer secret-access")
			.with_header("X-Refresh-Token", "secret-refresh")
			.with_header("Accept", "application/json");
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("secret-access"));
		assert!(!rendered.contains("secret-refresh"));
		assert!(rendered.contains("application/json"));
		assert_eq!(request.header("AUTHORIZATION"), Some("Bearer secret-access"));
	}

	#[test]
	fn json_decode_reports_path_and_status() {
		let response = ApiResponse::new(200, br#"{"session":{"token":42}}"#.to_vec());
		let err = response.json::<Envelope>().expect_err("Numeric token should fail to decode.");

		match err {
			Error::Payload(PayloadError::Decode { path, status, .. }) => {
				assert_eq!(path, "session.token");
				assert_eq!(status, 200);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn methods_classify_reads() {
		assert!(Method::Get.is_idempotent_read());
		assert!(!Method::Post.is_idempotent_read());
		assert_eq!(Method::Patch.to_string(), "PATCH");
	}
}
