//! Client-level error taxonomy shared by the session, request, and task layers.
//!
//! Every error is cheap to clone so coalesced callers can receive the same failure value.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

const SERVER_ERROR_MESSAGE: &str = "The server encountered an error. Please try again later.";
const DETAIL_FIELDS: [&str; 4] = ["detail", "message", "error", "title"];

/// Coarse classification of an [`Error`], used by callers to pick a UI reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Transport failure; never retried automatically.
	Network,
	/// Credential expired and could not be recovered; the caller must sign in again.
	AuthExpired,
	/// Request rejected with a structured 4xx detail.
	Validation,
	/// Upstream 5xx or otherwise unexpected status.
	Server,
	/// Request or response body could not be (de)serialized.
	Payload,
	/// Local configuration problem.
	Config,
	/// Credential store failure.
	Storage,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Network => "network",
			ErrorKind::AuthExpired => "auth_expired",
			ErrorKind::Validation => "validation",
			ErrorKind::Server => "server",
			ErrorKind::Payload => "payload",
			ErrorKind::Config => "config",
			ErrorKind::Storage => "storage",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical client error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Body encoding or decoding failure.
	#[error(transparent)]
	Payload(#[from] PayloadError),

	/// The credential expired and refresh-and-retry could not recover it.
	#[error("Session has expired. Sign in again.")]
	AuthExpired,
	/// The API rejected the request with a 4xx status.
	#[error("{message}")]
	Validation {
		/// HTTP status code.
		status: u16,
		/// Detail message taken verbatim from the response body when available.
		message: String,
	},
	/// The API failed with a 5xx (or unexpected) status.
	#[error("{message}")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Generic message safe to show to end users.
		message: String,
	},
}
impl Error {
	/// Classifies a non-success response.
	///
	/// 4xx statuses become [`Error::Validation`] carrying the first string found under
	/// `detail`, `message`, `error`, or `title` in a JSON body. Everything else becomes
	/// [`Error::Server`] with a generic message. A 401 is not special-cased here; the
	/// request layer decides when a 401 means the session expired.
	pub fn from_status(status: u16, body: &[u8]) -> Self {
		if (400..500).contains(&status) {
			let message = extract_detail(body)
				.unwrap_or_else(|| format!("Request failed: {}.", canonical_reason(status)));

			Self::Validation { status, message }
		} else {
			Self::Server { status, message: SERVER_ERROR_MESSAGE.into() }
		}
	}

	/// Returns the coarse classification for this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Storage(_) => ErrorKind::Storage,
			Self::Config(_) => ErrorKind::Config,
			Self::Transport(_) => ErrorKind::Network,
			Self::Payload(_) => ErrorKind::Payload,
			Self::AuthExpired => ErrorKind::AuthExpired,
			Self::Validation { .. } => ErrorKind::Validation,
			Self::Server { .. } => ErrorKind::Server,
		}
	}

	/// Returns `true` when the caller must send the user back to sign-in.
	pub fn is_auth_expired(&self) -> bool {
		matches!(self, Self::AuthExpired)
	}

	/// Returns the HTTP status carried by response-derived errors.
	///
	/// [`Error::AuthExpired`] carries none: the session may have expired through a refresh
	/// that failed on the network or with a 5xx.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
			Self::Payload(PayloadError::Decode { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed: {message}.")]
	HttpClientBuild {
		/// Underlying transport builder failure, rendered.
		message: String,
	},
	/// Base URL cannot be used as a prefix for API paths.
	#[error("Base URL `{url}` cannot be used as an API prefix.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Secure credential policy requires HTTPS.
	#[error("Base URL must use HTTPS when the credential policy is secure: {url}.")]
	InsecureBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Endpoint paths must be absolute.
	#[error("The {endpoint} endpoint path must start with `/`: {path}.")]
	InvalidEndpointPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// Header names must be non-empty visible ASCII tokens.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// Credential lifetimes must be positive.
	#[error("The {name} lifetime must be positive.")]
	NonPositiveTtl {
		/// Which lifetime failed validation.
		name: &'static str,
	},
	/// Request timeout must be positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` is invalid: {source}.")]
	InvalidRequestPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl Display) -> Self {
		Self::HttpClientBuild { message: src.to_string() }
	}
}

/// Transport-level failures (network, timeouts).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Request did not complete within the configured timeout.
	#[error("Request to the API timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: SharedError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Body (de)serialization failures.
#[derive(Clone, Debug, ThisError)]
pub enum PayloadError {
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Encode {
		/// Structured serialization failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
	/// Response body did not match the expected shape.
	#[error("API returned malformed JSON at `{path}`.")]
	Decode {
		/// JSON path where decoding failed.
		path: String,
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
}
impl PayloadError {
	pub(crate) fn encode(e: serde_json::Error) -> Self {
		Self::Encode { source: Arc::new(e) }
	}

	pub(crate) fn decode(e: serde_path_to_error::Error<serde_json::Error>, status: u16) -> Self {
		let path = e.path().to_string();

		Self::Decode { path, status, source: Arc::new(e.into_inner()) }
	}
}

fn extract_detail(body: &[u8]) -> Option<String> {
	let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
	let object = value.as_object()?;

	DETAIL_FIELDS
		.iter()
		.filter_map(|field| object.get(*field).and_then(serde_json::Value::as_str))
		.map(str::trim)
		.find(|detail| !detail.is_empty())
		.map(ToOwned::to_owned)
}

fn canonical_reason(status: u16) -> &'static str {
	match status {
		400 => "Bad Request",
		401 => "Unauthorized",
		403 => "Forbidden",
		404 => "Not Found",
		405 => "Method Not Allowed",
		409 => "Conflict",
		410 => "Gone",
		413 => "Payload Too Large",
		415 => "Unsupported Media Type",
		422 => "Unprocessable Entity",
		429 => "Too Many Requests",
		_ => "Client Error",
	}
}
