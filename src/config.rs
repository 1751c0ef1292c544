//! Client configuration: API base URL, endpoint paths, and credential policy.
//!
//! Configurations are assembled with [`ClientConfigBuilder`], which validates the result so
//! the session and request layers can join paths without re-checking them.

/// Builder API for assembling client configurations.
pub mod builder;
/// Credential lifetime and transport-security policy.
pub mod policy;

pub use builder::*;
pub use policy::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Endpoint paths relative to the configured base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// `POST` with `{email, password}`.
	pub sign_in: String,
	/// `POST` with `{email, password, name}`.
	pub sign_up: String,
	/// `POST` carrying the refresh token.
	pub refresh: String,
	/// `POST` with the bearer header; best effort.
	pub sign_out: String,
	/// Task collection root.
	pub tasks: String,
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			sign_in: "/auth/sign-in".into(),
			sign_up: "/auth/sign-up".into(),
			refresh: "/auth/refresh".into(),
			sign_out: "/auth/sign-out".into(),
			tasks: "/tasks".into(),
		}
	}
}

/// Immutable, validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// API origin plus optional path prefix; always ends with `/`.
	pub base_url: Url,
	/// Endpoint paths joined onto [`ClientConfig::base_url`].
	pub endpoints: Endpoints,
	/// Header that carries the refresh token on refresh calls.
	pub refresh_header: String,
	/// Per-request timeout applied by the transport.
	pub timeout: Duration,
	/// Optional `User-Agent` override.
	pub user_agent: Option<String>,
	/// Credential lifetimes and transport-security requirements.
	pub policy: CredentialPolicy,
}
impl ClientConfig {
	/// Header carrying the refresh token unless overridden.
	pub const DEFAULT_REFRESH_HEADER: &'static str = "x-refresh-token";
	/// Per-request timeout unless overridden.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves an absolute API path (optionally carrying a query) against the base URL.
	///
	/// Paths are resolved relative to the base URL's path prefix, so `/tasks` under
	/// `https://api.example.com/v1/` becomes `https://api.example.com/v1/tasks`.
	pub fn url(&self, path_and_query: &str) -> Result<Url, ConfigError> {
		let relative = path_and_query.trim_start_matches('/');

		self.base_url.join(relative).map_err(|source| ConfigError::InvalidRequestPath {
			path: path_and_query.to_owned(),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(base: &str) -> ClientConfig {
		ClientConfig::builder(Url::parse(base).expect("Base URL fixture should parse."))
			.build()
			.expect("Config fixture should build.")
	}

	#[test]
	fn url_keeps_base_prefix() {
		let config = config("https://api.example.com/v1");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(
			config.url("/tasks?status=done").expect("Path should join.").as_str(),
			"https://api.example.com/v1/tasks?status=done",
		);
	}

	#[test]
	fn url_joins_on_bare_origin() {
		let config = config("https://api.example.com");

		assert_eq!(
			config.url(&config.endpoints.refresh).expect("Path should join.").as_str(),
			"https://api.example.com/auth/refresh",
		);
	}
}
