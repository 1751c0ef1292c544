// self
use crate::{
	_prelude::*,
	config::{ClientConfig, CredentialPolicy, Endpoints, Environment},
	error::ConfigError,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API origin plus optional path prefix.
	pub base_url: Url,
	/// Endpoint paths joined onto the base URL.
	pub endpoints: Endpoints,
	/// Header that carries the refresh token.
	pub refresh_header: String,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Optional `User-Agent` override.
	pub user_agent: Option<String>,
	/// Credential lifetimes and transport-security requirements.
	pub policy: CredentialPolicy,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and production defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			endpoints: Endpoints::default(),
			refresh_header: ClientConfig::DEFAULT_REFRESH_HEADER.into(),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			user_agent: None,
			policy: CredentialPolicy::default(),
		}
	}

	/// Replaces the credential policy with the default for `environment`, keeping any
	/// lifetimes configured so far.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.policy.secure = CredentialPolicy::for_environment(environment).secure;

		self
	}

	/// Overrides the whole credential policy.
	pub fn policy(mut self, policy: CredentialPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Overrides the access token lifetime.
	pub fn access_ttl(mut self, ttl: Duration) -> Self {
		self.policy.access_ttl = ttl;

		self
	}

	/// Overrides the refresh token lifetime.
	pub fn refresh_ttl(mut self, ttl: Duration) -> Self {
		self.policy.refresh_ttl = ttl;

		self
	}

	/// Overrides all endpoint paths.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the sign-in path.
	pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.sign_in = path.into();

		self
	}

	/// Overrides the sign-up path.
	pub fn sign_up_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.sign_up = path.into();

		self
	}

	/// Overrides the refresh path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Overrides the sign-out path.
	pub fn sign_out_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.sign_out = path.into();

		self
	}

	/// Overrides the task collection path.
	pub fn tasks_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.tasks = path.into();

		self
	}

	/// Overrides the header carrying the refresh token.
	pub fn refresh_header(mut self, name: impl Into<String>) -> Self {
		self.refresh_header = name.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets a `User-Agent` for every request.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = self.base_url;

		if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
			return Err(ConfigError::InvalidBaseUrl { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		base_url.set_query(None);
		base_url.set_fragment(None);

		let config = ClientConfig {
			base_url,
			endpoints: self.endpoints,
			refresh_header: self.refresh_header.to_ascii_lowercase(),
			timeout: self.timeout,
			user_agent: self.user_agent,
			policy: self.policy,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.policy.secure && self.base_url.scheme() != "https" {
			return Err(ConfigError::InsecureBaseUrl { url: self.base_url.to_string() });
		}

		validate_path("sign_in", &self.endpoints.sign_in)?;
		validate_path("sign_up", &self.endpoints.sign_up)?;
		validate_path("refresh", &self.endpoints.refresh)?;
		validate_path("sign_out", &self.endpoints.sign_out)?;
		validate_path("tasks", &self.endpoints.tasks)?;
		validate_header_name(&self.refresh_header)?;

		if !self.policy.access_ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl { name: "access token" });
		}
		if !self.policy.refresh_ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl { name: "refresh token" });
		}
		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') && !path.contains(['?', '#']) {
		Ok(())
	} else {
		Err(ConfigError::InvalidEndpointPath { endpoint, path: path.to_owned() })
	}
}

fn validate_header_name(name: &str) -> Result<(), ConfigError> {
	let valid = !name.is_empty()
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));

	if valid { Ok(()) } else { Err(ConfigError::InvalidHeaderName { name: name.to_owned() }) }
}
