// self
use crate::_prelude::*;

/// Deployment environment; selects the default credential policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Local development against plain-HTTP servers.
	Development,
	#[default]
	/// Deployed builds; credentials only travel over HTTPS.
	Production,
}

/// Credential lifetimes and transport-security requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPolicy {
	/// Local lifetime of the access token.
	pub access_ttl: Duration,
	/// Local lifetime of the refresh token.
	pub refresh_ttl: Duration,
	/// Requires the base URL to use HTTPS so credentials never travel in plaintext.
	pub secure: bool,
}
impl CredentialPolicy {
	/// Returns the default policy for the provided environment.
	pub fn for_environment(environment: Environment) -> Self {
		Self { secure: matches!(environment, Environment::Production), ..Self::default() }
	}
}
impl Default for CredentialPolicy {
	fn default() -> Self {
		Self { access_ttl: Duration::minutes(15), refresh_ttl: Duration::days(7), secure: true }
	}
}
