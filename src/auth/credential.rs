//! Bearer credential records and the redacting secret wrapper.

// self
use crate::{_prelude::*, config::CredentialPolicy};

/// Redacted token wrapper keeping bearer and refresh secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value for this secret.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Bearer token plus optional refresh token identifying an authenticated session.
///
/// A credential is replaced wholesale on refresh and never mutated in place. Expiry instants
/// come from the [`CredentialPolicy`] in effect when the credential was issued; the server
/// remains the authority on validity, so an expired access token is still sent and the
/// resulting 401 drives the refresh flow.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token attached as `Authorization: Bearer <token>`.
	pub access_token: TokenSecret,
	/// Refresh token, if the API issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the credential was stored locally.
	pub issued_at: OffsetDateTime,
	/// Local expiry of the access token.
	pub access_expires_at: OffsetDateTime,
	/// Local expiry of the refresh token, when one is present.
	pub refresh_expires_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Issues a credential stamped with the current clock.
	pub fn issue(
		access_token: impl Into<String>,
		refresh_token: Option<String>,
		policy: &CredentialPolicy,
	) -> Self {
		Self::issue_at(access_token, refresh_token, policy, OffsetDateTime::now_utc())
	}

	/// Issues a credential stamped with the provided instant.
	pub fn issue_at(
		access_token: impl Into<String>,
		refresh_token: Option<String>,
		policy: &CredentialPolicy,
		issued_at: OffsetDateTime,
	) -> Self {
		let refresh_expires_at = refresh_token.as_ref().map(|_| issued_at + policy.refresh_ttl);

		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
			issued_at,
			access_expires_at: issued_at + policy.access_ttl,
			refresh_expires_at,
		}
	}

	/// Returns `true` once the access token passed its local expiry.
	pub fn is_access_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.access_expires_at
	}

	/// Returns `true` if either token can still be used at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		if !self.is_access_expired_at(instant) {
			return true;
		}

		self.refresh_expires_at.is_some_and(|expiry| instant < expiry)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("access_expires_at", &self.access_expires_at)
			.field("refresh_expires_at", &self.refresh_expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer(), "Bearer super-secret");
	}

	#[test]
	fn credential_expiry_follows_policy() {
		let policy = CredentialPolicy::default();
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential =
			Credential::issue_at("access", Some("refresh".into()), &policy, issued);

		assert_eq!(credential.access_expires_at, issued + policy.access_ttl);
		assert_eq!(credential.refresh_expires_at, Some(issued + policy.refresh_ttl));
		assert!(!credential.is_access_expired_at(issued + Duration::minutes(1)));
		assert!(credential.is_access_expired_at(issued + policy.access_ttl));
		assert!(credential.is_usable_at(issued + policy.access_ttl));
		assert!(!credential.is_usable_at(issued + policy.refresh_ttl));
	}

	#[test]
	fn credential_without_refresh_token_dies_with_access_token() {
		let policy = CredentialPolicy::default();
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = Credential::issue_at("access", None, &policy, issued);

		assert!(credential.refresh_expires_at.is_none());
		assert!(!credential.is_usable_at(issued + policy.access_ttl));

		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("access\""));
		assert!(rendered.contains("<redacted>"));
	}
}
