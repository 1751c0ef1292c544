//! Wire shapes for the authentication endpoints.

// self
use crate::_prelude::*;

/// Authenticated user returned by sign-in and sign-up.
///
/// Only the commonly used fields are typed; everything else the API returns is kept in
/// [`AuthUser::extra`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
	/// Server-assigned identifier; numeric and string ids are both accepted.
	#[serde(default)]
	pub id: Option<serde_json::Value>,
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Remaining user fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `{email, password}` body for sign-in.
#[derive(Serialize)]
pub(crate) struct SignInBody<'a> {
	pub(crate) email: &'a str,
	pub(crate) password: &'a str,
}

/// `{email, password, name}` body for sign-up.
#[derive(Serialize)]
pub(crate) struct SignUpBody<'a> {
	pub(crate) email: &'a str,
	pub(crate) password: &'a str,
	pub(crate) name: &'a str,
}

/// `{token, refresh_token?}` issued by the API.
#[derive(Deserialize)]
pub(crate) struct SessionTokens {
	pub(crate) token: String,
	#[serde(default)]
	pub(crate) refresh_token: Option<String>,
}

/// `{user, session}` returned by sign-in and sign-up.
#[derive(Deserialize)]
pub(crate) struct AuthEnvelope {
	pub(crate) user: AuthUser,
	pub(crate) session: SessionTokens,
}

/// `{session}` returned by refresh.
#[derive(Deserialize)]
pub(crate) struct RefreshEnvelope {
	pub(crate) session: SessionTokens,
}
