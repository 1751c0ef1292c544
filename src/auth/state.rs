//! Session lifecycle states.

// self
use crate::_prelude::*;

/// Lifecycle state of the credential held by a session.
///
/// `Unauthenticated -> Authenticated` on sign-in, `Authenticated -> Refreshing` while a
/// refresh is in flight, then back to `Authenticated` on success or `Unauthenticated` on
/// failure. Sign-out returns to `Unauthenticated` from any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	/// No credential is stored.
	Unauthenticated,
	/// A credential is stored; any number of requests may use it concurrently.
	Authenticated,
	/// A credential is stored and a refresh is in flight.
	Refreshing,
}
impl SessionState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionState::Unauthenticated => "unauthenticated",
			SessionState::Authenticated => "authenticated",
			SessionState::Refreshing => "refreshing",
		}
	}

	/// Returns `true` when a credential is attached to outgoing requests.
	pub const fn has_credential(self) -> bool {
		!matches!(self, SessionState::Unauthenticated)
	}
}
impl Display for SessionState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
