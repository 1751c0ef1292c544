//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `taskdeck_client.op` with the `op` and
//!   `stage` fields, plus debug/warn events for recoverable conditions such as a failed
//!   best-effort sign-out.
//! - Enable `metrics` to increment the `taskdeck_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Authenticated API request (including its refresh-and-retry).
	Request,
	/// Credential refresh.
	Refresh,
	/// Sign-in with email and password.
	SignIn,
	/// Account creation.
	SignUp,
	/// Best-effort sign-out.
	SignOut,
	/// Coalesced read joining an in-flight request.
	Dedup,
	/// Loading a persisted credential at startup.
	Restore,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Refresh => "refresh",
			OpKind::SignIn => "sign_in",
			OpKind::SignUp => "sign_up",
			OpKind::SignOut => "sign_out",
			OpKind::Dedup => "dedup",
			OpKind::Restore => "restore",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` for `kind`.
pub(crate) fn record_result<T>(kind: OpKind, result: &Result<T>) {
	match result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(err) => {
			record_op_outcome(kind, OpOutcome::Failure);
			debug_op(kind, &err.kind().to_string());
		},
	}
}
