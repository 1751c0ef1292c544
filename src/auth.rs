//! Credential model and session lifecycle states.

pub mod credential;
pub mod state;

pub use credential::*;
pub use state::*;
