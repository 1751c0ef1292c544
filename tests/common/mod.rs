//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
// self
use taskdeck_client::{
	auth::Credential,
	client::AuthenticatedClient,
	config::{ClientConfig, CredentialPolicy, Environment},
	error::TransportError,
	http::{ApiRequest, ApiResponse, ApiTransport, TransportFuture},
	session::SessionManager,
	store::{CredentialStore, MemoryStore},
	url::Url,
};

/// Base URL used by scripted transports; never dialed.
pub const SCRIPTED_BASE: &str = "http://api.test/";

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// Plaintext development config rooted at `base`.
pub fn dev_config(base: &str) -> ClientConfig {
	let base = Url::parse(base).expect("Test base URL should parse.");

	ClientConfig::builder(base)
		.environment(Environment::Development)
		.build()
		.expect("Development config should build.")
}

/// Credential issued now under the development policy.
pub fn credential(access: &str, refresh: Option<&str>) -> Credential {
	Credential::issue(
		access,
		refresh.map(str::to_owned),
		&CredentialPolicy::for_environment(Environment::Development),
	)
}

/// JSON response with `status`.
pub fn json(status: u16, body: Value) -> ApiResponse {
	let bytes = serde_json::to_vec(&body).expect("Response fixture should encode.");

	ApiResponse::new(status, bytes).with_header("content-type", "application/json")
}

/// `{session:{token, refresh_token}}` body returned by refresh.
pub fn session_body(token: &str, refresh: &str) -> Value {
	serde_json::json!({ "session": { "token": token, "refresh_token": refresh } })
}

/// Persists `credential` and restores it into the session, as an app relaunch would.
pub async fn seed<T>(session: &SessionManager<T>, credential: Credential)
where
	T: ?Sized + ApiTransport,
{
	session.store.save(credential).await.expect("Seeding the store should succeed.");
	session.restore().await.expect("Seeded credential should restore.");
}

/// Reqwest-backed client over a fresh memory store.
#[cfg(feature = "reqwest")]
pub fn reqwest_client(base: &str) -> (taskdeck_client::client::ReqwestApiClient, MemoryStore) {
	let store = MemoryStore::default();
	let client = AuthenticatedClient::connect(dev_config(base), Arc::new(store.clone()))
		.expect("Reqwest client should build.");

	(client, store)
}

/// In-process transport that answers from a closure and records every request.
///
/// Requests to a gated path park until the test releases the gate, which lets tests
/// interleave session operations deterministically.
pub struct ScriptedTransport {
	responder: Responder,
	requests: Mutex<Vec<ApiRequest>>,
	gates: Mutex<HashMap<String, Arc<Notify>>>,
}
impl ScriptedTransport {
	pub fn new<F>(responder: F) -> Arc<Self>
	where
		F: 'static + Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync,
	{
		Arc::new(Self {
			responder: Box::new(responder),
			requests: Default::default(),
			gates: Default::default(),
		})
	}

	/// Parks requests to `path` until the returned gate is notified.
	pub fn gate(&self, path: &str) -> Arc<Notify> {
		self.gates.lock().entry(path.to_owned()).or_default().clone()
	}

	/// Snapshot of every request seen so far.
	pub fn requests(&self) -> Vec<ApiRequest> {
		self.requests.lock().clone()
	}

	/// Requests whose path equals `path`.
	pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
		self.requests.lock().iter().filter(|r| r.url.path() == path).cloned().collect()
	}
}
impl ApiTransport for ScriptedTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			self.requests.lock().push(request.clone());

			let gate = self.gates.lock().get(request.url.path()).cloned();

			if let Some(gate) = gate {
				gate.notified().await;
			}

			(self.responder)(&request)
		})
	}
}

/// Client over a scripted transport and a fresh memory store.
pub fn scripted_client(
	transport: Arc<ScriptedTransport>,
) -> (AuthenticatedClient<ScriptedTransport>, MemoryStore) {
	let store = MemoryStore::default();
	let config = dev_config(SCRIPTED_BASE);
	let session = SessionManager::with_transport(config, Arc::new(store.clone()), transport);

	(AuthenticatedClient::new(session), store)
}

/// Bearer value attached to `request`, if any.
pub fn bearer(request: &ApiRequest) -> Option<&str> {
	request.header("authorization")
}

/// Polls `condition` until it holds, failing the test after about a second.
pub async fn wait_until<F>(condition: F)
where
	F: Fn() -> bool,
{
	for _ in 0..200 {
		if condition() {
			return;
		}

		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
	}

	panic!("Condition was not reached in time.");
}
