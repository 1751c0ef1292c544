//! Session manager owning the credential, its lifecycle state, and the refresh registry.
//!
//! A [`SessionManager`] is an explicit, injectable object: every clone shares the same
//! credential slot, refresh registry, store, and metrics, while independently constructed
//! managers never observe each other. The credential slot carries a generation counter
//! that is bumped whenever the credential is replaced or cleared. Requests remember the
//! generation they were sent with, which lets the request layer tell a stale 401 (the
//! credential was already replaced) from one that needs a refresh.

mod metrics;
mod payload;
mod refresh;

pub use metrics::SessionMetrics;
pub use payload::AuthUser;

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionState, TokenSecret},
	coalesce::Coalescer,
	config::ClientConfig,
	http::{ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::payload::{AuthEnvelope, SignInBody, SignUpBody},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Session manager specialized for the crate's default reqwest transport.
pub type ReqwestSessionManager = SessionManager<ReqwestTransport>;

#[derive(Debug, Default)]
struct CredentialSlot {
	credential: Option<Credential>,
	generation: u64,
}

/// Owns the credential of one authenticated session.
///
/// The manager holds the transport, configuration, credential store, and refresh registry
/// so the request layer only has to decide when to attach, refresh, and retry.
pub struct SessionManager<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Store the credential is written through to.
	pub store: Arc<dyn CredentialStore>,
	/// Shared counters for refresh and network traffic.
	pub metrics: Arc<SessionMetrics>,
	slot: Arc<RwLock<CredentialSlot>>,
	refreshes: Coalescer<(), Result<Credential>>,
}
impl<T> SessionManager<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an unauthenticated session over the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			config: Arc::new(config),
			store,
			metrics: Default::default(),
			slot: Default::default(),
			refreshes: Default::default(),
		}
	}

	/// Returns the current lifecycle state.
	///
	/// The session is refreshing exactly while a refresh holds the registry, so a refresh
	/// whose caller was dropped mid-flight no longer counts.
	pub fn state(&self) -> SessionState {
		let authenticated = self.slot.read().credential.is_some();

		match (authenticated, self.refreshes.is_in_flight(&())) {
			(false, _) => SessionState::Unauthenticated,
			(true, true) => SessionState::Refreshing,
			(true, false) => SessionState::Authenticated,
		}
	}

	/// Returns a copy of the stored credential.
	pub fn credential(&self) -> Option<Credential> {
		self.slot.read().credential.clone()
	}

	/// Returns the credential generation; bumped on every replacement or removal.
	pub fn generation(&self) -> u64 {
		self.slot.read().generation
	}

	/// Resolves an API path against the configured base URL.
	pub fn url(&self, path_and_query: &str) -> Result<Url> {
		Ok(self.config.url(path_and_query)?)
	}

	/// Loads a persisted credential, discarding it when both tokens have expired.
	pub async fn restore(&self) -> Result<Option<Credential>> {
		let Some(credential) = self.store.load().await? else {
			return Ok(None);
		};

		if !credential.is_usable_at(OffsetDateTime::now_utc()) {
			obs::debug_op(OpKind::Restore, "Discarding expired persisted credential.");
			self.store.clear().await?;

			return Ok(None);
		}

		self.install(credential.clone());

		Ok(Some(credential))
	}

	/// Signs in with email and password, storing the issued credential.
	pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
		let body = SignInBody { email, password };

		self.authenticate(OpKind::SignIn, &self.config.endpoints.sign_in, &body).await
	}

	/// Creates an account and stores the issued credential.
	pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthUser> {
		let body = SignUpBody { email, password, name };

		self.authenticate(OpKind::SignUp, &self.config.endpoints.sign_up, &body).await
	}

	/// Clears the credential locally and notifies the API on a best-effort basis.
	///
	/// The sign-out call's outcome is ignored; only a credential store failure is reported.
	pub async fn sign_out(&self) -> Result<()> {
		const KIND: OpKind = OpKind::SignOut;

		let span = OpSpan::new(KIND, "sign_out");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				if let Some(previous) = self.clear_local() {
					self.notify_sign_out(&previous).await;
				}

				self.store.clear().await.map_err(Error::from)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Returns the bearer secret to attach and the generation it belongs to.
	pub(crate) fn bearer(&self) -> (Option<TokenSecret>, u64) {
		let slot = self.slot.read();

		(slot.credential.as_ref().map(|c| c.access_token.clone()), slot.generation)
	}

	/// Hands `request` to the transport.
	pub(crate) async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.metrics.record_network_call();

		Ok(self.transport.execute(request).await?)
	}

	fn install(&self, credential: Credential) {
		let mut slot = self.slot.write();

		slot.credential = Some(credential);
		slot.generation += 1;
	}

	fn clear_local(&self) -> Option<Credential> {
		let mut slot = self.slot.write();

		slot.generation += 1;

		slot.credential.take()
	}

	async fn authenticate<B>(&self, kind: OpKind, path: &str, body: &B) -> Result<AuthUser>
	where
		B: Serialize,
	{
		let span = OpSpan::new(kind, "authenticate");

		obs::record_op_outcome(kind, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = ApiRequest::new(Method::Post, self.url(path)?).with_json(body)?;
				let response = self.dispatch(request).await?;

				if !response.is_success() {
					return Err(Error::from_status(response.status, &response.body));
				}

				let envelope = response.json::<AuthEnvelope>()?;
				let credential = Credential::issue(
					envelope.session.token,
					envelope.session.refresh_token,
					&self.config.policy,
				);

				self.install(credential.clone());
				self.store.save(credential).await?;

				Ok(envelope.user)
			})
			.await;

		obs::record_result(kind, &result);

		result
	}

	async fn notify_sign_out(&self, previous: &Credential) {
		let url = match self.url(&self.config.endpoints.sign_out) {
			Ok(url) => url,
			Err(err) => {
				obs::warn_op(OpKind::SignOut, &format!("Skipping sign-out call: {err}"));

				return;
			},
		};
		let request = ApiRequest::new(Method::Post, url)
			.with_header("authorization", previous.access_token.bearer());

		match self.dispatch(request).await {
			Ok(response) if response.is_success() => {},
			Ok(response) => obs::debug_op(
				OpKind::SignOut,
				&format!("Ignoring sign-out response status {}.", response.status),
			),
			Err(err) =>
				obs::debug_op(OpKind::SignOut, &format!("Ignoring sign-out failure: {err}")),
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionManager<ReqwestTransport> {
	/// Creates a session backed by a cookie-aware reqwest transport built from `config`.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for SessionManager<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			store: self.store.clone(),
			metrics: self.metrics.clone(),
			slot: self.slot.clone(),
			refreshes: self.refreshes.clone(),
		}
	}
}
impl<T> Debug for SessionManager<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("base_url", &self.config.base_url.as_str())
			.field("state", &self.state())
			.field("generation", &self.generation())
			.finish()
	}
}
