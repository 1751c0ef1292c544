//! Authenticated request client.
//!
//! [`AuthenticatedClient`] attaches the session's bearer credential to every request. A 401
//! response triggers the session's single-flight refresh (or a plain replay when the
//! credential was already replaced in the meantime) followed by exactly one retry; a second
//! 401 ends the call with [`Error::AuthExpired`]. Concurrent identical `GET` reads issued
//! through [`AuthenticatedClient::get_deduplicated`] share one network call.

mod key;

pub use key::RequestKey;

// self
use crate::{
	_prelude::*,
	coalesce::Coalescer,
	error::PayloadError,
	http::{ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::SessionManager,
};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfig, http::ReqwestTransport, store::CredentialStore};

#[cfg(feature = "reqwest")]
/// Authenticated client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = AuthenticatedClient<ReqwestTransport>;

/// Request layer over a [`SessionManager`].
///
/// Clones share the session and the pending read registry.
pub struct AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	session: SessionManager<T>,
	reads: Coalescer<RequestKey, Result<ApiResponse>>,
}
impl<T> AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Wraps `session`; the client starts with an empty read registry.
	pub fn new(session: SessionManager<T>) -> Self {
		Self { session, reads: Coalescer::new() }
	}

	/// Returns the session backing this client.
	pub fn session(&self) -> &SessionManager<T> {
		&self.session
	}

	/// Returns the number of distinct reads currently in flight.
	pub fn pending_reads(&self) -> usize {
		self.reads.in_flight()
	}

	/// Sends an authenticated request, refreshing and retrying once on a 401.
	///
	/// Returns the 2xx response; any other status is mapped to an [`Error`].
	pub async fn request(
		&self,
		method: Method,
		path_and_query: &str,
		body: Option<&serde_json::Value>,
	) -> Result<ApiResponse> {
		let body = body.map(serde_json::to_vec).transpose().map_err(PayloadError::encode)?;

		self.execute(method, path_and_query, body).await
	}

	/// Sends a read, joining an identical read that is already in flight.
	///
	/// Only `GET` keys are coalesced; other methods are sent as plain requests. The registry
	/// entry is dropped as soon as the shared call resolves, so nothing is cached.
	pub async fn get_deduplicated(&self, key: RequestKey) -> Result<ApiResponse> {
		if !key.method().is_idempotent_read() {
			return self.execute(key.method(), &key.path_and_query(), None).await;
		}

		let path_and_query = key.path_and_query();
		let outcome =
			self.reads.run(key, || self.execute(Method::Get, &path_and_query, None)).await;

		if !outcome.leader {
			self.session.metrics.record_coalesced_read();
			obs::record_op_outcome(OpKind::Dedup, OpOutcome::Success);
			obs::debug_op(OpKind::Dedup, &format!("Joined in-flight read {path_and_query}."));
		}

		outcome.into_inner()
	}

	/// Performs a deduplicated `GET` and decodes the JSON body.
	pub async fn get_json<R>(&self, path_and_query: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_deduplicated(RequestKey::get(path_and_query)).await?.json()
	}

	/// Sends `body` as JSON and decodes the JSON response.
	pub async fn send_json<B, R>(
		&self,
		method: Method,
		path_and_query: &str,
		body: &B,
	) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let body = serde_json::to_vec(body).map_err(PayloadError::encode)?;

		self.execute(method, path_and_query, Some(body)).await?.json()
	}

	pub(crate) async fn execute(
		&self,
		method: Method,
		path_and_query: &str,
		body: Option<Vec<u8>>,
	) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, method.as_str());

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let url = self.session.url(path_and_query)?;
				let (response, generation) = self.send_once(method, &url, body.clone()).await?;

				if !response.is_unauthorized() {
					return finish(response);
				}

				self.session.recover(generation).await?;

				let (retry, _) = self.send_once(method, &url, body).await?;

				if retry.is_unauthorized() {
					obs::warn_op(KIND, "Request rejected again after credential refresh.");

					return Err(Error::AuthExpired);
				}

				finish(retry)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn send_once(
		&self,
		method: Method,
		url: &Url,
		body: Option<Vec<u8>>,
	) -> Result<(ApiResponse, u64)> {
		let (bearer, generation) = self.session.bearer();
		let mut request = ApiRequest::new(method, url.clone());

		if let Some(secret) = bearer {
			request = request.with_header("authorization", secret.bearer());
		}
		if let Some(body) = body {
			request = request.with_json_body(body);
		}

		let response = self.session.dispatch(request).await?;

		Ok((response, generation))
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticatedClient<ReqwestTransport> {
	/// Builds a reqwest-backed session from `config` and wraps it.
	pub fn connect(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		Ok(Self::new(SessionManager::new(config, store)?))
	}
}
impl<T> Clone for AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { session: self.session.clone(), reads: self.reads.clone() }
	}
}
impl<T> Debug for AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedClient")
			.field("session", &self.session)
			.field("pending_reads", &self.pending_reads())
			.finish()
	}
}

fn finish(response: ApiResponse) -> Result<ApiResponse> {
	if response.is_success() {
		Ok(response)
	} else {
		Err(Error::from_status(response.status, &response.body))
	}
}
