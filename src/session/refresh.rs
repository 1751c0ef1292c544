//! Single-flight credential refresh.
//!
//! [`SessionManager::refresh_credential`] runs at most one refresh call per session; callers
//! that ask while one is pending share its outcome. The refreshed credential is installed
//! only if the credential generation still matches the one the refresh started from, so a
//! sign-in or sign-out that lands mid-refresh is never overwritten. A failed refresh clears
//! the credential of that generation and surfaces [`Error::AuthExpired`]; it is never
//! retried silently.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	http::{ApiRequest, ApiTransport, Method},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::{SessionManager, payload::RefreshEnvelope, payload::SessionTokens},
};

const KIND: OpKind = OpKind::Refresh;

impl<T> SessionManager<T>
where
	T: ?Sized + ApiTransport,
{
	/// Refreshes the stored credential, joining a refresh that is already in flight.
	///
	/// Fails with [`Error::AuthExpired`] when no credential is stored or the API rejects the
	/// refresh; in the latter case the credential is cleared and the session becomes
	/// unauthenticated.
	pub async fn refresh_credential(&self) -> Result<Credential> {
		self.refresh_after(None).await
	}

	/// Makes the credential usable again after a request sent with `observed_generation`
	/// came back 401.
	///
	/// If the credential was already replaced since that request was sent, the caller can
	/// replay immediately; otherwise this joins or starts a refresh.
	pub(crate) async fn recover(&self, observed_generation: u64) -> Result<()> {
		self.refresh_after(Some(observed_generation)).await.map(|_| ())
	}

	async fn refresh_after(&self, observed_generation: Option<u64>) -> Result<Credential> {
		let outcome = self.refreshes.run((), || self.refresh_once(observed_generation)).await;

		outcome.into_inner()
	}

	async fn refresh_once(&self, observed_generation: Option<u64>) -> Result<Credential> {
		// Only the registry leader gets here, so no other refresh can be mid-flight.
		if let Some(observed) = observed_generation {
			let slot = self.slot.read();

			if slot.generation != observed {
				if let Some(current) = slot.credential.as_ref() {
					return Ok(current.clone());
				}
			}
		}

		let span = OpSpan::new(KIND, "refresh_credential");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let url = self.url(&self.config.endpoints.refresh)?;
				let (expected_generation, previous) = self.begin_refresh()?;
				let mut request = ApiRequest::new(Method::Post, url);

				if let Some(secret) = previous.refresh_token.as_ref() {
					request = request.with_header(&self.config.refresh_header, secret.expose());
				}

				self.metrics.record_refresh_attempt();

				let outcome = match self.dispatch(request).await {
					Ok(response) if response.is_success() =>
						response.json::<RefreshEnvelope>().map(|envelope| envelope.session),
					Ok(response) => Err(Error::from_status(response.status, &response.body)),
					Err(err) => Err(err),
				};

				match outcome {
					Ok(tokens) => self.finish_refresh(expected_generation, previous, tokens).await,
					Err(err) => self.abort_refresh(expected_generation, &err).await,
				}
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	fn begin_refresh(&self) -> Result<(u64, Credential)> {
		let slot = self.slot.read();
		let Some(previous) = slot.credential.clone() else {
			return Err(Error::AuthExpired);
		};

		Ok((slot.generation, previous))
	}

	async fn finish_refresh(
		&self,
		expected_generation: u64,
		previous: Credential,
		tokens: SessionTokens,
	) -> Result<Credential> {
		self.metrics.record_refresh_success();

		let rotated = tokens.refresh_token.is_some();
		let refresh_token = tokens
			.refresh_token
			.or_else(|| previous.refresh_token.as_ref().map(|s| s.expose().to_owned()));
		let mut credential = Credential::issue(tokens.token, refresh_token, &self.config.policy);

		// A reused refresh token keeps its original lifetime.
		if !rotated {
			credential.refresh_expires_at = previous.refresh_expires_at;
		}

		let installed = {
			let mut slot = self.slot.write();

			if slot.generation == expected_generation {
				slot.credential = Some(credential.clone());
				slot.generation += 1;

				true
			} else {
				false
			}
		};

		if !installed {
			obs::debug_op(KIND, "Session changed during refresh; keeping the newer credential.");

			return self.credential().ok_or(Error::AuthExpired);
		}
		if let Err(err) = self.store.save(credential.clone()).await {
			obs::warn_op(KIND, &format!("Failed to persist refreshed credential: {err}"));
		}

		Ok(credential)
	}

	async fn abort_refresh(&self, expected_generation: u64, err: &Error) -> Result<Credential> {
		self.metrics.record_refresh_failure();
		obs::warn_op(KIND, &format!("Credential refresh failed: {err}"));

		let cleared = {
			let mut slot = self.slot.write();

			if slot.generation == expected_generation {
				slot.credential = None;
				slot.generation += 1;

				true
			} else {
				false
			}
		};

		if !cleared {
			return self.credential().ok_or(Error::AuthExpired);
		}
		if let Err(err) = self.store.clear().await {
			obs::warn_op(KIND, &format!("Failed to clear persisted credential: {err}"));
		}

		Err(Error::AuthExpired)
	}
}
