//! Coalesced refresh through the ambient refresh credential.
//!
//! [`TokenManager::refresh_token`] is the only way a new token is minted. The first caller
//! starts the network call on a spawned task and parks a shared handle in the manager state;
//! later callers (foreground requests or the proactive timer) join that handle, so every waiter
//! observes the same token or the same [`RefreshError`]. The slot is cleared when the call
//! settles, whatever the outcome.

// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::RefreshError,
	http::{CredentialsMode, HttpExecutor, HttpRequest},
	manager::{ManagerInner, TokenManager},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	token::{Token, codec},
};

type RefreshOutcome = Result<Token, RefreshError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Handle to the refresh currently in flight.
pub(crate) struct PendingRefresh {
	id: u64,
	outcome: SharedRefresh,
}

impl<E> TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	/// Mints a new token, joining the in-flight refresh when one is already running.
	///
	/// A 401/403 from the refresh endpoint clears the stored token and fires `on_auth_failure`
	/// before the error is returned; every failure fires `on_refresh_error` exactly once per
	/// network call.
	pub async fn refresh_token(&self) -> Result<Token> {
		self.refresh_as(OperationKind::Refresh).await
	}

	pub(crate) async fn refresh_as(&self, kind: OperationKind) -> Result<Token> {
		let span = OperationSpan::new(kind, "refresh_token");

		obs::record_outcome(kind, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let outcome = self.join_or_start_refresh()?;

				outcome.await.map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(kind, OperationOutcome::Success),
			Err(_) => obs::record_outcome(kind, OperationOutcome::Failure),
		}

		result
	}

	fn join_or_start_refresh(&self) -> Result<SharedRefresh> {
		let mut state = self.inner.state.lock();

		if state.disposed {
			return Err(Error::Disposed);
		}
		if let Some(pending) = &state.pending {
			self.inner.metrics.record_coalesced();

			return Ok(pending.outcome.clone());
		}

		let id = state.next_id();
		let inner = Arc::clone(&self.inner);
		let outcome = match tokio::runtime::Handle::try_current() {
			Ok(runtime) => {
				let task = runtime.spawn(async move { inner.run_refresh(id).await });

				async move { task.await.unwrap_or(Err(RefreshError::Aborted)) }.boxed().shared()
			},
			// Without a runtime the first waiter drives the call.
			Err(_) => async move { inner.run_refresh(id).await }.boxed().shared(),
		};

		state.pending = Some(PendingRefresh { id, outcome: outcome.clone() });

		Ok(outcome)
	}
}

impl<E> ManagerInner<E>
where
	E: ?Sized + HttpExecutor,
{
	async fn run_refresh(self: Arc<Self>, id: u64) -> RefreshOutcome {
		self.metrics.record_attempt();

		let outcome = self.fetch_token().await;

		self.settle(id, &outcome);

		match &outcome {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		outcome
	}

	async fn fetch_token(&self) -> RefreshOutcome {
		let mut request =
			HttpRequest::new(self.config.method.as_method(), self.config.refresh_endpoint.clone());

		request.headers = self.config.refresh_headers();
		request.credentials = CredentialsMode::Include;

		let response = self.executor.execute(request).await?;

		if !response.status.is_success() {
			return Err(RefreshError::Status { status: response.status.as_u16() });
		}

		let mut de = serde_json::Deserializer::from_slice(&response.body);
		let payload: Value = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| RefreshError::MalformedBody { source: Arc::new(source) })?;
		let token = self.config.extractor.extract(&payload)?;

		if !codec::is_valid_format(token.value.expose()) {
			return Err(RefreshError::InvalidToken);
		}

		Ok(token)
	}

	/// Applies a finished refresh to the state, then runs hooks with the lock released.
	fn settle(self: &Arc<Self>, id: u64, outcome: &RefreshOutcome) {
		{
			let mut state = self.state.lock();

			if state.pending.as_ref().is_some_and(|pending| pending.id == id) {
				state.pending = None;
			}
			if state.disposed {
				return;
			}

			match outcome {
				Ok(token) => {
					state.current = Some(token.clone());
					self.arm_timer(&mut state);
				},
				Err(err) if err.is_auth_rejection() => {
					state.cancel_timer();
					state.current = None;
				},
				Err(_) => (),
			}
		}

		let hooks = &self.config.hooks;

		match outcome {
			Ok(token) => hooks.refresh_succeeded(token),
			Err(err) => {
				if err.is_auth_rejection() {
					hooks.auth_failed();
				}

				hooks.refresh_failed(err);
			},
		}
	}
}
