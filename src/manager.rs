//! Token manager: the single source of truth for which bearer token to use right now.
//!
//! The manager owns the current [`Token`], the in-flight refresh slot, and the proactive refresh
//! timer. All three live in one state record behind a short-lived lock that is never held across
//! `.await` points or while hooks run, so hooks may call back into the manager.
//!
//! Lifecycle:
//! `Absent → set_token → Valid → (buffer reached) → NearExpiry → refresh → Valid`.
//! A refresh rejected with 401/403 drops back to `Absent`; [`TokenManager::dispose`] is terminal.

pub mod refresh;
pub mod request;

mod metrics;
mod schedule;

pub use metrics::RefreshMetrics;
pub use request::*;

// self
use crate::{
	_prelude::*,
	config::ManagerConfig,
	http::HttpExecutor,
	manager::refresh::PendingRefresh,
	token::{Token, TokenSecret, codec},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestExecutor;

#[cfg(feature = "reqwest")]
/// Manager specialized for the crate's default reqwest executor.
pub type ReqwestTokenManager = TokenManager<ReqwestExecutor>;

/// Input accepted by [`TokenManager::set_token`].
#[derive(Clone, Debug)]
pub enum TokenInput {
	/// Raw compact token; validated and decoded to learn its expiry.
	Raw(String),
	/// Prepared token; stored as-is.
	Token(Token),
}
impl From<&str> for TokenInput {
	fn from(value: &str) -> Self {
		Self::Raw(value.to_owned())
	}
}
impl From<String> for TokenInput {
	fn from(value: String) -> Self {
		Self::Raw(value)
	}
}
impl From<Token> for TokenInput {
	fn from(value: Token) -> Self {
		Self::Token(value)
	}
}

/// Client-side access token lifecycle manager.
///
/// Cloning is cheap and every clone shares the same state. Refreshes run on spawned tokio
/// tasks when a runtime is available, so an in-flight refresh completes even if every waiter
/// is dropped.
pub struct TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	inner: Arc<ManagerInner<E>>,
}
impl<E> TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	/// Creates a manager that executes every call through `executor`.
	pub fn with_executor(config: ManagerConfig, executor: impl Into<Arc<E>>) -> Self {
		Self {
			inner: Arc::new(ManagerInner {
				config,
				executor: executor.into(),
				state: Mutex::new(ManagerState::default()),
				metrics: RefreshMetrics::default(),
			}),
		}
	}

	/// Returns the configuration captured at construction.
	pub fn config(&self) -> &ManagerConfig {
		&self.inner.config
	}

	/// Returns the refresh counters shared by every clone of this manager.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.inner.metrics
	}

	/// Stores a token and re-arms the proactive refresh timer.
	///
	/// Raw strings must be well-formed three-segment tokens carrying an `exp` claim; prepared
	/// [`Token`] values are trusted as-is.
	pub fn set_token(&self, input: impl Into<TokenInput>) -> Result<()> {
		let token = match input.into() {
			TokenInput::Raw(raw) => {
				if !codec::is_valid_format(&raw) {
					return Err(Error::Format);
				}

				codec::build_token(raw)?
			},
			TokenInput::Token(token) => token,
		};
		let mut state = self.inner.state.lock();

		if state.disposed {
			return Err(Error::Disposed);
		}

		state.current = Some(token);
		self.inner.arm_timer(&mut state);

		Ok(())
	}

	/// Returns the stored token without refreshing.
	pub fn get_current_token(&self) -> Option<Token> {
		self.inner.state.lock().current.clone()
	}

	/// Returns `true` when a token is stored and has not reached its actual expiry.
	pub fn has_valid_token(&self) -> bool {
		let state = self.inner.state.lock();

		state.current.as_ref().is_some_and(|token| !token.is_expired(Duration::ZERO))
	}

	/// Returns a usable token value, refreshing first when the stored token is absent or
	/// inside the refresh buffer.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		let buffer = self.inner.config.refresh_buffer;
		let current = self.get_current_token();

		if let Some(token) = current.filter(|token| !token.is_expired(buffer)) {
			return Ok(token.value);
		}

		match self.refresh_token().await {
			Ok(token) => Ok(token.value),
			Err(Error::Refresh(err)) => Err(Error::no_valid_token(Some(err))),
			Err(_) => Err(Error::no_valid_token(None)),
		}
	}

	/// Cancels the proactive timer and forgets the stored token. Idempotent.
	pub fn clear_token(&self) {
		let mut state = self.inner.state.lock();

		state.cancel_timer();
		state.current = None;
	}

	/// Tears the manager down: cancels the timer and drops the token and refresh bookkeeping.
	///
	/// An in-flight refresh call still completes and resolves its waiters, but its result is
	/// neither stored nor announced through hooks.
	pub fn dispose(&self) {
		let mut state = self.inner.state.lock();

		state.cancel_timer();
		state.current = None;
		state.pending = None;
		state.disposed = true;
	}

	/// Returns `true` once [`TokenManager::dispose`] has run.
	pub fn is_disposed(&self) -> bool {
		self.inner.state.lock().disposed
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestExecutor> {
	/// Creates a manager backed by a reqwest executor with its own cookie jar.
	pub fn new(config: ManagerConfig) -> Result<Self> {
		Ok(Self::with_executor(config, ReqwestExecutor::new()?))
	}
}
impl<E> Clone for TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	fn clone(&self) -> Self {
		Self { inner: Arc::clone(&self.inner) }
	}
}
impl<E> Debug for TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("TokenManager")
			.field("refresh_endpoint", &self.inner.config.refresh_endpoint.as_str())
			.field("current", &state.current)
			.field("refresh_pending", &state.pending.is_some())
			.field("timer_armed", &state.timer.is_some())
			.field("disposed", &state.disposed)
			.finish()
	}
}

pub(crate) struct ManagerInner<E>
where
	E: ?Sized + HttpExecutor,
{
	config: ManagerConfig,
	executor: Arc<E>,
	state: Mutex<ManagerState>,
	metrics: RefreshMetrics,
}
impl<E> Drop for ManagerInner<E>
where
	E: ?Sized + HttpExecutor,
{
	fn drop(&mut self) {
		self.state.get_mut().cancel_timer();
	}
}

#[derive(Default)]
struct ManagerState {
	current: Option<Token>,
	pending: Option<PendingRefresh>,
	timer: Option<schedule::ArmedTimer>,
	disposed: bool,
	last_id: u64,
}
impl ManagerState {
	fn next_id(&mut self) -> u64 {
		self.last_id += 1;

		self.last_id
	}

	fn cancel_timer(&mut self) {
		if let Some(timer) = self.timer.take() {
			timer.cancel();
		}
	}
}
