//! Proactive refresh timer.
//!
//! At most one timer is armed. Storing, clearing, or refreshing the token always cancels the
//! previous timer first. The timer fires `refresh_buffer` before expiry and funnels into the
//! same coalesced refresh as foreground callers; its failures are logged and swallowed.

// crates.io
use tokio::task::AbortHandle;
// self
use crate::{
	_prelude::*,
	http::HttpExecutor,
	manager::{ManagerInner, ManagerState, TokenManager},
	obs::{self, OperationKind},
};

/// Handle to the armed timer task.
pub(super) struct ArmedTimer {
	id: u64,
	handle: AbortHandle,
}
impl ArmedTimer {
	pub(super) fn cancel(self) {
		self.handle.abort();
	}
}

impl<E> ManagerInner<E>
where
	E: ?Sized + HttpExecutor,
{
	/// Re-arms the timer for the current token, if any.
	///
	/// No timer is armed when the buffer already exceeds the remaining lifetime; such tokens
	/// rely on the on-demand refresh in `get_token`.
	pub(super) fn arm_timer(self: &Arc<Self>, state: &mut ManagerState) {
		const KIND: OperationKind = OperationKind::ProactiveRefresh;

		state.cancel_timer();

		let Some(token) = &state.current else {
			return;
		};
		let delay = token.remaining_at(OffsetDateTime::now_utc()) - self.config.refresh_buffer;

		if !delay.is_positive() {
			obs::note(KIND, "Token is already inside the refresh buffer; timer not armed.");

			return;
		}

		let Ok(delay) = std::time::Duration::try_from(delay) else {
			return;
		};
		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			obs::note(KIND, "No tokio runtime available; timer not armed.");

			return;
		};
		let id = state.next_id();
		let inner = Arc::downgrade(self);
		let task = runtime.spawn(async move {
			tokio::time::sleep(delay).await;

			if let Some(inner) = inner.upgrade() {
				inner.fire_timer(id).await;
			}
		});

		state.timer = Some(ArmedTimer { id, handle: task.abort_handle() });
	}

	async fn fire_timer(self: Arc<Self>, id: u64) {
		const KIND: OperationKind = OperationKind::ProactiveRefresh;

		{
			let mut state = self.state.lock();

			if state.disposed || !state.timer.as_ref().is_some_and(|timer| timer.id == id) {
				return;
			}

			// Detach without aborting: this task is the timer.
			state.timer = None;
		}

		let manager = TokenManager { inner: self };

		if let Err(err) = manager.refresh_as(KIND).await {
			obs::warn_swallowed(KIND, &err);
		}
	}
}
