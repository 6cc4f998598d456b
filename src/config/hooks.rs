//! Lifecycle callbacks invoked synchronously by the manager.

// self
use crate::{_prelude::*, error::RefreshError, token::Token};

/// Callback receiving the freshly minted token.
pub type RefreshSuccessHook = Arc<dyn Fn(&Token) + Send + Sync>;
/// Callback receiving the refresh failure.
pub type RefreshErrorHook = Arc<dyn Fn(&RefreshError) + Send + Sync>;
/// Callback fired when the server rejects the session.
pub type AuthFailureHook = Arc<dyn Fn() + Send + Sync>;

/// Observer set captured at construction.
///
/// Hooks run without any manager lock held, so they may call back into the manager
/// (for example `clear_token` from `on_auth_failure`).
#[derive(Clone, Default)]
pub struct ManagerHooks {
	/// Fired after a refresh stores a new token.
	pub on_refresh_success: Option<RefreshSuccessHook>,
	/// Fired once per failed refresh, regardless of how many callers were waiting.
	pub on_refresh_error: Option<RefreshErrorHook>,
	/// Fired when the refresh credential or the retried session is rejected.
	pub on_auth_failure: Option<AuthFailureHook>,
}
impl ManagerHooks {
	pub(crate) fn refresh_succeeded(&self, token: &Token) {
		if let Some(hook) = &self.on_refresh_success {
			hook(token);
		}
	}

	pub(crate) fn refresh_failed(&self, err: &RefreshError) {
		if let Some(hook) = &self.on_refresh_error {
			hook(err);
		}
	}

	pub(crate) fn auth_failed(&self) {
		if let Some(hook) = &self.on_auth_failure {
			hook();
		}
	}
}
impl Debug for ManagerHooks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ManagerHooks")
			.field("on_refresh_success", &self.on_refresh_success.is_some())
			.field("on_refresh_error", &self.on_refresh_error.is_some())
			.field("on_auth_failure", &self.on_auth_failure.is_some())
			.finish()
	}
}
