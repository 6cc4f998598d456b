//! Optional observability helpers for manager operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_steward.operation` with the
//!   `operation` and `stage` (call site) fields, plus warnings for swallowed background failures.
//! - Enable `metrics` to increment the `token_steward_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Refresh requested by a caller (explicit or via `get_token`).
	Refresh,
	/// Refresh fired by the expiry timer.
	ProactiveRefresh,
	/// Authenticated request with refresh-then-retry.
	Request,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Refresh => "refresh",
			OperationKind::ProactiveRefresh => "proactive_refresh",
			OperationKind::Request => "request",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a manager operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller (or swallowed, for background refreshes).
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
