//! Counter emission for manager operations when the `metrics` feature is on.

// self
use crate::obs::{OperationKind, OperationOutcome};

/// Bumps `token_steward_operation_total{operation, outcome}` on the installed recorder.
///
/// Background refreshes are labeled `proactive_refresh` so timer activity can be told apart
/// from caller-driven refreshes.
pub fn record_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_steward_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
