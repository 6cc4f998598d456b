//! Immutable access token value and expiry helpers.

// self
use crate::{_prelude::*, token::TokenSecret};

/// Short-lived bearer token paired with its wall-clock expiry.
///
/// Tokens are never mutated; a refresh always produces a new value.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
	/// Compact three-segment token string; callers must avoid logging it.
	pub value: TokenSecret,
	/// Instant after which the server rejects the token.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Creates a token from a raw value and an absolute expiry.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { value: TokenSecret::new(value), expires_at }
	}

	/// Creates a token whose expiry is given in epoch milliseconds.
	pub fn from_unix_millis(value: impl Into<String>, expires_at_ms: i64) -> Option<Self> {
		let expires_at =
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(expires_at_ms) * 1_000_000).ok()?;

		Some(Self::new(value, expires_at))
	}

	/// Returns the expiry as epoch milliseconds.
	pub fn expires_at_unix_millis(&self) -> i64 {
		(self.expires_at.unix_timestamp_nanos() / 1_000_000) as i64
	}

	/// Returns `true` once `instant` reaches the expiry minus `buffer`.
	///
	/// An expiry so early that subtracting the buffer leaves the representable range counts as
	/// expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime, buffer: Duration) -> bool {
		self.expires_at.checked_sub(buffer).is_none_or(|edge| instant >= edge)
	}

	/// Checks expiry against the current UTC clock.
	pub fn is_expired(&self, buffer: Duration) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), buffer)
	}

	/// Remaining lifetime at `instant`; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
