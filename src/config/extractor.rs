//! Refresh response mapping.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::ExtractError,
	token::{Token, codec},
};

type ExtractFn = dyn Fn(&Value) -> Result<Token, ExtractError> + Send + Sync;

/// Maps an arbitrary refresh response payload to a [`Token`].
#[derive(Clone)]
pub struct TokenExtractor(Arc<ExtractFn>);
impl TokenExtractor {
	/// Wraps a custom mapping closure.
	pub fn new<F>(f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&Value) -> Result<Token, ExtractError>,
	{
		Self(Arc::new(f))
	}

	/// Reads a token string from `field` and derives the expiry from its own `exp` claim.
	pub fn jwt_field(field: impl Into<String>) -> Self {
		let field = field.into();

		Self::new(move |payload| {
			let raw = string_field(payload, &field)?;

			Ok(codec::build_token(raw)?)
		})
	}

	/// Reads a token string from `token_field` and an epoch-millisecond expiry from
	/// `expires_at_field`.
	pub fn field_with_expiry(
		token_field: impl Into<String>,
		expires_at_field: impl Into<String>,
	) -> Self {
		let token_field = token_field.into();
		let expires_at_field = expires_at_field.into();

		Self::new(move |payload| {
			let raw = string_field(payload, &token_field)?;
			let expires_at_ms = payload.get(&expires_at_field).and_then(Value::as_i64).ok_or_else(
				|| ExtractError::new(format!("field `{expires_at_field}` is not an integer")),
			)?;

			Token::from_unix_millis(raw, expires_at_ms).ok_or_else(|| {
				ExtractError::new(format!("field `{expires_at_field}` is out of range"))
			})
		})
	}

	/// Applies the mapping to a response payload.
	pub fn extract(&self, payload: &Value) -> Result<Token, ExtractError> {
		(self.0)(payload)
	}
}
impl Debug for TokenExtractor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenExtractor(..)")
	}
}

fn string_field<'a>(payload: &'a Value, field: &str) -> Result<&'a str, ExtractError> {
	payload
		.get(field)
		.and_then(Value::as_str)
		.ok_or_else(|| ExtractError::new(format!("field `{field}` is not a string")))
}
