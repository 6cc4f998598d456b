//! Bearer value wrapper that keeps access tokens out of `Debug` output and tracing fields.

// self
use crate::_prelude::*;

/// Access token string as attached to `Authorization: Bearer` headers.
///
/// Formatting never prints the value; use [`TokenSecret::expose`] at the header boundary only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a compact token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw compact token for building the bearer header.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the wrapper, handing the compact token to code that stores it elsewhere.
	pub fn into_inner(self) -> String {
		self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
