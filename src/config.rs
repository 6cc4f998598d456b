//! Immutable manager configuration: refresh endpoint contract, token extraction, timing, and
//! lifecycle hooks.

pub mod builder;
pub mod extractor;
pub mod hooks;

pub use builder::*;
pub use extractor::*;
pub use hooks::*;

// crates.io
use ::http::{HeaderMap, HeaderValue, Method, header::CONTENT_TYPE};
// self
use crate::_prelude::*;

/// HTTP methods accepted by the refresh endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefreshMethod {
	/// `POST` (default).
	#[default]
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
}
impl RefreshMethod {
	/// Returns the matching [`Method`].
	pub fn as_method(self) -> Method {
		match self {
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Patch => Method::PATCH,
		}
	}

	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
		}
	}
}
impl Display for RefreshMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated configuration captured by a [`TokenManager`](crate::manager::TokenManager).
#[derive(Clone, Debug)]
pub struct ManagerConfig {
	/// Endpoint that mints a new token from the ambient refresh credential.
	pub refresh_endpoint: Url,
	/// Method used against the refresh endpoint.
	pub method: RefreshMethod,
	/// Extra headers sent with every refresh call.
	pub headers: HeaderMap,
	/// Maps the refresh response payload to a [`Token`](crate::token::Token).
	pub extractor: TokenExtractor,
	/// Safety margin subtracted from the token expiry.
	pub refresh_buffer: Duration,
	/// Lifecycle callbacks.
	pub hooks: ManagerHooks,
}
impl ManagerConfig {
	/// Default refresh buffer applied when none is configured.
	pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::seconds(6);

	/// Returns a builder for a new configuration.
	pub fn builder() -> ManagerConfigBuilder {
		ManagerConfigBuilder::new()
	}

	/// Headers for a refresh call: JSON content type first, configured extras layered on top.
	pub(crate) fn refresh_headers(&self) -> HeaderMap {
		let mut headers = HeaderMap::with_capacity(self.headers.len() + 1);

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		for (name, value) in &self.headers {
			headers.insert(name.clone(), value.clone());
		}

		headers
	}
}
