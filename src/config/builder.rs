//! Fluent construction of [`ManagerConfig`] with validation deferred to `build`.

// crates.io
use ::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	config::{ManagerConfig, ManagerHooks, RefreshMethod, TokenExtractor},
	error::{ConfigError, ExtractError, RefreshError},
	token::Token,
};

/// Builder for [`ManagerConfig`] values.
///
/// Validation is eager: [`ManagerConfigBuilder::build`] rejects a missing endpoint, a missing
/// extractor, or any header that failed to parse when it was added.
#[derive(Debug, Default)]
pub struct ManagerConfigBuilder {
	refresh_endpoint: Option<Url>,
	method: RefreshMethod,
	headers: HeaderMap,
	extractor: Option<TokenExtractor>,
	refresh_buffer: Option<Duration>,
	hooks: ManagerHooks,
	deferred: Option<ConfigError>,
}
impl ManagerConfigBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the refresh endpoint.
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Parses and sets the refresh endpoint; parse failures surface from `build`.
	pub fn refresh_endpoint_str(mut self, url: &str) -> Self {
		match Url::parse(url) {
			Ok(url) => self.refresh_endpoint = Some(url),
			Err(source) => self.defer(ConfigError::InvalidRefreshEndpoint { source }),
		}

		self
	}

	/// Overrides the refresh method (defaults to `POST`).
	pub fn method(mut self, method: RefreshMethod) -> Self {
		self.method = method;

		self
	}

	/// Adds an extra header sent with every refresh call.
	pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
		let name = name.as_ref();

		match (HeaderName::try_from(name), HeaderValue::try_from(value.as_ref())) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			},
			_ => self.defer(ConfigError::InvalidHeader { name: name.to_owned() }),
		}

		self
	}

	/// Uses a prepared [`TokenExtractor`].
	pub fn extractor(mut self, extractor: TokenExtractor) -> Self {
		self.extractor = Some(extractor);

		self
	}

	/// Uses a closure mapping the refresh response payload to a [`Token`].
	pub fn extract_token<F>(self, f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&Value) -> Result<Token, ExtractError>,
	{
		self.extractor(TokenExtractor::new(f))
	}

	/// Overrides the refresh buffer; negative durations clamp to zero.
	pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
		self.refresh_buffer = Some(if buffer.is_negative() { Duration::ZERO } else { buffer });

		self
	}

	/// Registers a callback fired after every successful refresh.
	pub fn on_refresh_success<F>(mut self, f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&Token),
	{
		self.hooks.on_refresh_success = Some(Arc::new(f));

		self
	}

	/// Registers a callback fired after every failed refresh.
	pub fn on_refresh_error<F>(mut self, f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&RefreshError),
	{
		self.hooks.on_refresh_error = Some(Arc::new(f));

		self
	}

	/// Registers a callback fired when the server rejects the session (redirect to login).
	pub fn on_auth_failure<F>(mut self, f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(),
	{
		self.hooks.on_auth_failure = Some(Arc::new(f));

		self
	}

	/// Validates the collected settings and produces a [`ManagerConfig`].
	pub fn build(self) -> Result<ManagerConfig, ConfigError> {
		if let Some(err) = self.deferred {
			return Err(err);
		}

		let refresh_endpoint = self.refresh_endpoint.ok_or(ConfigError::MissingRefreshEndpoint)?;
		let extractor = self.extractor.ok_or(ConfigError::MissingTokenExtractor)?;

		Ok(ManagerConfig {
			refresh_endpoint,
			method: self.method,
			headers: self.headers,
			extractor,
			refresh_buffer: self.refresh_buffer.unwrap_or(ManagerConfig::DEFAULT_REFRESH_BUFFER),
			hooks: self.hooks,
		})
	}

	fn defer(&mut self, err: ConfigError) {
		if self.deferred.is_none() {
			self.deferred = Some(err);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn extractor() -> TokenExtractor {
		TokenExtractor::field_with_expiry("token", "expiresAt")
	}

	#[test]
	fn missing_endpoint_or_extractor_fails_eagerly() {
		let err = ManagerConfig::builder()
			.extractor(extractor())
			.build()
			.expect_err("Endpoint should be required.");

		assert!(matches!(err, ConfigError::MissingRefreshEndpoint));

		let err = ManagerConfig::builder()
			.refresh_endpoint_str("https://auth.example.com/refresh")
			.build()
			.expect_err("Extractor should be required.");

		assert!(matches!(err, ConfigError::MissingTokenExtractor));
	}

	#[test]
	fn invalid_inputs_surface_from_build() {
		let err = ManagerConfig::builder()
			.refresh_endpoint_str("not a url")
			.extractor(extractor())
			.build()
			.expect_err("Unparseable endpoint should be rejected.");

		assert!(matches!(err, ConfigError::InvalidRefreshEndpoint { .. }));

		let err = ManagerConfig::builder()
			.refresh_endpoint_str("https://auth.example.com/refresh")
			.header("bad header", "value")
			.extractor(extractor())
			.build()
			.expect_err("Invalid header names should be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { name } if name == "bad header"));
	}

	#[test]
	fn defaults_apply_and_negative_buffer_clamps() {
		let config = ManagerConfig::builder()
			.refresh_endpoint_str("https://auth.example.com/refresh")
			.extractor(extractor())
			.build()
			.expect("Minimal config should build.");

		assert_eq!(config.method, RefreshMethod::Post);
		assert_eq!(config.refresh_buffer, Duration::seconds(6));

		let config = ManagerConfig::builder()
			.refresh_endpoint_str("https://auth.example.com/refresh")
			.extractor(extractor())
			.refresh_buffer(Duration::seconds(-5))
			.method(RefreshMethod::Patch)
			.build()
			.expect("Config with overrides should build.");

		assert_eq!(config.refresh_buffer, Duration::ZERO);
		assert_eq!(config.method, RefreshMethod::Patch);
	}
}
