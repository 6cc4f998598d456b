//! Transport primitives for refresh calls and authenticated requests.
//!
//! The manager never talks to the network directly. Every call goes through an
//! [`HttpExecutor`], which receives an [`HttpRequest`] carrying a [`CredentialsMode`]. With
//! [`CredentialsMode::Include`] the executor is expected to attach ambient credentials (the
//! httpOnly refresh cookie) on its own; the manager never reads or writes that cookie.

// crates.io
use ::http::{HeaderMap, Method, StatusCode, header::CONTENT_TYPE};
#[cfg(feature = "reqwest")] use reqwest::cookie::Jar;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpExecutor::execute`].
pub type ExecuteFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over the request-execution function injected into the manager.
///
/// Implementations must be `Send + Sync + 'static` so refreshes can run on spawned tasks, and
/// must honor [`HttpRequest::credentials`]. Timeouts and retries below a single
/// request/response cycle belong to the implementation.
pub trait HttpExecutor
where
	Self: 'static + Send + Sync,
{
	/// Executes one request and returns the fully buffered response.
	fn execute(&self, request: HttpRequest) -> ExecuteFuture<'_>;
}

/// Whether ambient credentials (cookies) accompany a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialsMode {
	/// Never attach ambient credentials.
	Omit,
	/// Attach ambient credentials only for same-origin targets.
	#[default]
	SameOrigin,
	/// Always attach ambient credentials.
	Include,
}

/// Outbound request handed to an [`HttpExecutor`].
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Target URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Ambient credential policy.
	pub credentials: CredentialsMode,
}
impl HttpRequest {
	/// Creates a body-less request with default credentials handling.
	pub fn new(method: Method, url: Url) -> Self {
		Self {
			method,
			url,
			headers: HeaderMap::new(),
			body: None,
			credentials: CredentialsMode::default(),
		}
	}
}

/// Fully buffered response returned by an [`HttpExecutor`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with empty headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Creates a response carrying a JSON body and matching content type.
	pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
		let mut response = Self::new(status, body.to_string());

		response
			.headers
			.insert(CONTENT_TYPE, ::http::HeaderValue::from_static("application/json"));

		response
	}

	/// Returns `true` when the declared content type is JSON (`application/json` or `+json`).
	pub fn is_json(&self) -> bool {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.split(';').next())
			.map(|mime| {
				let mime = mime.trim().to_ascii_lowercase();

				mime == "application/json" || mime.ends_with("+json")
			})
			.unwrap_or(false)
	}
}

/// Adapts a closure into an [`HttpExecutor`].
///
/// The closure receives the owned request and returns a `Send` future, which mirrors an
/// injected `fetch`-style function.
#[derive(Clone)]
pub struct FnExecutor<F>(pub F);
impl<F, Fut> HttpExecutor for FnExecutor<F>
where
	F: 'static + Send + Sync + Fn(HttpRequest) -> Fut,
	Fut: 'static + Send + Future<Output = Result<HttpResponse, TransportError>>,
{
	fn execute(&self, request: HttpRequest) -> ExecuteFuture<'_> {
		Box::pin((self.0)(request))
	}
}
impl<F> Debug for FnExecutor<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnExecutor(..)")
	}
}

/// Reqwest-backed executor that keeps ambient cookies in a shared [`Jar`].
///
/// Two clients are held: the credentialed one carries the cookie jar so a refresh cookie set by
/// the login response rides along automatically, while the anonymous one serves
/// [`CredentialsMode::Omit`]. Redirects are not followed, so the refresh endpoint answers
/// directly.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestExecutor {
	credentialed: ReqwestClient,
	anonymous: ReqwestClient,
	jar: Option<Arc<Jar>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestExecutor {
	/// Builds an executor with a fresh, empty cookie jar.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		Self::with_cookie_jar(Arc::new(Jar::default()))
	}

	/// Builds an executor around a caller-owned cookie jar.
	pub fn with_cookie_jar(jar: Arc<Jar>) -> Result<Self, crate::error::ConfigError> {
		let credentialed = ReqwestClient::builder()
			.cookie_provider(Arc::clone(&jar))
			.redirect(reqwest::redirect::Policy::none())
			.build()?;
		let anonymous =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self { credentialed, anonymous, jar: Some(jar) })
	}

	/// Wraps existing clients; the credentialed client should carry a cookie store.
	pub fn with_clients(credentialed: ReqwestClient, anonymous: ReqwestClient) -> Self {
		Self { credentialed, anonymous, jar: None }
	}

	/// Returns the cookie jar, when the executor owns one.
	pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
		self.jar.as_ref()
	}

	fn client_for(&self, mode: CredentialsMode) -> &ReqwestClient {
		match mode {
			CredentialsMode::Omit => &self.anonymous,
			// A cookie jar already scopes cookies to their origin.
			CredentialsMode::SameOrigin | CredentialsMode::Include => &self.credentialed,
		}
	}
}
#[cfg(feature = "reqwest")]
impl HttpExecutor for ReqwestExecutor {
	fn execute(&self, request: HttpRequest) -> ExecuteFuture<'_> {
		let client = self.client_for(request.credentials).clone();

		Box::pin(async move {
			let mut builder =
				client.request(request.method, request.url.as_str()).headers(request.headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok::<_, TransportError>(HttpResponse { status, headers, body })
		})
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestExecutor").field("owns_jar", &self.jar.is_some()).finish()
	}
}
