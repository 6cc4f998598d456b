//! Authenticated requests with a single refresh-then-retry cycle.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{RefreshError, RequestError},
	http::{CredentialsMode, HttpExecutor, HttpRequest, HttpResponse},
	manager::TokenManager,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	token::TokenSecret,
};

/// Outbound call issued through [`TokenManager::request`].
#[derive(Clone, Debug)]
pub struct AuthenticatedRequest {
	/// HTTP method.
	pub method: Method,
	/// Target URL.
	pub url: Url,
	/// Caller headers; any `authorization` entry is replaced by the bearer token.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl AuthenticatedRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets a JSON body and the matching content type.
	pub fn with_json(self, body: &Value) -> Self {
		self.with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.with_body(body.to_string())
	}
}

/// Response body materialized according to the declared content type.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Parsed JSON document.
	Json(Value),
	/// Raw text (lossily decoded as UTF-8).
	Text(String),
}

/// Final response of an authenticated call.
#[derive(Clone, Debug)]
pub struct AuthenticatedResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// `true` for 2xx statuses.
	pub ok: bool,
	/// Materialized body.
	pub body: ResponseBody,
}
impl AuthenticatedResponse {
	/// Deserializes the body into `T`, parsing text bodies as JSON.
	pub fn json<T>(&self) -> Result<T, serde_json::Error>
	where
		T: DeserializeOwned,
	{
		match &self.body {
			ResponseBody::Json(value) => T::deserialize(value),
			ResponseBody::Text(text) => serde_json::from_str(text),
		}
	}

	/// Returns the text body, if the response was not JSON-typed.
	pub fn text(&self) -> Option<&str> {
		match &self.body {
			ResponseBody::Text(text) => Some(text),
			ResponseBody::Json(_) => None,
		}
	}
}
impl TryFrom<HttpResponse> for AuthenticatedResponse {
	type Error = RequestError;

	fn try_from(response: HttpResponse) -> Result<Self, Self::Error> {
		let body = if response.is_json() && !response.body.is_empty() {
			let mut de = serde_json::Deserializer::from_slice(&response.body);

			ResponseBody::Json(
				serde_path_to_error::deserialize(&mut de)
					.map_err(|source| RequestError::MalformedBody { source })?,
			)
		} else {
			ResponseBody::Text(String::from_utf8_lossy(&response.body).into_owned())
		};

		Ok(Self {
			ok: response.status.is_success(),
			status: response.status,
			headers: response.headers,
			body,
		})
	}
}

impl<E> TokenManager<E>
where
	E: ?Sized + HttpExecutor,
{
	/// Sends `request` with the current bearer token, refreshing and retrying once on 401.
	///
	/// A 401 triggers one refresh; on success the request is re-issued once and that response
	/// is returned whatever its status. If the refresh fails the token is cleared,
	/// `on_auth_failure` fires (unless the refresh endpoint itself already reported the
	/// rejection), and the call fails with [`Error::NoValidToken`].
	pub async fn request(&self, request: AuthenticatedRequest) -> Result<AuthenticatedResponse> {
		const KIND: OperationKind = OperationKind::Request;

		let span = OperationSpan::new(KIND, "request");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.get_token().await?;
				let response = self.send_authorized(&request, &token).await?;

				if response.status != StatusCode::UNAUTHORIZED {
					return Ok(AuthenticatedResponse::try_from(response)?);
				}

				obs::note(KIND, "Request rejected with 401; refreshing before a single retry.");

				match self.refresh_token().await {
					Ok(token) => {
						let retried = self.send_authorized(&request, &token.value).await?;

						Ok(AuthenticatedResponse::try_from(retried)?)
					},
					Err(err) => Err(self.abandon_session(err)),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(_) => obs::record_outcome(KIND, OperationOutcome::Failure),
		}

		result
	}

	async fn send_authorized(
		&self,
		request: &AuthenticatedRequest,
		token: &TokenSecret,
	) -> Result<HttpResponse> {
		let mut bearer = HeaderValue::try_from(format!("Bearer {}", token.expose()))
			.map_err(|source| RequestError::InvalidHeader { source })?;

		bearer.set_sensitive(true);

		let mut headers = request.headers.clone();

		headers.insert(AUTHORIZATION, bearer);

		let outbound = HttpRequest {
			method: request.method.clone(),
			url: request.url.clone(),
			headers,
			body: request.body.clone(),
			credentials: CredentialsMode::Include,
		};

		Ok(self.inner.executor.execute(outbound).await.map_err(RequestError::from)?)
	}

	fn abandon_session(&self, err: Error) -> Error {
		let source = match err {
			Error::Refresh(err) => Some(err),
			_ => None,
		};
		let already_reported = source.as_ref().is_some_and(RefreshError::is_auth_rejection);

		self.clear_token();

		if !already_reported && !self.is_disposed() {
			self.inner.config.hooks.auth_failed();
		}

		Error::no_valid_token(source)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(content_type: Option<&'static str>, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(StatusCode::OK, body);

		if let Some(value) = content_type {
			response.headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
		}

		response
	}

	#[test]
	fn bodies_follow_declared_content_type() {
		let json =
			AuthenticatedResponse::try_from(response(Some("application/json"), r#"{"id":7}"#))
				.expect("JSON body should parse.");

		assert!(json.ok);
		assert_eq!(json.body, ResponseBody::Json(serde_json::json!({ "id": 7 })));
		assert_eq!(json.json::<serde_json::Map<String, Value>>().expect("Map").len(), 1);

		let text = AuthenticatedResponse::try_from(response(Some("text/plain"), r#"{"id":7}"#))
			.expect("Text body should be kept raw.");

		assert_eq!(text.text(), Some(r#"{"id":7}"#));

		let untyped =
			AuthenticatedResponse::try_from(response(None, "plain")).expect("Untyped body is text.");

		assert_eq!(untyped.body, ResponseBody::Text("plain".into()));
	}

	#[test]
	fn malformed_json_is_a_request_error() {
		let err = AuthenticatedResponse::try_from(response(Some("application/json"), "{oops"))
			.expect_err("Malformed JSON should be rejected.");

		assert!(matches!(err, RequestError::MalformedBody { .. }));
	}

	#[test]
	fn json_helper_sets_content_type() {
		let request = AuthenticatedRequest::post(
			Url::parse("https://api.example.com/items").expect("URL should parse."),
		)
		.with_json(&serde_json::json!({ "name": "widget" }));

		assert_eq!(
			request.headers.get(CONTENT_TYPE).map(|v| v.as_bytes()),
			Some(&b"application/json"[..])
		);
		assert_eq!(request.body.as_deref(), Some(&br#"{"name":"widget"}"#[..]));
	}
}
