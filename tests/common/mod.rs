//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
// self
use token_steward::{
	ManagerConfig, StatusCode, TokenExtractor,
	config::ManagerConfigBuilder,
	error::TransportError,
	http::{ExecuteFuture, HttpExecutor, HttpRequest, HttpResponse},
};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Encodes `claims` into an unsigned three-segment token.
pub fn encode_token(claims: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Mints a token for `subject` that expires `lifetime` from now.
pub fn token_expiring_in(subject: &str, lifetime: Duration) -> String {
	let exp = (OffsetDateTime::now_utc() + lifetime).unix_timestamp();

	encode_token(json!({ "sub": subject, "exp": exp }))
}

/// Refresh endpoint body carrying `token` under the field the fixtures extract.
pub fn refresh_body(token: &str) -> Value {
	json!({ "accessToken": token })
}

/// Config builder pointed at `base` with the JWT-field extractor.
pub fn config_builder(base: &str) -> ManagerConfigBuilder {
	ManagerConfig::builder()
		.refresh_endpoint_str(&format!("{base}{REFRESH_PATH}"))
		.extractor(TokenExtractor::jwt_field("accessToken"))
}

/// Counts hook invocations and remembers their order.
#[derive(Clone, Debug, Default)]
pub struct HookLog {
	events: Arc<Mutex<Vec<&'static str>>>,
}
impl HookLog {
	pub fn push(&self, event: &'static str) {
		self.events.lock().push(event);
	}

	pub fn events(&self) -> Vec<&'static str> {
		self.events.lock().clone()
	}

	pub fn count(&self, event: &str) -> usize {
		self.events.lock().iter().filter(|e| **e == event).count()
	}

	/// Wires every hook of `builder` into this log.
	pub fn attach(&self, builder: ManagerConfigBuilder) -> ManagerConfigBuilder {
		let success = self.clone();
		let error = self.clone();
		let auth = self.clone();

		builder
			.on_refresh_success(move |_| success.push("refresh_success"))
			.on_refresh_error(move |_| error.push("refresh_error"))
			.on_auth_failure(move || auth.push("auth_failure"))
	}
}

type Handler = dyn Fn(&HttpRequest, usize) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Scripted executor that records every request and answers through a handler.
///
/// The handler receives the request and how many earlier requests hit the same path.
pub struct FakeExecutor {
	handler: Box<Handler>,
	log: Mutex<Vec<HttpRequest>>,
	latency: std::time::Duration,
	in_flight: AtomicUsize,
}
impl FakeExecutor {
	pub fn new<F>(handler: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&HttpRequest, usize) -> Result<HttpResponse, TransportError>,
	{
		Self {
			handler: Box::new(handler),
			log: Mutex::new(Vec::new()),
			latency: std::time::Duration::ZERO,
			in_flight: AtomicUsize::new(0),
		}
	}

	/// Delays every response, keeping calls in flight long enough to overlap.
	pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
		self.latency = latency;

		self
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.log.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.log.lock().len()
	}

	pub fn calls_to(&self, path: &str) -> usize {
		self.log.lock().iter().filter(|request| request.url.path() == path).count()
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::SeqCst)
	}
}
impl HttpExecutor for FakeExecutor {
	fn execute(&self, request: HttpRequest) -> ExecuteFuture<'_> {
		Box::pin(async move {
			let seen = self.calls_to(request.url.path());

			self.log.lock().push(request.clone());
			self.in_flight.fetch_add(1, Ordering::SeqCst);

			if !self.latency.is_zero() {
				tokio::time::sleep(self.latency).await;
			}

			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			(self.handler)(&request, seen)
		})
	}
}

pub fn json_response(status: StatusCode, body: Value) -> Result<HttpResponse, TransportError> {
	Ok(HttpResponse::json(status, &body))
}

pub fn network_failure() -> Result<HttpResponse, TransportError> {
	Err(TransportError::Io(std::io::Error::new(
		std::io::ErrorKind::ConnectionRefused,
		"refresh endpoint unreachable",
	)))
}
