//! Walks through the token lifecycle against an in-process refresh endpoint.
//!
//! 1. Wrap a closure in [`FnExecutor`] so no network is needed; it plays both the refresh
//!    endpoint and a protected API that only accepts the latest token.
//! 2. Store an initial token, then issue a request that is rejected with 401.
//! 3. The manager refreshes once, retries once, and the hooks report what happened.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use serde_json::json;
use time::Duration;
// self
use token_steward::{
	ManagerConfig, StatusCode, TokenExtractor, TokenManager,
	error::TransportError,
	http::{FnExecutor, HttpExecutor, HttpRequest, HttpResponse},
	manager::AuthenticatedRequest,
	url::Url,
};

const EXPIRES_AT: i64 = 4_102_444_800;

fn mint(generation: usize) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
	let payload = URL_SAFE_NO_PAD.encode(json!({ "gen": generation, "exp": EXPIRES_AT }).to_string());

	format!("{header}.{payload}.demo")
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let generation = Arc::new(AtomicUsize::new(0));
	let server = Arc::clone(&generation);
	let executor: Arc<dyn HttpExecutor> = Arc::new(FnExecutor(move |request: HttpRequest| {
		let server = Arc::clone(&server);

		async move {
			let response = match request.url.path() {
				"/auth/refresh" => {
					let next = server.fetch_add(1, Ordering::SeqCst) + 1;

					HttpResponse::json(StatusCode::OK, &json!({ "accessToken": mint(next) }))
				},
				_ => {
					let expected = format!("Bearer {}", mint(server.load(Ordering::SeqCst)));
					let presented = request
						.headers
						.get("authorization")
						.and_then(|value| value.to_str().ok())
						.unwrap_or_default();

					if presented == expected {
						HttpResponse::json(StatusCode::OK, &json!({ "orders": [1, 2, 3] }))
					} else {
						HttpResponse::new(StatusCode::UNAUTHORIZED, "stale token")
					}
				},
			};

			Ok::<_, TransportError>(response)
		}
	}));
	let config = ManagerConfig::builder()
		.refresh_endpoint(Url::parse("https://app.example.com/auth/refresh")?)
		.extractor(TokenExtractor::jwt_field("accessToken"))
		.refresh_buffer(Duration::seconds(30))
		.on_refresh_success(|token| println!("refreshed; expires at {}", token.expires_at))
		.on_refresh_error(|err| println!("refresh failed: {err}"))
		.on_auth_failure(|| println!("session lost; redirect to login"))
		.build()?;
	let manager: TokenManager<dyn HttpExecutor> = TokenManager::with_executor(config, executor);

	// Generation 0 is already stale server-side once the server has issued generation 1.
	generation.store(1, Ordering::SeqCst);
	manager.set_token(mint(0))?;

	let response = manager
		.request(AuthenticatedRequest::get(Url::parse("https://app.example.com/api/orders")?))
		.await?;

	println!("status: {}", response.status);
	println!("body: {:?}", response.body);
	println!(
		"refresh attempts: {}, successes: {}",
		manager.refresh_metrics().attempts(),
		manager.refresh_metrics().successes()
	);

	manager.dispose();

	Ok(())
}
