//! Steward-level error types shared by the codec, refresh, and request paths.

// self
use crate::_prelude::*;

/// Steward-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token string is not a three-segment compact token.
	#[error("Token is not a well-formed three-segment token.")]
	Format,
	/// Token claims could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Refresh endpoint call failed.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Every refresh option was exhausted without producing a usable token.
	#[error("No valid token is available.")]
	NoValidToken {
		/// Refresh failure that left the manager without a token, if any.
		#[source]
		source: Option<RefreshError>,
	},
	/// Authenticated request failed for a reason unrelated to authorization.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Manager was disposed and no longer refreshes tokens.
	#[error("Token manager has been disposed.")]
	Disposed,
}
impl Error {
	/// Wraps an optional refresh failure into [`Error::NoValidToken`].
	pub fn no_valid_token(source: Option<RefreshError>) -> Self {
		Self::NoValidToken { source }
	}
}

/// Configuration and validation failures raised while building a manager.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// No refresh endpoint was configured.
	#[error("Refresh endpoint is required.")]
	MissingRefreshEndpoint,
	/// Refresh endpoint cannot be parsed.
	#[error("Refresh endpoint is invalid.")]
	InvalidRefreshEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// No response-to-token mapping was configured.
	#[error("Token extractor is required.")]
	MissingTokenExtractor,
	/// Extra refresh header is not a valid HTTP header.
	#[error("Refresh header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name as supplied.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while decoding a compact token's claims.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token does not split into exactly three segments.
	#[error("Invalid token format")]
	InvalidFormat,
	/// Payload segment is not base64url-encoded JSON.
	#[error("Failed to decode")]
	Decode {
		/// Underlying base64 or JSON failure.
		#[source]
		source: BoxError,
	},
	/// Payload carries no numeric `exp` claim.
	#[error("Missing expiration")]
	MissingExpiration,
	/// The `exp` claim cannot be represented as an instant.
	#[error("The exp claim exceeds the supported range.")]
	ExpirationOutOfRange,
}
impl DecodeError {
	pub(crate) fn decode(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Decode { source: Box::new(src) }
	}
}

/// Refresh failure shared verbatim by every coalesced waiter.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint responded with HTTP {status}.")]
	Status {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint could not be reached.")]
	Transport {
		/// Transport failure.
		#[source]
		source: Arc<TransportError>,
	},
	/// Refresh endpoint returned a body that is not JSON.
	#[error("Refresh endpoint returned malformed JSON.")]
	MalformedBody {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// Configured token extractor rejected the response payload.
	#[error(transparent)]
	Extract(#[from] ExtractError),
	/// Extracted token is not a three-segment compact token.
	#[error("Refresh endpoint returned an invalid token.")]
	InvalidToken,
	/// Refresh task ended without producing an outcome.
	#[error("Refresh task was aborted before completing.")]
	Aborted,
}
impl RefreshError {
	/// Returns `true` when the endpoint rejected the refresh credential (HTTP 401 or 403).
	pub fn is_auth_rejection(&self) -> bool {
		matches!(self, Self::Status { status: 401 | 403 })
	}

	/// Returns the HTTP status carried by the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status } => Some(*status),
			_ => None,
		}
	}
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		Self::Transport { source: Arc::new(e) }
	}
}

/// Failure reported by a token extractor.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token extraction failed: {message}.")]
pub struct ExtractError {
	/// Human-readable reason.
	pub message: String,
}
impl ExtractError {
	/// Creates an extraction failure with the provided reason.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}
impl From<DecodeError> for ExtractError {
	fn from(e: DecodeError) -> Self {
		Self::new(e.to_string())
	}
}

/// Failures raised by authenticated requests that are not authorization problems.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// Underlying transport failed.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Bearer header could not be built from the token value.
	#[error("Authorization header could not be built.")]
	InvalidHeader {
		/// Underlying header failure.
		#[source]
		source: ::http::header::InvalidHeaderValue,
	},
	/// JSON-typed response body could not be parsed.
	#[error("Response declared JSON but the body is malformed.")]
	MalformedBody {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while executing the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
