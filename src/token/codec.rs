//! Compact token codec: structural validation and unverified claim decoding.
//!
//! Tokens are three period-delimited segments (header, payload, signature). Only the payload
//! is read, to learn the `exp` claim; signatures are never checked because the issuing server
//! is the trust boundary.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, error::DecodeError, token::Token};

/// Base64url engine that tolerates both padded and unpadded payload segments.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const EXPIRATION_CLAIM: &str = "exp";

/// Decoded (unverified) claims carried by a token payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub Map<String, Value>);
impl Claims {
	/// Returns the raw claim value, if present.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Returns the `exp` claim converted to epoch milliseconds.
	pub fn expiration_millis(&self) -> Option<i64> {
		let exp = self.get(EXPIRATION_CLAIM)?;

		if let Some(secs) = exp.as_i64() {
			return secs.checked_mul(1_000);
		}

		// NumericDate may carry fractional seconds.
		exp.as_f64().filter(|secs| secs.is_finite()).map(|secs| (secs * 1_000.0) as i64)
	}
}

/// Returns `true` iff `token` splits into exactly three non-empty segments.
pub fn is_valid_format(token: &str) -> bool {
	let mut segments = 0;

	for segment in token.split('.') {
		if segment.is_empty() {
			return false;
		}

		segments += 1;
	}

	segments == 3
}

/// Decodes the payload segment into a claims map without verifying the signature.
pub fn decode_payload(token: &str) -> Result<Claims, DecodeError> {
	let segments = token.split('.').collect::<Vec<_>>();
	let [_, payload, _] = segments.as_slice() else {
		return Err(DecodeError::InvalidFormat);
	};
	let bytes = PAYLOAD_ENGINE.decode(payload).map_err(DecodeError::decode)?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(DecodeError::decode)
}

/// Reads the `exp` claim (epoch seconds) and returns it as an instant.
pub fn extract_expiration(token: &str) -> Result<OffsetDateTime, DecodeError> {
	let millis = decode_payload(token)?.expiration_millis().ok_or(DecodeError::MissingExpiration)?;

	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
		.map_err(|_| DecodeError::ExpirationOutOfRange)
}

/// Builds a [`Token`] from a raw compact string, deriving its expiry from the claims.
pub fn build_token(token: impl Into<String>) -> Result<Token, DecodeError> {
	let token = token.into();
	let expires_at = extract_expiration(&token)?;

	Ok(Token::new(token, expires_at))
}

/// Returns `true` iff the current instant is at or past the expiry minus `buffer`.
pub fn is_expired(token: &Token, buffer: Duration) -> bool {
	token.is_expired(buffer)
}

#[cfg(test)]
pub(crate) mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	pub(crate) fn encode_token(claims: Value) -> String {
		let payload = PAYLOAD_ENGINE.encode(claims.to_string());

		format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature")
	}

	#[test]
	fn format_requires_three_non_empty_segments() {
		let cases = [
			("", false),
			("single", false),
			("two.segments", false),
			("a.b.c", true),
			("a.b.c.d", false),
			("a..c", false),
			(".b.c", false),
			("a.b.", false),
			("..", false),
			("a.b.c.", false),
		];

		for (input, expected) in cases {
			assert_eq!(is_valid_format(input), expected, "Unexpected verdict for {input:?}.");
		}
	}

	#[test]
	fn build_token_scales_seconds_to_millis() {
		let exp = 1_900_000_000_i64;
		let token = build_token(encode_token(json!({ "sub": "user-1", "exp": exp })))
			.expect("Token with an exp claim should build.");

		assert_eq!(token.expires_at_unix_millis(), exp * 1_000);
		assert!(!is_expired(&token, Duration::ZERO));
	}

	#[test]
	fn past_expiration_is_expired() {
		let token = build_token(encode_token(json!({ "exp": 1_000 })))
			.expect("Token with an exp claim should build.");

		assert!(is_expired(&token, Duration::ZERO));
	}

	#[test]
	fn fractional_expiration_is_accepted() {
		let millis = decode_payload(&encode_token(json!({ "exp": 1_700_000_000.5 })))
			.expect("Payload should decode.")
			.expiration_millis();

		assert_eq!(millis, Some(1_700_000_000_500));
	}

	#[test]
	fn padded_payload_decodes() {
		let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":1}"#);
		let claims =
			decode_payload(&format!("h.{payload}.s")).expect("Padded payload should decode.");

		assert_eq!(claims.get("exp"), Some(&json!(1)));
	}

	#[test]
	fn decode_failures_are_classified() {
		assert!(matches!(decode_payload("a.b"), Err(DecodeError::InvalidFormat)));
		assert!(matches!(decode_payload("a.b.c.d"), Err(DecodeError::InvalidFormat)));
		assert!(matches!(decode_payload("a.!!!.c"), Err(DecodeError::Decode { .. })));

		let not_json = format!("a.{}.c", PAYLOAD_ENGINE.encode("not json"));

		assert!(matches!(decode_payload(&not_json), Err(DecodeError::Decode { .. })));
		assert!(matches!(
			extract_expiration(&encode_token(json!({ "sub": "no-exp" }))),
			Err(DecodeError::MissingExpiration)
		));
		assert!(matches!(
			build_token(encode_token(json!({ "exp": "soon" }))),
			Err(DecodeError::MissingExpiration)
		));
	}
}
