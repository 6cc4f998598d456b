mod common;

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE};
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use token_steward::{error::DecodeError, token::codec};

#[test]
fn expiry_round_trips_through_public_codec() {
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 90;
	let raw = encode_token(json!({ "sub": "codec", "exp": exp, "roles": ["admin"] }));
	let claims = codec::decode_payload(&raw).expect("Payload should decode.");

	assert_eq!(claims.get("sub"), Some(&json!("codec")));
	assert_eq!(claims.expiration_millis(), Some(exp * 1_000));

	let token = codec::build_token(raw.clone()).expect("Token should build from its claims.");

	assert_eq!(token.value.expose(), raw);
	assert!(!codec::is_expired(&token, Duration::seconds(6)));
	assert!(codec::is_expired(&token, Duration::minutes(2)));
}

#[test]
fn padded_payload_segments_are_accepted() {
	let payload = URL_SAFE.encode(json!({ "exp": 1_900_000_000 }).to_string());
	let raw = format!("eyJhbGciOiJub25lIn0.{payload}.sig");

	assert_eq!(
		codec::extract_expiration(&raw).expect("Padded payload should decode.").unix_timestamp(),
		1_900_000_000
	);
}

#[test]
fn structural_and_claim_failures_are_distinguished() {
	assert!(!codec::is_valid_format("invalid-token"));
	assert!(matches!(codec::decode_payload("invalid-token"), Err(DecodeError::InvalidFormat)));
	assert!(matches!(codec::decode_payload("a.!!!.c"), Err(DecodeError::Decode { .. })));
	assert!(matches!(
		codec::extract_expiration(&encode_token(json!({ "sub": "no-exp" }))),
		Err(DecodeError::MissingExpiration)
	));
}

#[test]
fn format_validity_tracks_segment_shape() {
	// Every combination of up to four segments, each either empty or populated.
	for count in 0..=4_u32 {
		for mask in 0..(1_u32 << count) {
			let segments =
				(0..count).map(|i| if mask & (1 << i) == 0 { "" } else { "seg" }).collect::<Vec<_>>();
			let candidate = segments.join(".");
			let expected = count == 3 && mask == 0b111;

			assert_eq!(codec::is_valid_format(&candidate), expected, "candidate: {candidate:?}");
		}
	}
}
