//! Property-based tests for token signing and parsing.
//!
//! Property 1: Sign/Parse Round-Trip
//! Property 2: Claim Override Precedence
//! Property 3: Expiry Boundary
//! Property 4: Expiry Arithmetic
//! Property 5: Compact Structure

use chrono::{TimeZone, Utc};
use jwt_signer::jwt::claims::{self, Claims};
use jwt_signer::jwt::CompactToken;
use jwt_signer::{JwtConfig, KeyStore, SignParams, SigningMode, TokenEngine, TokenError};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

static ENGINE: Lazy<TokenEngine> = Lazy::new(|| {
    TokenEngine::new(Arc::new(KeyStore::new(JwtConfig::ephemeral()).unwrap()))
});

fn arb_audience() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9/_-]{0,31}"
}

fn arb_subject() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,64}"
}

fn arb_algorithm() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["RS256", "RS384", "RS512", "PS256", "PS384", "PS512"])
}

/// Custom claim names that never collide with registered claims.
fn arb_custom_claims() -> impl Strategy<Value = HashMap<String, Value>> {
    prop::collection::hash_map(
        "x_[a-z]{1,12}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[ -~]{0,24}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ],
        0..5,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property 1: Sign/Parse Round-Trip
    ///
    /// Every token the engine signs parses back to the claims it was
    /// built from.
    #[test]
    fn prop_sign_parse_round_trip(
        audience in arb_audience(),
        subject in arb_subject(),
        algorithm in arb_algorithm(),
        custom in arb_custom_claims(),
    ) {
        let params = SignParams::builder()
            .audience(audience.clone())
            .subject(subject.clone())
            .claims(custom.clone())
            .algorithm(algorithm)
            .ttl_ms(60_000)
            .build();

        let token = ENGINE.signed_token(&params).unwrap();
        let compact = CompactToken::parse(&token).unwrap();
        prop_assert_eq!(compact.algorithm(), algorithm);

        let parsed = ENGINE.parse_token(&token, SigningMode::Signature).unwrap();
        prop_assert_eq!(&parsed["iss"], &json!(audience));
        prop_assert_eq!(&parsed["aud"], &json!([audience]));
        prop_assert_eq!(&parsed["sub"], &json!(subject));
        for (name, value) in &custom {
            prop_assert_eq!(&parsed[name.as_str()], value);
        }
    }

    /// Property 2: Claim Override Precedence
    ///
    /// A custom claim with a registered name replaces the registered value.
    #[test]
    fn prop_custom_claims_override_registered(
        subject in arb_subject(),
        replacement in arb_subject(),
    ) {
        let registered = Claims::new("svc-a", &subject, 1000, Utc::now()).unwrap();
        let mut custom = HashMap::new();
        custom.insert("sub".to_string(), json!(replacement));

        let merged = registered.merge(&custom);
        prop_assert_eq!(&merged["sub"], &json!(replacement));
        prop_assert_eq!(&merged["iss"], &json!("svc-a"));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property 3: Expiry Boundary
    ///
    /// A token is expired exactly when `exp <= now`.
    #[test]
    fn prop_expiry_boundary(
        now in 0i64..4_000_000_000,
        offset in -100_000i64..100_000,
    ) {
        let mut claims = Map::new();
        claims.insert("exp".to_string(), json!(now + offset));
        let now_time = Utc.timestamp_opt(now, 0).unwrap();

        let result = claims::ensure_not_expired(&claims, now_time);
        if offset > 0 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(TokenError::TokenExpired)));
        }
    }

    /// Property 4: Expiry Arithmetic
    ///
    /// `exp` is the issue time plus the TTL in milliseconds, floored to
    /// whole seconds.
    #[test]
    fn prop_expiry_is_floored_seconds(
        now_ms in 0i64..4_000_000_000_000,
        ttl_ms in 0u64..10_000_000_000,
    ) {
        let now = Utc.timestamp_millis_opt(now_ms).unwrap();
        let claims = Claims::new("svc-a", "user-1", ttl_ms, now).unwrap();

        prop_assert_eq!(claims.iat, now_ms.div_euclid(1000));
        prop_assert_eq!(claims.exp, (now_ms + ttl_ms as i64).div_euclid(1000));
        prop_assert!(claims.exp >= claims.iat);
    }

    /// Property 5: Compact Structure
    ///
    /// Anything without exactly three segments is a format error.
    #[test]
    fn prop_wrong_segment_count_is_format_error(
        segments in prop::collection::vec("[A-Za-z0-9_-]{0,16}", 0..8),
    ) {
        prop_assume!(segments.len() != 3);
        let token = segments.join(".");
        prop_assert!(matches!(
            ENGINE.parse_token(&token, SigningMode::Signature),
            Err(TokenError::TokenFormat(_))
        ));
    }
}

#[test]
fn test_ttl_overflow_is_invalid() {
    let params = SignParams::builder()
        .audience("svc-a")
        .subject("user-1")
        .algorithm("RS256")
        .ttl_ms(u64::MAX)
        .build();

    assert!(matches!(
        ENGINE.signed_token(&params),
        Err(TokenError::InvalidParams { field: "ttl" })
    ));
}
