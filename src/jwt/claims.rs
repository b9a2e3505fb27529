use crate::error::TokenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Registered claims written into every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims issued at `now` that expire `ttl_ms` milliseconds later.
    ///
    /// The audience doubles as the issuer. Timestamps are whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidParams`] naming `ttl` if the expiry
    /// overflows.
    pub fn new(
        audience: &str,
        subject: &str,
        ttl_ms: u64,
        now: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        let exp_ms = i64::try_from(ttl_ms)
            .ok()
            .and_then(|ttl| now.timestamp_millis().checked_add(ttl))
            .ok_or(TokenError::InvalidParams { field: "ttl" })?;

        Ok(Claims {
            iss: audience.to_string(),
            sub: subject.to_string(),
            aud: vec![audience.to_string()],
            iat: now.timestamp(),
            exp: exp_ms.div_euclid(1000),
        })
    }

    /// Registered claims with `custom` layered on top; custom entries win.
    #[must_use]
    pub fn merge(&self, custom: &HashMap<String, Value>) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("iss".to_string(), Value::from(self.iss.clone()));
        claims.insert("sub".to_string(), Value::from(self.sub.clone()));
        claims.insert("aud".to_string(), Value::from(self.aud.clone()));
        claims.insert("iat".to_string(), Value::from(self.iat));
        claims.insert("exp".to_string(), Value::from(self.exp));

        for (name, value) in custom {
            claims.insert(name.clone(), value.clone());
        }
        claims
    }
}

/// Read `exp` from a decoded claim map as Unix seconds.
///
/// # Errors
///
/// [`TokenError::MissingExpiry`] when the claim is absent or null,
/// [`TokenError::MalformedExpiry`] when it is not a number.
pub fn expiry(claims: &Map<String, Value>) -> Result<i64, TokenError> {
    match claims.get("exp") {
        None | Some(Value::Null) => Err(TokenError::MissingExpiry),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .ok_or_else(|| TokenError::MalformedExpiry(n.to_string())),
        Some(other) => Err(TokenError::MalformedExpiry(format!(
            "expected a number, found {}",
            other
        ))),
    }
}

/// Reject claims whose expiry is at or before `now`.
///
/// # Errors
///
/// Returns the [`expiry`] errors or [`TokenError::TokenExpired`].
pub fn ensure_not_expired(claims: &Map<String, Value>, now: DateTime<Utc>) -> Result<(), TokenError> {
    let exp = expiry(claims)?;
    if exp <= now.timestamp() {
        return Err(TokenError::TokenExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, millis * 1_000_000).unwrap()
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("svc-a", "user-1", 2000, at(1_700_000_000, 0)).unwrap();

        assert_eq!(claims.iss, "svc-a");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.aud, vec!["svc-a".to_string()]);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_002);
    }

    #[test]
    fn test_expiry_truncates_to_seconds() {
        let claims = Claims::new("a", "s", 1500, at(100, 600)).unwrap();
        // 100.600 + 1.500 = 102.100
        assert_eq!(claims.exp, 102);

        let claims = Claims::new("a", "s", 0, at(100, 999)).unwrap();
        assert_eq!(claims.exp, claims.iat);
    }

    #[test]
    fn test_ttl_overflow() {
        let err = Claims::new("a", "s", u64::MAX, at(100, 0)).err().unwrap();
        assert!(matches!(err, TokenError::InvalidParams { field: "ttl" }));
    }

    #[test]
    fn test_custom_claims_override_registered() {
        let claims = Claims::new("svc-a", "user-1", 2000, at(100, 0)).unwrap();
        let mut custom = HashMap::new();
        custom.insert("role".to_string(), json!("admin"));
        custom.insert("sub".to_string(), json!("impersonated"));

        let merged = claims.merge(&custom);

        assert_eq!(merged["role"], "admin");
        assert_eq!(merged["sub"], "impersonated");
        assert_eq!(merged["aud"], json!(["svc-a"]));
        assert_eq!(merged["exp"], 102);
    }

    #[test]
    fn test_expiry_decoding() {
        let mut claims = Map::new();
        assert!(matches!(expiry(&claims), Err(TokenError::MissingExpiry)));

        claims.insert("exp".to_string(), Value::Null);
        assert!(matches!(expiry(&claims), Err(TokenError::MissingExpiry)));

        claims.insert("exp".to_string(), json!("tomorrow"));
        assert!(matches!(expiry(&claims), Err(TokenError::MalformedExpiry(_))));

        claims.insert("exp".to_string(), json!(1_700_000_000.9));
        assert_eq!(expiry(&claims).unwrap(), 1_700_000_000);

        claims.insert("exp".to_string(), json!(42));
        assert_eq!(expiry(&claims).unwrap(), 42);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut claims = Map::new();
        claims.insert("exp".to_string(), json!(100));

        assert!(ensure_not_expired(&claims, at(99, 999)).is_ok());
        assert!(matches!(
            ensure_not_expired(&claims, at(100, 0)),
            Err(TokenError::TokenExpired)
        ));
        assert!(matches!(
            ensure_not_expired(&claims, at(101, 0)),
            Err(TokenError::TokenExpired)
        ));
    }
}
