//! Token signing and parsing.

use crate::error::TokenError;
use crate::jwt::claims::{self, Claims};
use crate::jwt::signer::rsa_algorithm;
use crate::jwt::{CompactToken, SignParams, SigningMode};
use crate::keys::KeyStore;
use crate::metrics;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Claims decoded from a verified token.
pub type ParsedClaims = Map<String, Value>;

/// Issues and verifies compact tokens with the keys of a [`KeyStore`].
#[derive(Debug, Clone)]
pub struct TokenEngine {
    keys: Arc<KeyStore>,
}

impl TokenEngine {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        TokenEngine { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Sign a token for `params`.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnsupportedMode`] for encryption,
    /// [`TokenError::InvalidParams`] naming the first invalid field, or any
    /// key loading and signing error.
    pub fn signed_token(&self, params: &SignParams) -> Result<String, TokenError> {
        match params.mode {
            SigningMode::Signature => self.sign_jwt(params),
            SigningMode::Encryption => Err(TokenError::unsupported(
                "JWE: encrypted tokens are not implemented",
            )),
        }
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnsupportedMode`] for encryption,
    /// [`TokenError::TokenFormat`], [`TokenError::Signature`],
    /// [`TokenError::MissingExpiry`], [`TokenError::MalformedExpiry`] or
    /// [`TokenError::TokenExpired`], or any key loading error.
    pub fn parse_token(&self, token: &str, mode: SigningMode) -> Result<ParsedClaims, TokenError> {
        let result = match mode {
            SigningMode::Signature => self.parse_jwt(token),
            SigningMode::Encryption => Err(TokenError::unsupported(
                "JWE: encrypted tokens are not implemented",
            )),
        };

        match &result {
            Ok(_) => metrics::record_token_parsed("ok"),
            Err(e) => metrics::record_token_parsed(e.code()),
        }
        result
    }

    fn sign_jwt(&self, params: &SignParams) -> Result<String, TokenError> {
        params.validate()?;

        let signer = self
            .keys
            .signer(&params.headers, &params.algorithm, params.mode)?;

        let claims = Claims::new(&params.audience, &params.subject, params.ttl_ms, Utc::now())?;
        let token = signer.sign_claims(&claims.merge(&params.claims))?;

        debug!(
            subject = %params.subject,
            audience = %params.audience,
            algorithm = %params.algorithm,
            exp = claims.exp,
            "signed token"
        );
        metrics::record_token_issued(&params.algorithm);
        Ok(token)
    }

    fn parse_jwt(&self, token: &str) -> Result<ParsedClaims, TokenError> {
        let compact = CompactToken::parse(token)?;

        let algorithm = rsa_algorithm(compact.algorithm()).ok_or_else(|| {
            TokenError::Signature(format!(
                "unsupported token algorithm: {}",
                compact.algorithm()
            ))
        })?;

        let key = self.keys.decoding_key()?;
        let valid = jsonwebtoken::crypto::verify(
            compact.signature(),
            compact.signing_input().as_bytes(),
            key,
            algorithm,
        )
        .map_err(|e| TokenError::Signature(e.to_string()))?;
        if !valid {
            return Err(TokenError::Signature(
                "signature does not match the verification key".to_string(),
            ));
        }

        let claims = compact.claims()?;
        claims::ensure_not_expired(&claims, Utc::now())?;

        let subject = claims
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        debug!(subject, "parsed token");
        Ok(claims)
    }
}
