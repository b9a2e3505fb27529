use crate::error::TokenError;
use crate::jwt::mode::SigningMode;
use std::collections::HashMap;

/// Inputs for [`crate::TokenEngine::signed_token`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignParams {
    /// Audience, also used as the issuer
    pub audience: String,
    pub subject: String,
    /// Custom claims layered over the registered ones
    pub claims: HashMap<String, serde_json::Value>,
    /// Extra protected header entries
    pub headers: HashMap<String, String>,
    /// JWA name, e.g. `RS256`
    pub algorithm: String,
    pub mode: SigningMode,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
}

impl SignParams {
    #[must_use]
    pub fn builder() -> SignParamsBuilder {
        SignParamsBuilder::default()
    }

    /// Check audience, subject and algorithm, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidParams`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.audience.trim().is_empty() {
            return Err(TokenError::InvalidParams { field: "audience" });
        }
        if self.subject.trim().is_empty() {
            return Err(TokenError::InvalidParams { field: "subject" });
        }
        if self.algorithm.is_empty() {
            return Err(TokenError::InvalidParams { field: "algorithm" });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SignParamsBuilder {
    params: SignParams,
}

impl SignParamsBuilder {
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.params.audience = audience.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.params.subject = subject.into();
        self
    }

    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.params.algorithm = algorithm.into();
        self
    }

    pub fn mode(mut self, mode: SigningMode) -> Self {
        self.params.mode = mode;
        self
    }

    pub fn ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.params.ttl_ms = ttl_ms;
        self
    }

    pub fn claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.claims.insert(key.into(), value);
        self
    }

    pub fn claims(mut self, claims: HashMap<String, serde_json::Value>) -> Self {
        self.params.claims.extend(claims);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.headers.insert(key.into(), value.into());
        self
    }

    /// Finish building. Validation happens when the token is signed.
    pub fn build(self) -> SignParams {
        self.params
    }
}
