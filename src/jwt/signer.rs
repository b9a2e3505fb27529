//! Compact JWS signing with an RSA key.

use crate::error::TokenError;
use crate::jwt::serializer;
use jsonwebtoken::{Algorithm, EncodingKey};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

const RSA_ALGORITHMS: [(&str, Algorithm); 6] = [
    ("RS256", Algorithm::RS256),
    ("RS384", Algorithm::RS384),
    ("RS512", Algorithm::RS512),
    ("PS256", Algorithm::PS256),
    ("PS384", Algorithm::PS384),
    ("PS512", Algorithm::PS512),
];

/// Look up an RSA signature algorithm by its JWA name.
#[must_use]
pub fn rsa_algorithm(name: &str) -> Option<Algorithm> {
    RSA_ALGORITHMS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, alg)| *alg)
}

/// Signs claim sets with a fixed algorithm, key and protected header.
#[derive(Clone)]
pub struct Signer {
    algorithm: Algorithm,
    key: EncodingKey,
    header: Map<String, Value>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Build a signer for `algorithm` that stamps `content_type` as `typ` and
    /// every entry of `headers` into the protected header.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::SignerConstruction`] when the algorithm is not an
    /// RSA signature algorithm or a header would replace `alg`.
    pub fn new(
        key: EncodingKey,
        algorithm: &str,
        content_type: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self, TokenError> {
        let alg = rsa_algorithm(algorithm).ok_or_else(|| {
            if Algorithm::from_str(algorithm).is_ok() {
                TokenError::signer(format!(
                    "algorithm {} cannot be used with an RSA key",
                    algorithm
                ))
            } else {
                TokenError::signer(format!("unknown algorithm: {}", algorithm))
            }
        })?;

        let mut header = Map::new();
        header.insert("alg".to_string(), Value::String(algorithm.to_string()));
        header.insert("typ".to_string(), Value::String(content_type.to_string()));

        for (name, value) in headers {
            if name == "alg" {
                return Err(TokenError::signer("the alg header cannot be overridden"));
            }
            header.insert(name.clone(), Value::String(value.clone()));
        }

        Ok(Self {
            algorithm: alg,
            key,
            header,
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The protected header written into every token.
    #[must_use]
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// Serialize `claims` as a compact signed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized or signing fails.
    pub fn sign_claims(&self, claims: &Map<String, Value>) -> Result<String, TokenError> {
        let signing_input = format!(
            "{}.{}",
            serializer::encode_segment(&self.header)?,
            serializer::encode_segment(claims)?
        );

        let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), &self.key, self.algorithm)
            .map_err(|e| TokenError::signer(format!("signing failed: {}", e)))?;

        Ok(format!("{}.{}", signing_input, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_key() -> EncodingKey {
        EncodingKey::from_secret(b"unused-by-these-tests")
    }

    #[test]
    fn test_rsa_algorithm_lookup() {
        assert_eq!(rsa_algorithm("RS256"), Some(Algorithm::RS256));
        assert_eq!(rsa_algorithm("PS512"), Some(Algorithm::PS512));
        assert_eq!(rsa_algorithm("HS256"), None);
        assert_eq!(rsa_algorithm("rs256"), None);
    }

    #[test]
    fn test_header_contains_custom_entries() {
        let mut headers = HashMap::new();
        headers.insert("kid".to_string(), "key-1".to_string());

        let signer = Signer::new(dummy_key(), "RS256", "JWT", &headers).unwrap();

        assert_eq!(signer.header()["alg"], "RS256");
        assert_eq!(signer.header()["typ"], "JWT");
        assert_eq!(signer.header()["kid"], "key-1");
        assert_eq!(signer.algorithm(), Algorithm::RS256);
    }

    #[test]
    fn test_non_rsa_algorithm_rejected() {
        let err = Signer::new(dummy_key(), "HS256", "JWT", &HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, TokenError::SignerConstruction(_)));

        let err = Signer::new(dummy_key(), "NOPE", "JWT", &HashMap::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown algorithm"));
    }

    #[test]
    fn test_alg_header_cannot_be_replaced() {
        let mut headers = HashMap::new();
        headers.insert("alg".to_string(), "none".to_string());

        let err = Signer::new(dummy_key(), "RS256", "JWT", &headers).err().unwrap();
        assert!(matches!(err, TokenError::SignerConstruction(_)));
    }
}
