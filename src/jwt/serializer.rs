use crate::error::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{Map, Value};

/// Base64url-encode a JSON object as a token segment.
pub fn encode_segment(value: &Map<String, Value>) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| TokenError::signer(format!("failed to serialize token segment: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// A structurally valid compact token whose signature has not been checked.
#[derive(Debug)]
pub struct CompactToken<'a> {
    header: Map<String, Value>,
    payload: Vec<u8>,
    signing_input: &'a str,
    signature: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Split and decode `header.payload.signature`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenFormat`] when the token does not have three
    /// base64url segments or the header is not a JSON object naming `alg`.
    pub fn parse(token: &'a str) -> Result<Self, TokenError> {
        let token = token.trim();
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::format(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|e| TokenError::format(format!("invalid header encoding: {}", e)))?;
        let header: Map<String, Value> = serde_json::from_slice(&header_bytes)
            .map_err(|e| TokenError::format(format!("invalid header: {}", e)))?;
        if !header.get("alg").is_some_and(Value::is_string) {
            return Err(TokenError::format("header is missing alg"));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| TokenError::format(format!("invalid payload encoding: {}", e)))?;

        URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|e| TokenError::format(format!("invalid signature encoding: {}", e)))?;

        let signing_input = &token[..parts[0].len() + 1 + parts[1].len()];

        Ok(CompactToken {
            header,
            payload,
            signing_input,
            signature: parts[2],
        })
    }

    #[must_use]
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// The `alg` header value.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        self.header
            .get("alg")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The bytes covered by the signature: `header.payload`.
    #[must_use]
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    #[must_use]
    pub fn signature(&self) -> &'a str {
        self.signature
    }

    /// Decode the payload as a claim map.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenFormat`] if the payload is not a JSON object.
    pub fn claims(&self) -> Result<Map<String, Value>, TokenError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| TokenError::format(format!("invalid claims: {}", e)))
    }
}
