use crate::error::TokenError;
use std::fmt;
use std::str::FromStr;

/// How a token payload is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SigningMode {
    /// Compact JWS, content type `JWT`
    #[default]
    Signature,
    /// Compact JWE. Declared for completeness; every operation rejects it.
    Encryption,
}

impl SigningMode {
    /// Content-type tag placed in the token header.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnsupportedMode`] for [`SigningMode::Encryption`].
    pub fn content_type(self) -> Result<&'static str, TokenError> {
        match self {
            Self::Signature => Ok("JWT"),
            Self::Encryption => Err(TokenError::unsupported(
                "JWE: encrypted tokens are not implemented",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signature => "JWT",
            Self::Encryption => "JWE",
        }
    }
}

impl FromStr for SigningMode {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JWT" => Ok(Self::Signature),
            "JWE" => Ok(Self::Encryption),
            _ => Err(TokenError::unsupported(format!("invalid mode: {}", s))),
        }
    }
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
