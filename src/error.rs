use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key directory resolution failed: {0}")]
    ConfigResolution(String),

    #[error("Key load failed: {0}")]
    KeyLoad(String),

    #[error("Signer construction failed: {0}")]
    SignerConstruction(String),

    #[error("Invalid {field} provided")]
    InvalidParams { field: &'static str },

    #[error("Malformed token: {0}")]
    TokenFormat(String),

    #[error("Token signature invalid: {0}")]
    Signature(String),

    #[error("Missing expiration key in token claims")]
    MissingExpiry,

    #[error("Malformed expiration claim: {0}")]
    MalformedExpiry(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Unsupported signing mode: {0}")]
    UnsupportedMode(String),
}

impl TokenError {
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        TokenError::Config(msg.into())
    }

    #[must_use]
    pub fn resolution(msg: impl Into<String>) -> Self {
        TokenError::ConfigResolution(msg.into())
    }

    #[must_use]
    pub fn key_load(msg: impl Into<String>) -> Self {
        TokenError::KeyLoad(msg.into())
    }

    #[must_use]
    pub fn signer(msg: impl Into<String>) -> Self {
        TokenError::SignerConstruction(msg.into())
    }

    #[must_use]
    pub fn format(msg: impl Into<String>) -> Self {
        TokenError::TokenFormat(msg.into())
    }

    #[must_use]
    pub fn unsupported(mode: impl Into<String>) -> Self {
        TokenError::UnsupportedMode(mode.into())
    }

    /// Stable code for the error kind, used as a metric label and by the CLI.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Config(_) => TOKEN_CONFIG,
            TokenError::ConfigResolution(_) => TOKEN_CONFIG_RESOLUTION,
            TokenError::KeyLoad(_) => TOKEN_KEY_LOAD,
            TokenError::SignerConstruction(_) => TOKEN_SIGNER_CONSTRUCTION,
            TokenError::InvalidParams { .. } => TOKEN_INVALID_PARAMS,
            TokenError::TokenFormat(_) => TOKEN_FORMAT,
            TokenError::Signature(_) => TOKEN_SIGNATURE,
            TokenError::MissingExpiry => TOKEN_MISSING_EXPIRY,
            TokenError::MalformedExpiry(_) => TOKEN_MALFORMED_EXPIRY,
            TokenError::TokenExpired => TOKEN_EXPIRED,
            TokenError::UnsupportedMode(_) => TOKEN_UNSUPPORTED_MODE,
        }
    }
}

impl From<config::ConfigError> for TokenError {
    fn from(err: config::ConfigError) -> Self {
        TokenError::Config(err.to_string())
    }
}

pub const TOKEN_CONFIG: &str = "TOKEN_CONFIG";
pub const TOKEN_CONFIG_RESOLUTION: &str = "TOKEN_CONFIG_RESOLUTION";
pub const TOKEN_KEY_LOAD: &str = "TOKEN_KEY_LOAD";
pub const TOKEN_SIGNER_CONSTRUCTION: &str = "TOKEN_SIGNER_CONSTRUCTION";
pub const TOKEN_INVALID_PARAMS: &str = "TOKEN_INVALID_PARAMS";
pub const TOKEN_FORMAT: &str = "TOKEN_FORMAT";
pub const TOKEN_SIGNATURE: &str = "TOKEN_SIGNATURE";
pub const TOKEN_MISSING_EXPIRY: &str = "TOKEN_MISSING_EXPIRY";
pub const TOKEN_MALFORMED_EXPIRY: &str = "TOKEN_MALFORMED_EXPIRY";
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_UNSUPPORTED_MODE: &str = "TOKEN_UNSUPPORTED_MODE";
