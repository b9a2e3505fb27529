//! JWT signer library.
//!
//! Loads an RSA key pair from PEM files (or generates one in memory), signs
//! compact JWTs with caller-supplied claims and headers, and parses them back
//! with signature and expiry checks.

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod telemetry;

// Re-exports for convenience
pub use config::{Config, JwtConfig};
pub use engine::{ParsedClaims, TokenEngine};
pub use error::TokenError;
pub use jwt::{SignParams, Signer, SigningMode};
pub use keys::KeyStore;
