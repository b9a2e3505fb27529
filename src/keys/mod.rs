//! RSA key material for signing and verifying tokens.
//!
//! [`KeyStore`] loads a PKCS1 private key and an X.509 certificate from the
//! configured directory on first use and caches them for its lifetime, or
//! generates an in-memory key pair up front when configured to.

pub mod certificate;
pub mod directory;
pub mod legacy;
pub mod pem;
pub mod thumbprint;

use crate::config::JwtConfig;
use crate::error::TokenError;
use crate::jwt::{Signer, SigningMode};
use crate::metrics;
use jsonwebtoken::{DecodingKey, EncodingKey};
use once_cell::sync::OnceCell;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Modulus size of generated key pairs.
pub const GENERATED_KEY_BITS: usize = 2048;

/// Loads, caches and hands out the RSA key pair.
///
/// Each key lives in its own slot. The first caller to reach an empty slot
/// loads it while concurrent callers wait; a failed load leaves the slot
/// empty so a later call tries again.
pub struct KeyStore {
    config: JwtConfig,
    private_key: OnceCell<Arc<RsaPrivateKey>>,
    public_key: OnceCell<Arc<RsaPublicKey>>,
    encoding_key: OnceCell<EncodingKey>,
    decoding_key: OnceCell<DecodingKey>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("keys_directory", &self.config.keys_directory)
            .field("private_key", &self.config.private_key)
            .field("public_key", &self.config.public_key)
            .field("generated", &self.config.generate_keys)
            .field("private_loaded", &self.private_key.get().is_some())
            .field("public_loaded", &self.public_key.get().is_some())
            .finish()
    }
}

impl KeyStore {
    /// Create a store for `config`.
    ///
    /// With `generate_keys` set, a fresh key pair is generated here and the
    /// configured directory and file names are never read.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyLoad`] if key generation fails.
    pub fn new(config: JwtConfig) -> Result<Self, TokenError> {
        if !config.generate_keys {
            return Ok(Self {
                config,
                private_key: OnceCell::new(),
                public_key: OnceCell::new(),
                encoding_key: OnceCell::new(),
                decoding_key: OnceCell::new(),
            });
        }

        let private_key = generate_key_pair()?;
        let public_key = private_key.to_public_key();

        info!(
            bits = GENERATED_KEY_BITS,
            thumbprint = %thumbprint::compute(&public_key),
            "generated ephemeral RSA key pair"
        );
        metrics::record_key_load("private", "generated", "success");
        metrics::record_key_load("public", "generated", "success");

        Ok(Self {
            config,
            private_key: OnceCell::with_value(Arc::new(private_key)),
            public_key: OnceCell::with_value(Arc::new(public_key)),
            encoding_key: OnceCell::new(),
            decoding_key: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Whether the keys were generated in memory.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.config.generate_keys
    }

    /// The signing key, loaded from `private_key` in the keys directory on
    /// first use.
    ///
    /// # Errors
    ///
    /// [`TokenError::ConfigResolution`] if the directory cannot be resolved,
    /// [`TokenError::KeyLoad`] if the file cannot be read, decoded or parsed.
    pub fn private_key(&self) -> Result<Arc<RsaPrivateKey>, TokenError> {
        if let Some(key) = self.private_key.get() {
            metrics::record_key_load("private", "cache", "success");
            return Ok(Arc::clone(key));
        }

        self.private_key
            .get_or_try_init(|| self.load_private_key().map(Arc::new))
            .map(Arc::clone)
            .inspect_err(|_| metrics::record_key_load("private", "file", "failure"))
    }

    /// The certificate's public key, loaded from `public_key` in the keys
    /// directory on first use.
    ///
    /// # Errors
    ///
    /// [`TokenError::ConfigResolution`] if the directory cannot be resolved,
    /// [`TokenError::KeyLoad`] if the file cannot be read or is not an X.509
    /// certificate holding an RSA key.
    pub fn public_key(&self) -> Result<Arc<RsaPublicKey>, TokenError> {
        if let Some(key) = self.public_key.get() {
            metrics::record_key_load("public", "cache", "success");
            return Ok(Arc::clone(key));
        }

        self.public_key
            .get_or_try_init(|| self.load_public_key().map(Arc::new))
            .map(Arc::clone)
            .inspect_err(|_| metrics::record_key_load("public", "file", "failure"))
    }

    /// Public half of the signing key, used to verify tokens.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyStore::private_key`] errors.
    pub fn verification_key(&self) -> Result<RsaPublicKey, TokenError> {
        Ok(self.private_key()?.to_public_key())
    }

    /// Fails unless the certificate carries the public half of the private key.
    ///
    /// # Errors
    ///
    /// Returns load errors for either key, or [`TokenError::KeyLoad`] on a
    /// mismatch.
    pub fn verify_key_pair(&self) -> Result<(), TokenError> {
        let derived = self.verification_key()?;
        let certified = self.public_key()?;

        if derived != *certified {
            return Err(TokenError::key_load(format!(
                "certificate key {} does not match private key {}",
                thumbprint::compute(&certified),
                thumbprint::compute(&derived)
            )));
        }
        Ok(())
    }

    /// RFC 7638 thumbprint of the verification key.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyStore::private_key`] errors.
    pub fn thumbprint(&self) -> Result<String, TokenError> {
        Ok(thumbprint::compute(&self.verification_key()?))
    }

    /// A signer for `algorithm` tagged with the mode's content type and
    /// carrying `headers` in the protected header.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnsupportedMode`] for encryption, the
    /// [`KeyStore::private_key`] errors, or [`TokenError::SignerConstruction`]
    /// when the algorithm and key cannot be combined.
    pub fn signer(
        &self,
        headers: &HashMap<String, String>,
        algorithm: &str,
        mode: SigningMode,
    ) -> Result<Signer, TokenError> {
        let content_type = mode.content_type()?;
        let key = self.encoding_key()?;
        Signer::new(key, algorithm, content_type, headers)
    }

    pub(crate) fn decoding_key(&self) -> Result<&DecodingKey, TokenError> {
        self.decoding_key
            .get_or_try_init(|| -> Result<DecodingKey, TokenError> {
                let (n, e) = thumbprint::jwk_components(&self.verification_key()?);
                DecodingKey::from_rsa_components(&n, &e)
                    .map_err(|e| TokenError::Signature(format!("unusable verification key: {}", e)))
            })
    }

    fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        self.encoding_key
            .get_or_try_init(|| -> Result<EncodingKey, TokenError> {
                let private_key = self.private_key()?;
                let der = private_key
                    .to_pkcs1_der()
                    .map_err(|e| TokenError::signer(format!("failed to encode private key: {}", e)))?;
                Ok(EncodingKey::from_rsa_der(der.as_bytes()))
            })
            .cloned()
    }

    fn load_private_key(&self) -> Result<RsaPrivateKey, TokenError> {
        let path = self.key_path(&self.config.private_key)?;
        let bytes = read_key_file(&path)?;
        let block = pem::decode_block(&bytes)?;
        debug!(tag = %block.tag, encrypted = block.was_encrypted, "decoded private key block");

        let key = RsaPrivateKey::from_pkcs1_der(&block.contents)
            .map_err(|e| TokenError::key_load(format!("invalid PKCS1 private key: {}", e)))?;

        info!(
            path = %path.display(),
            bits = key.n().bits(),
            thumbprint = %thumbprint::compute(&key.to_public_key()),
            "loaded RSA private key"
        );
        metrics::record_key_load("private", "file", "success");
        Ok(key)
    }

    fn load_public_key(&self) -> Result<RsaPublicKey, TokenError> {
        let path = self.key_path(&self.config.public_key)?;
        let bytes = read_key_file(&path)?;
        let block = pem::decode_block(&bytes)?;
        debug!(tag = %block.tag, encrypted = block.was_encrypted, "decoded certificate block");

        let key = certificate::rsa_public_key(&block.contents)?;

        info!(
            path = %path.display(),
            bits = key.n().bits(),
            thumbprint = %thumbprint::compute(&key),
            "loaded RSA public key from certificate"
        );
        metrics::record_key_load("public", "file", "success");
        Ok(key)
    }

    fn key_path(&self, file_name: &str) -> Result<PathBuf, TokenError> {
        let dir = directory::resolve(
            &self.config.keys_directory,
            self.config.install_root.as_deref(),
        )?;
        Ok(dir.join(file_name))
    }
}

fn read_key_file(path: &std::path::Path) -> Result<Zeroizing<Vec<u8>>, TokenError> {
    std::fs::read(path)
        .map(Zeroizing::new)
        .map_err(|e| TokenError::key_load(format!("failed to read {}: {}", path.display(), e)))
}

fn generate_key_pair() -> Result<RsaPrivateKey, TokenError> {
    let mut rng = rand::rngs::OsRng;
    RsaPrivateKey::new(&mut rng, GENERATED_KEY_BITS)
        .map_err(|e| TokenError::key_load(format!("failed to generate RSA key: {}", e)))
}
