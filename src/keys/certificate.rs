use crate::error::TokenError;
use rsa::{BigUint, RsaPublicKey};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Extract the RSA public key embedded in a DER-encoded X.509 certificate.
pub fn rsa_public_key(cert_der: &[u8]) -> Result<RsaPublicKey, TokenError> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| TokenError::key_load(format!("Failed to parse certificate: {}", e)))?;

    let parsed = cert
        .public_key()
        .parsed()
        .map_err(|e| TokenError::key_load(format!("Failed to parse certificate key: {}", e)))?;

    match parsed {
        PublicKey::RSA(rsa_key) => {
            let n = BigUint::from_bytes_be(rsa_key.modulus);
            let e = BigUint::from_bytes_be(rsa_key.exponent);
            RsaPublicKey::new(n, e)
                .map_err(|e| TokenError::key_load(format!("Invalid RSA public key: {}", e)))
        }
        _ => Err(TokenError::key_load(
            "unable to parse certificate into a public key: key is not RSA",
        )),
    }
}
