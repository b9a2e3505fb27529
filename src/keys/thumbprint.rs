//! JWK Thumbprint calculation per RFC 7638.
//!
//! Identifies loaded key material in logs without printing the key itself.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};

/// Base64url modulus and exponent of an RSA public key, as used in a JWK.
pub fn jwk_components(key: &RsaPublicKey) -> (String, String) {
    (
        URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
        URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
    )
}

/// Computes the SHA-256 thumbprint of an RSA public key.
///
/// Members are `e`, `kty`, `n` in lexicographic order with no whitespace.
#[must_use]
pub fn compute(key: &RsaPublicKey) -> String {
    let (n, e) = jwk_components(key);
    let canonical = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, e, n);
    let hash = Sha256::digest(canonical.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use rsa::BigUint;

    #[test]
    fn test_rfc7638_example() {
        // Key from RFC 7638 section 3.1
        let n = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";
        let e = "AQAB";
        let key = RsaPublicKey::new(
            BigUint::from_bytes_be(&URL_SAFE_NO_PAD.decode(n).unwrap()),
            BigUint::from_bytes_be(&URL_SAFE_NO_PAD.decode(e).unwrap()),
        )
        .unwrap();

        assert_eq!(compute(&key), "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs");
    }
}
