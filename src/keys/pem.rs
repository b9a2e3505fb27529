//! PEM block decoding.

use crate::error::TokenError;
use crate::keys::legacy::{self, DekInfo};
use tracing::warn;
use zeroize::Zeroizing;

/// A decoded PEM block.
pub struct PemBlock {
    pub tag: String,
    pub contents: Zeroizing<Vec<u8>>,
    pub was_encrypted: bool,
}

/// Decode the first PEM block in `bytes`, decrypting it with the empty
/// passphrase when it carries legacy encryption headers.
pub fn decode_block(bytes: &[u8]) -> Result<PemBlock, TokenError> {
    let block = ::pem::parse(bytes)
        .map_err(|e| TokenError::key_load(format!("no PEM block found: {}", e)))?;

    let dek_info = block.headers().get("DEK-Info");

    if !legacy::is_encrypted(dek_info) {
        return Ok(PemBlock {
            tag: block.tag().to_string(),
            contents: Zeroizing::new(block.into_contents()),
            was_encrypted: false,
        });
    }

    warn!(
        tag = block.tag(),
        proc_type = block.headers().get("Proc-Type").unwrap_or_default(),
        "PEM block is encrypted"
    );

    let info = DekInfo::parse(dek_info.unwrap_or_default())?;
    let contents = legacy::decrypt(&info, b"", block.contents())?;

    Ok(PemBlock {
        tag: block.tag().to_string(),
        contents,
        was_encrypted: true,
    })
}
