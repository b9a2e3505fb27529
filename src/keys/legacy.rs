//! Legacy (RFC 1423) PEM encryption.
//!
//! Blocks written by `openssl rsa -des3` and friends carry a
//! `Proc-Type: 4,ENCRYPTED` header and a `DEK-Info: <cipher>,<hex iv>` header;
//! the latter alone marks a block as encrypted.
//! The key is derived from the passphrase with the OpenSSL MD5 scheme using the
//! first 8 IV bytes as salt. Only the empty passphrase is supported.

use crate::error::TokenError;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

/// Ciphers accepted in a `DEK-Info` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCipher {
    DesCbc,
    DesEde3Cbc,
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl LegacyCipher {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "DES-CBC" => Some(Self::DesCbc),
            "DES-EDE3-CBC" => Some(Self::DesEde3Cbc),
            "AES-128-CBC" => Some(Self::Aes128Cbc),
            "AES-192-CBC" => Some(Self::Aes192Cbc),
            "AES-256-CBC" => Some(Self::Aes256Cbc),
            _ => None,
        }
    }

    const fn key_size(self) -> usize {
        match self {
            Self::DesCbc => 8,
            Self::DesEde3Cbc => 24,
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }

    const fn block_size(self) -> usize {
        match self {
            Self::DesCbc | Self::DesEde3Cbc => 8,
            Self::Aes128Cbc | Self::Aes192Cbc | Self::Aes256Cbc => 16,
        }
    }
}

/// Parsed `DEK-Info` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DekInfo {
    pub cipher: LegacyCipher,
    pub iv: Vec<u8>,
}

impl DekInfo {
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let (name, iv_hex) = value
            .split_once(',')
            .ok_or_else(|| TokenError::key_load("malformed DEK-Info header"))?;

        let cipher = LegacyCipher::from_name(name.trim()).ok_or_else(|| {
            TokenError::key_load(format!("unknown PEM encryption type: {}", name.trim()))
        })?;

        let iv = hex::decode(iv_hex.trim())
            .map_err(|e| TokenError::key_load(format!("malformed DEK-Info IV: {}", e)))?;
        if iv.len() != cipher.block_size() {
            return Err(TokenError::key_load("DEK-Info IV has the wrong length"));
        }

        Ok(Self { cipher, iv })
    }
}

/// Whether the PEM headers mark the block as legacy-encrypted.
///
/// A `DEK-Info` header alone is enough; `Proc-Type` is not required.
pub fn is_encrypted(dek_info: Option<&str>) -> bool {
    dek_info.is_some()
}

/// Decrypt `data` with the given passphrase.
pub fn decrypt(
    info: &DekInfo,
    password: &[u8],
    data: &[u8],
) -> Result<Zeroizing<Vec<u8>>, TokenError> {
    let block_size = info.cipher.block_size();
    if data.is_empty() || data.len() % block_size != 0 {
        return Err(TokenError::key_load(
            "encrypted PEM data is not a multiple of the block size",
        ));
    }

    let key = derive_key(password, &info.iv[..8], info.cipher.key_size());
    let iv = info.iv.as_slice();

    let plain = match info.cipher {
        LegacyCipher::DesCbc => decrypt_cbc::<des::Des>(&key, iv, data),
        LegacyCipher::DesEde3Cbc => decrypt_cbc::<des::TdesEde3>(&key, iv, data),
        LegacyCipher::Aes128Cbc => decrypt_cbc::<aes::Aes128>(&key, iv, data),
        LegacyCipher::Aes192Cbc => decrypt_cbc::<aes::Aes192>(&key, iv, data),
        LegacyCipher::Aes256Cbc => decrypt_cbc::<aes::Aes256>(&key, iv, data),
    }?;

    Ok(Zeroizing::new(plain))
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
fn derive_key(password: &[u8], salt: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(len + 16));
    let mut digest: Vec<u8> = Vec::new();

    while out.len() < len {
        let mut hasher = Md5::new();
        hasher.update(&digest);
        hasher.update(password);
        hasher.update(salt);
        digest = hasher.finalize().to_vec();
        out.extend_from_slice(&digest);
    }

    out.truncate(len);
    out
}

fn decrypt_cbc<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, TokenError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| TokenError::key_load("invalid key or IV length for PEM cipher"))?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| TokenError::key_load("PEM decryption failed: incorrect password"))
}
