//! Triple-DES payload cipher keyed from the merchant secret key.
//!
//! The derived key is `first12(secret without "FLWSECK-") ++ hex(last6(md5(secret)))`,
//! 24 ASCII bytes used directly as a three-key 3DES key. The IV is the first
//! 8 bytes of that key, so equal plaintexts always produce equal ciphertexts.

use std::fmt;

use base64::Engine;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::Serialize;

use crate::config::WireEncoding;
use crate::constants::SECRET_KEY_PREFIX;
use crate::error::RaveError;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

/// 3DES block size in bytes.
const BLOCK_SIZE: usize = 8;

/// Number of secret key characters kept in the derived key.
const SECRET_PREFIX_LEN: usize = 12;

/// Number of trailing digest bytes kept in the derived key.
const DIGEST_SUFFIX_LEN: usize = 6;

/// 24-byte triple-length key derived from a secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; 24]);

impl CipherKey {
    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }

    fn iv(&self) -> &[u8] {
        &self.0[..BLOCK_SIZE]
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

/// Derive the 3DES key for a secret key. Pure: the same secret always yields
/// the same key.
pub fn derive_key(secret_key: &str) -> Result<CipherKey, RaveError> {
    let stripped = secret_key
        .strip_prefix(SECRET_KEY_PREFIX)
        .unwrap_or(secret_key);
    let head = stripped.as_bytes().get(..SECRET_PREFIX_LEN).ok_or_else(|| {
        RaveError::Crypto(format!(
            "secret key must have at least {SECRET_PREFIX_LEN} characters after its prefix"
        ))
    })?;

    let digest: [u8; 16] = md5::compute(secret_key.as_bytes()).0;
    let tail = hex::encode(&digest[digest.len() - DIGEST_SUFFIX_LEN..]);

    let mut key = [0u8; 24];
    key[..SECRET_PREFIX_LEN].copy_from_slice(head);
    key[SECRET_PREFIX_LEN..].copy_from_slice(tail.as_bytes());
    Ok(CipherKey(key))
}

/// Encrypts and decrypts transaction payloads with a fixed derived key.
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent charges.
#[derive(Debug, Clone)]
pub struct TransactionCipher {
    key: CipherKey,
    encoding: WireEncoding,
}

impl TransactionCipher {
    pub fn new(key: CipherKey, encoding: WireEncoding) -> Self {
        Self { key, encoding }
    }

    /// Derive the key from `secret_key` and build a cipher around it.
    pub fn from_secret_key(secret_key: &str, encoding: WireEncoding) -> Result<Self, RaveError> {
        Ok(Self::new(derive_key(secret_key)?, encoding))
    }

    pub fn key(&self) -> &CipherKey {
        &self.key
    }

    pub fn encoding(&self) -> WireEncoding {
        self.encoding
    }

    /// Encrypt `plaintext` and text-encode the result.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, RaveError> {
        let cipher = TdesCbcEnc::new_from_slices(self.key.as_bytes(), self.key.iv())
            .map_err(|e| RaveError::Crypto(format!("invalid key: {e}")))?;
        let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(match self.encoding {
            WireEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(encrypted),
            WireEncoding::Hex => hex::encode(encrypted),
        })
    }

    /// Serialize `value` as JSON and encrypt it.
    pub fn encrypt_json<T: Serialize>(&self, value: &T) -> Result<String, RaveError> {
        let json = serde_json::to_string(value)?;
        self.encrypt(&json)
    }

    /// Reverse of [`encrypt`](Self::encrypt). Inconsistent padding is an
    /// error, never truncated output.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, RaveError> {
        let raw = match self.encoding {
            WireEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(ciphertext.trim())
                .map_err(|e| RaveError::Crypto(format!("invalid base64 ciphertext: {e}")))?,
            WireEncoding::Hex => hex::decode(ciphertext.trim())
                .map_err(|e| RaveError::Crypto(format!("invalid hex ciphertext: {e}")))?,
        };
        if raw.is_empty() || raw.len() % BLOCK_SIZE != 0 {
            return Err(RaveError::Crypto(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
                raw.len()
            )));
        }

        let cipher = TdesCbcDec::new_from_slices(self.key.as_bytes(), self.key.iv())
            .map_err(|e| RaveError::Crypto(format!("invalid key: {e}")))?;
        let padded = cipher
            .decrypt_padded_vec_mut::<NoPadding>(&raw)
            .map_err(|_| RaveError::Crypto("block decryption failed".to_string()))?;
        let plain = pkcs5_unpad(padded)?;

        String::from_utf8(plain)
            .map_err(|_| RaveError::Crypto("decrypted payload is not valid UTF-8".to_string()))
    }
}

fn pkcs5_unpad(mut buf: Vec<u8>) -> Result<Vec<u8>, RaveError> {
    let len = buf.len();
    let pad = match buf.last() {
        Some(&b) => b as usize,
        None => return Err(RaveError::Crypto("unpadding error: empty buffer".to_string())),
    };
    if pad == 0 || pad > len || pad > BLOCK_SIZE {
        return Err(RaveError::Crypto(format!(
            "unpadding error: declared padding {pad} for {len} bytes"
        )));
    }
    if buf[len - pad..].iter().any(|&b| b as usize != pad) {
        return Err(RaveError::Crypto(
            "unpadding error: inconsistent padding bytes".to_string(),
        ));
    }
    buf.truncate(len - pad);
    Ok(buf)
}
