//! Sealing of target passwords at rest.
//!
//! Sealed values are `base64(nonce (24 bytes) || ciphertext || tag (16 bytes))`
//! under XChaCha20-Poly1305 with a random nonce per value.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chacha20poly1305::{
  XChaCha20Poly1305,
  aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::{Error, Result};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;
const TAG_SIZE: usize = 16;

/// 256-bit key used to seal target passwords.
#[derive(Clone)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
  pub fn generate() -> Self {
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&XChaCha20Poly1305::generate_key(&mut OsRng));
    Self(key)
  }

  /// Decode a key from standard base64, as produced by [`Self::to_base64`].
  pub fn from_base64(encoded: &str) -> Result<Self> {
    let bytes = STANDARD
      .decode(encoded.trim())
      .map_err(|e| Error::Crypto(format!("invalid key encoding: {e}")))?;
    let key = <[u8; KEY_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
      Error::Crypto(format!("key must be {KEY_SIZE} bytes, got {}", bytes.len()))
    })?;
    Ok(Self(key))
  }

  pub fn to_base64(&self) -> String { STANDARD.encode(self.0) }
}

impl fmt::Debug for SecretKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SecretKey(..)")
  }
}

#[derive(Clone)]
pub(crate) struct Sealer {
  cipher: XChaCha20Poly1305,
}

impl Sealer {
  pub fn new(key: &SecretKey) -> Self {
    Self { cipher: XChaCha20Poly1305::new(&key.0.into()) }
  }

  pub fn seal(&self, plaintext: &str) -> Result<String> {
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = self
      .cipher
      .encrypt(&nonce, plaintext.as_bytes())
      .map_err(|_| Error::Crypto("encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(sealed))
  }

  pub fn open(&self, sealed: &str) -> Result<String> {
    let bytes = STANDARD
      .decode(sealed)
      .map_err(|e| Error::Crypto(format!("invalid sealed value: {e}")))?;
    if bytes.len() < NONCE_SIZE + TAG_SIZE {
      return Err(Error::Crypto("sealed value is too short".into()));
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
    let plaintext = self
      .cipher
      .decrypt(nonce.into(), ciphertext)
      .map_err(|_| Error::Crypto("decryption failed".into()))?;
    String::from_utf8(plaintext).map_err(|e| Error::Crypto(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seal_then_open() {
    let sealer = Sealer::new(&SecretKey::generate());
    let sealed = sealer.seal("hunter2").unwrap();
    assert!(!sealed.contains("hunter2"));
    assert_eq!(sealer.open(&sealed).unwrap(), "hunter2");
  }

  #[test]
  fn nonces_differ_per_value() {
    let sealer = Sealer::new(&SecretKey::generate());
    assert_ne!(sealer.seal("same").unwrap(), sealer.seal("same").unwrap());
  }

  #[test]
  fn wrong_key_fails() {
    let sealed = Sealer::new(&SecretKey::generate()).seal("x").unwrap();
    assert!(Sealer::new(&SecretKey::generate()).open(&sealed).is_err());
  }

  #[test]
  fn key_base64_round_trip_and_length_check() {
    let key = SecretKey::generate();
    let decoded = SecretKey::from_base64(&key.to_base64()).unwrap();
    assert_eq!(decoded.0, key.0);
    assert!(SecretKey::from_base64(&STANDARD.encode([0u8; 16])).is_err());
    assert!(SecretKey::from_base64("not base64!").is_err());
  }
}
