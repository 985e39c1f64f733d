//! Encryption for the persisted session record.
//!
//! AES-256-GCM with a random 96-bit nonce prepended to the ciphertext, the
//! whole thing base64 encoded. The key is generated once per machine and kept
//! in the OS keyring.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::info;

use super::{Result, SessionError};

/// The keyring service name for DigiWorkHub secrets.
const KEYRING_SERVICE: &str = "digiworkhub";

/// The keyring user under which the session key is stored.
const KEYRING_KEY_USER: &str = "session-key";

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypts and decrypts the session record.
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Create a cipher from raw key bytes.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        Self { cipher }
    }

    /// Create a cipher with a freshly generated random key.
    pub fn generate() -> Self {
        Self::from_key(rand::random())
    }

    /// Load the session key from the OS keyring, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring is unavailable or holds a malformed key.
    pub fn from_keyring() -> Result<Self> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY_USER)
            .map_err(|e| SessionError::Keyring(format!("failed to access keyring: {}", e)))?;

        match entry.get_password() {
            Ok(encoded) => {
                let bytes = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| SessionError::Keyring(format!("stored key is not base64: {}", e)))?;
                let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
                    SessionError::Keyring("stored key has the wrong length".to_string())
                })?;
                Ok(Self::from_key(key))
            }
            Err(keyring::Error::NoEntry) => {
                let key: [u8; KEY_LEN] = rand::random();
                entry
                    .set_password(&BASE64.encode(key))
                    .map_err(|e| SessionError::Keyring(format!("failed to store key: {}", e)))?;
                info!("Generated new session encryption key");
                Ok(Self::from_key(key))
            }
            Err(e) => Err(SessionError::Keyring(format!("failed to retrieve key: {}", e))),
        }
    }

    /// Encrypt `plaintext`, returning base64 text.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| SessionError::Crypto(format!("encryption failed: {}", e)))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt base64 text produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>> {
        let data = BASE64
            .decode(encoded.trim())
            .map_err(|e| SessionError::Crypto(format!("invalid base64: {}", e)))?;
        if data.len() < NONCE_LEN {
            return Err(SessionError::Crypto("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| SessionError::Crypto(format!("decryption failed: {}", e)))
    }
}

impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCipher { .. }")
    }
}
