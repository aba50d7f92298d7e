//! Payload encryption shared with the remote message source.
//!
//! Key: SHA-256 of the passphrase. Field format: base64 of a 16-byte IV
//! followed by the AES-256-CBC ciphertext (PKCS#7 padded).

use aes::Aes256;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{BconsError, Result};

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// An AES-256 key derived from a project passphrase.
#[derive(Clone)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self(key)
    }

    /// Decrypts one base64 field into UTF-8 plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BconsError::decryption(format!("invalid base64: {e}")))?;

        if data.len() < IV_LEN + BLOCK_LEN {
            return Err(BconsError::decryption("ciphertext too short"));
        }
        let (iv, ciphertext) = data.split_at(IV_LEN);

        let cipher = Aes256CbcDec::new_from_slices(&self.0, iv)
            .map_err(|e| BconsError::decryption(format!("cipher init: {e}")))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| BconsError::decryption("bad padding (wrong key?)"))?;

        String::from_utf8(plaintext)
            .map_err(|_| BconsError::decryption("plaintext is not valid UTF-8"))
    }

    /// Encrypts `plaintext` with a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(&self.0, &iv)
            .map_err(|e| BconsError::internal(format!("cipher init: {e}")))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Decrypts a single field with a passphrase.
pub fn decrypt_field(encoded: &str, passphrase: &str) -> Result<String> {
    DerivedKey::from_passphrase(passphrase).decrypt(encoded)
}

/// Encrypts a single field with a passphrase.
pub fn encrypt_field(plaintext: &str, passphrase: &str) -> Result<String> {
    DerivedKey::from_passphrase(passphrase).encrypt(plaintext)
}
