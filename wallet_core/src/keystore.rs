//! Argon2id encrypted keystore for wallet secrets.
//!
//! Encrypts arbitrary secret bytes with a user-chosen password:
//! 1. Argon2id derives a 32-byte encryption key from the password + random salt
//! 2. AES-256-GCM encrypts the secret with a random nonce
//! 3. The result is a JSON document with all parameters for future decryption,
//!    stored in the wallet's config row

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::WalletError;

const ARGON2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

const KEYSTORE_VERSION: u32 = 1;

/// The top-level keystore document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub crypto: KeystoreCrypto,
}

/// The crypto section of the keystore, containing all encryption parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// KDF parameters for Argon2id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MB memory, 3 iterations, 1 lane.
    fn default() -> Self {
        Self {
            memory: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Minimal cost, for tests and throwaway regtest wallets only.
    pub fn light() -> Self {
        Self {
            memory: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl KeystoreFile {
    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string(self).map_err(|e| WalletError::Keystore(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json)
            .map_err(|e| WalletError::Keystore(format!("invalid keystore JSON: {e}")))
    }
}

/// Encrypt `secret` with a password using Argon2id + AES-256-GCM.
pub fn encrypt_keystore(
    secret: &[u8],
    password: &str,
    params: KdfParams,
) -> Result<KeystoreFile, WalletError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(password, &salt, params)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| WalletError::Keystore(format!("AES key init failed: {e}")))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|e| WalletError::Keystore(format!("encryption failed: {e}")))?;

    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        crypto: KeystoreCrypto {
            cipher: "aes-256-gcm".to_string(),
            kdf: "argon2id".to_string(),
            kdf_params: params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Decrypt a keystore with the given password.
///
/// A wrong password surfaces as [`WalletError::InvalidPassword`].
pub fn decrypt_keystore(
    keystore: &KeystoreFile,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(WalletError::Keystore(format!(
            "unsupported keystore version: {}",
            keystore.version
        )));
    }

    let salt = hex::decode(&keystore.crypto.salt)
        .map_err(|e| WalletError::Keystore(format!("invalid salt hex: {e}")))?;
    let nonce_bytes = hex::decode(&keystore.crypto.nonce)
        .map_err(|e| WalletError::Keystore(format!("invalid nonce hex: {e}")))?;
    let ciphertext = hex::decode(&keystore.crypto.ciphertext)
        .map_err(|e| WalletError::Keystore(format!("invalid ciphertext hex: {e}")))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(WalletError::Keystore(format!(
            "invalid nonce length: expected {}, got {}",
            NONCE_LEN,
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(password, &salt, keystore.crypto.kdf_params)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| WalletError::Keystore(format!("AES key init failed: {e}")))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| WalletError::InvalidPassword)?;

    Ok(Zeroizing::new(plaintext))
}

/// Derive a 32-byte key from a password and salt using Argon2id.
fn derive_key(
    password: &str,
    salt: &[u8],
    kdf: KdfParams,
) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    let params = Params::new(
        kdf.memory,
        kdf.iterations,
        kdf.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| WalletError::Keystore(format!("Argon2 params error: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output[..])
        .map_err(|e| WalletError::Keystore(format!("Argon2 hashing failed: {e}")))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let secret = b"mnemonic words and seed bytes";
        let keystore = encrypt_keystore(secret, "test-password-123", KdfParams::light()).unwrap();
        let decrypted = decrypt_keystore(&keystore, "test-password-123").unwrap();
        assert_eq!(decrypted.as_slice(), secret);
    }

    #[test]
    fn wrong_password_is_invalid_password() {
        let keystore = encrypt_keystore(&[42u8; 32], "correct", KdfParams::light()).unwrap();
        let result = decrypt_keystore(&keystore, "wrong");
        assert!(matches!(result, Err(WalletError::InvalidPassword)));
    }

    #[test]
    fn keystore_crypto_fields() {
        let keystore = encrypt_keystore(&[0u8; 32], "pass", KdfParams::default()).unwrap();
        assert_eq!(keystore.version, 1);
        assert_eq!(keystore.crypto.cipher, "aes-256-gcm");
        assert_eq!(keystore.crypto.kdf, "argon2id");
        assert_eq!(keystore.crypto.kdf_params.memory, 65536);
        assert_eq!(keystore.crypto.kdf_params.iterations, 3);
        assert_eq!(keystore.crypto.kdf_params.parallelism, 1);
    }

    #[test]
    fn json_roundtrip_preserves_decryptability() {
        let keystore = encrypt_keystore(&[1u8; 16], "pass", KdfParams::light()).unwrap();
        let json = keystore.to_json().unwrap();
        assert!(json.contains("\"kdf\":\"argon2id\""));
        let loaded = KeystoreFile::from_json(&json).unwrap();
        assert_eq!(decrypt_keystore(&loaded, "pass").unwrap().as_slice(), &[1u8; 16]);
    }

    #[test]
    fn salts_differ_between_encryptions() {
        let ks1 = encrypt_keystore(&[7u8; 32], "password", KdfParams::light()).unwrap();
        let ks2 = encrypt_keystore(&[7u8; 32], "password", KdfParams::light()).unwrap();
        assert_ne!(ks1.crypto.salt, ks2.crypto.salt);
        assert_ne!(ks1.crypto.ciphertext, ks2.crypto.ciphertext);
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut keystore = encrypt_keystore(&[0u8; 32], "pass", KdfParams::light()).unwrap();
        keystore.version = 99;
        assert!(matches!(
            decrypt_keystore(&keystore, "pass"),
            Err(WalletError::Keystore(_))
        ));
    }
}
