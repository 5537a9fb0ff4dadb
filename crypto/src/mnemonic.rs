//! BIP39 mnemonic generation and seed derivation.
//!
//! Wallets use 24-word mnemonics (256-bit entropy). The 64-byte BIP39 seed is
//! the root of every key the wallet derives.

use bip39::Mnemonic;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors arising from mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("mnemonic generation failed: {0}")]
    GenerationFailed(String),
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy(&entropy[..])
        .map_err(|e| MnemonicError::GenerationFailed(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Validate a mnemonic and derive its 64-byte BIP39 seed
/// (PBKDF2-HMAC-SHA512, 2048 rounds).
pub fn seed_from_mnemonic(
    mnemonic: &str,
    passphrase: &str,
) -> Result<Zeroizing<[u8; 64]>, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(mnemonic)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed_normalized(passphrase)))
}

/// Validate that a mnemonic phrase is a valid BIP39 mnemonic.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_normalized(mnemonic).is_ok()
}
