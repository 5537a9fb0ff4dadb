use hookpay_crypto::{CryptoError, MnemonicError};
use hookpay_messages::SettlementError;
use hookpay_store::{StoreError, TransferStatus};
use hookpay_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is locked")]
    Locked,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("wallet is already initialized")]
    AlreadyInitialized,

    #[error("wallet is not initialized")]
    NotInitialized,

    #[error("invalid password")]
    InvalidPassword,

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    #[error("claim verification failed: {0}")]
    ClaimVerification(String),

    #[error("transfer {hash} is {status}, expected pending")]
    InvalidTransferState { hash: Hash, status: TransferStatus },

    #[error("unknown transfer {0}")]
    TransferNotFound(Hash),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("local invariant violated: {0}")]
    Invariant(String),

    #[error("claimant key is not derived by this wallet")]
    UnknownClaimant,

    #[error("invalid bitcoin address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<MnemonicError> for WalletError {
    fn from(e: MnemonicError) -> Self {
        match e {
            MnemonicError::InvalidMnemonic(msg) => WalletError::InvalidMnemonic(msg),
            MnemonicError::GenerationFailed(msg) => WalletError::Keystore(msg),
        }
    }
}
