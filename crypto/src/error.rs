use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("bytes are not a valid ristretto point")]
    InvalidPoint,

    #[error("bytes are not a canonical scalar")]
    InvalidScalar,

    #[error("cannot aggregate an empty key set")]
    EmptyKeySet,

    #[error("invalid bitcoin key: {0}")]
    InvalidBitcoinKey(String),
}
