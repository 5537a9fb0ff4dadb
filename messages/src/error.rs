use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured error reported by the settlement custodian.
///
/// `status` is HTTP-like; `code` is the machine-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("settlement error {status} {code}: {message}")]
pub struct SettlementError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl SettlementError {
    pub const INPUT_SPENT: &'static str = "INPUT_SPENT";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const TRANSPORT: &'static str = "TRANSPORT";

    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn input_spent(message: impl Into<String>) -> Self {
        Self::new(409, Self::INPUT_SPENT, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, Self::NOT_FOUND, message)
    }

    /// The request never produced a response (connect failure, timeout).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, Self::TRANSPORT, message)
    }

    pub fn is_input_spent(&self) -> bool {
        self.code == Self::INPUT_SPENT
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}
