//! Bitcoin network selector.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypesError;

/// Which bitcoin network deposit and payout addresses belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }
}

impl FromStr for Network {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "regtest" | "dev" => Ok(Self::Regtest),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::Testnet
    }
}
