//! Bitcoin deposit addresses.
//!
//! A deposit address is a P2WSH output whose witness script commits to the
//! claimant key and is spendable only by the custodian's funding key:
//!
//! ```text
//! <H(claimant)> OP_DROP <funding_key> OP_CHECKSIG
//! ```
//!
//! The custodian recomputes the address from a claimant key when a hookin is
//! claimed, which is how a deposit is tied to its claimant.

use std::str::FromStr;

use bitcoin::blockdata::opcodes::all::{OP_CHECKSIG, OP_DROP};
use bitcoin::blockdata::script::Builder;
use bitcoin::Address;
use hookpay_types::{Network, PublicKey};

use crate::error::CryptoError;
use crate::hash::hash_labeled;

fn bitcoin_network(network: Network) -> bitcoin::Network {
    match network {
        Network::Mainnet => bitcoin::Network::Bitcoin,
        Network::Testnet => bitcoin::Network::Testnet,
        Network::Regtest => bitcoin::Network::Regtest,
    }
}

/// Compute the deposit address for `claimant`.
///
/// `funding_key` is the custodian's compressed secp256k1 key in hex.
pub fn deposit_address(
    claimant: &PublicKey,
    funding_key: &str,
    network: Network,
) -> Result<String, CryptoError> {
    let funding = bitcoin::PublicKey::from_str(funding_key)
        .map_err(|e| CryptoError::InvalidBitcoinKey(e.to_string()))?;
    let commitment = hash_labeled("hookpay/deposit", &[claimant.as_bytes()]);

    let script = Builder::new()
        .push_slice(commitment.0)
        .push_opcode(OP_DROP)
        .push_key(&funding)
        .push_opcode(OP_CHECKSIG)
        .into_script();

    Ok(Address::p2wsh(&script, bitcoin_network(network)).to_string())
}

/// Whether `address` parses as a bitcoin address valid on `network`.
pub fn validate_bitcoin_address(address: &str, network: Network) -> bool {
    Address::from_str(address)
        .map(|a| a.is_valid_for_network(bitcoin_network(network)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compressed generator point of secp256k1.
    const FUNDING: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn deposit_address_is_deterministic() {
        let claimant = PublicKey([5u8; 32]);
        let a = deposit_address(&claimant, FUNDING, Network::Testnet).unwrap();
        let b = deposit_address(&claimant, FUNDING, Network::Testnet).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("tb1q"));
        assert!(validate_bitcoin_address(&a, Network::Testnet));
    }

    #[test]
    fn claimants_get_distinct_addresses() {
        let a = deposit_address(&PublicKey([1u8; 32]), FUNDING, Network::Regtest).unwrap();
        let b = deposit_address(&PublicKey([2u8; 32]), FUNDING, Network::Regtest).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("bcrt1q"));
    }

    #[test]
    fn mainnet_address_not_valid_on_testnet() {
        let a = deposit_address(&PublicKey([1u8; 32]), FUNDING, Network::Mainnet).unwrap();
        assert!(a.starts_with("bc1q"));
        assert!(!validate_bitcoin_address(&a, Network::Testnet));
    }

    #[test]
    fn garbage_rejected() {
        assert!(!validate_bitcoin_address("not-an-address", Network::Mainnet));
        assert!(deposit_address(&PublicKey([1u8; 32]), "zz", Network::Mainnet).is_err());
    }
}
