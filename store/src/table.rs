//! Table and index identifiers plus key encoding.
//!
//! Row keys are `table id ++ primary key`. Index keys are
//! `index id ++ value ++ primary key`, where `value` is self-delimiting
//! (fixed width, or length-prefixed for strings) so a prefix scan on
//! `index id ++ value` matches exactly that value.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    Config,
    BitcoinAddresses,
    DirectAddresses,
    Bounties,
    Hookins,
    Hookouts,
    Claims,
    Coins,
    Transfers,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Config,
        Table::BitcoinAddresses,
        Table::DirectAddresses,
        Table::Bounties,
        Table::Hookins,
        Table::Hookouts,
        Table::Claims,
        Table::Coins,
        Table::Transfers,
    ];

    pub fn id(&self) -> u8 {
        match self {
            Table::Config => 1,
            Table::BitcoinAddresses => 2,
            Table::DirectAddresses => 3,
            Table::Bounties => 4,
            Table::Hookins => 5,
            Table::Hookouts => 6,
            Table::Claims => 7,
            Table::Coins => 8,
            Table::Transfers => 9,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Config => "config",
            Table::BitcoinAddresses => "bitcoin_addresses",
            Table::DirectAddresses => "direct_addresses",
            Table::Bounties => "bounties",
            Table::Hookins => "hookins",
            Table::Hookouts => "hookouts",
            Table::Claims => "claims",
            Table::Coins => "coins",
            Table::Transfers => "transfers",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Index {
    /// Bitcoin address rows by address string.
    BitcoinAddressByAddress,
    /// Direct address rows by `(internal flag, derivation index)`.
    DirectAddressByLineage,
    BountyByClaimant,
    HookinByAddress,
    CoinByClaim,
    /// Transfers by every input coin hash they reference.
    TransferByCoin,
    TransferByHookout,
    TransferByStatus,
}

impl Index {
    pub fn id(&self) -> u8 {
        match self {
            Index::BitcoinAddressByAddress => 1,
            Index::DirectAddressByLineage => 2,
            Index::BountyByClaimant => 3,
            Index::HookinByAddress => 4,
            Index::CoinByClaim => 5,
            Index::TransferByCoin => 6,
            Index::TransferByHookout => 7,
            Index::TransferByStatus => 8,
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Index::BitcoinAddressByAddress => Table::BitcoinAddresses,
            Index::DirectAddressByLineage => Table::DirectAddresses,
            Index::BountyByClaimant => Table::Bounties,
            Index::HookinByAddress => Table::Hookins,
            Index::CoinByClaim => Table::Coins,
            Index::TransferByCoin | Index::TransferByHookout | Index::TransferByStatus => {
                Table::Transfers
            }
        }
    }
}

pub fn row_key(table: Table, primary_key: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + primary_key.len());
    key.push(table.id());
    key.extend_from_slice(primary_key);
    key
}

pub fn index_prefix(index: Index, value: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + value.len());
    key.push(index.id());
    key.extend_from_slice(value);
    key
}

pub fn index_key(index: Index, value: &[u8], primary_key: &[u8]) -> Vec<u8> {
    let mut key = index_prefix(index, value);
    key.extend_from_slice(primary_key);
    key
}

/// Length-prefixed string value for index keys.
pub fn str_value(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut value = Vec::with_capacity(2 + bytes.len());
    value.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    value.extend_from_slice(bytes);
    value
}

/// Big-endian so lexicographic order matches numeric order.
pub fn u32_value(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}
