//! Mapping of row types onto tables, indices and topics.

use hookpay_messages::{Bounty, Hashable, Hookin, Hookout};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::feed::Topic;
use crate::rows::{
    BitcoinAddressRow, ClaimRecord, ConfigRow, DirectAddressRow, StoredCoin, TransferRecord,
};
use crate::table::{str_value, u32_value, Index, Table};

/// A type stored as rows of one table.
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: Table;

    fn primary_key(&self) -> Vec<u8>;

    /// `(index, value)` pairs to maintain for this row.
    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        Vec::new()
    }

    /// Secondary topics notified when this row is written, in addition to
    /// the table and row topics.
    fn topics(&self) -> Vec<Topic> {
        Vec::new()
    }
}

pub const CONFIG_KEY: &[u8] = b"config";

impl Record for ConfigRow {
    const TABLE: Table = Table::Config;

    fn primary_key(&self) -> Vec<u8> {
        CONFIG_KEY.to_vec()
    }
}

impl Record for BitcoinAddressRow {
    const TABLE: Table = Table::BitcoinAddresses;

    fn primary_key(&self) -> Vec<u8> {
        u32_value(self.index).to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        vec![(Index::BitcoinAddressByAddress, str_value(&self.address))]
    }
}

impl Record for DirectAddressRow {
    const TABLE: Table = Table::DirectAddresses;

    fn primary_key(&self) -> Vec<u8> {
        self.claimant.0.to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        let mut value = vec![self.internal as u8];
        value.extend_from_slice(&u32_value(self.index));
        vec![(Index::DirectAddressByLineage, value)]
    }
}

impl Record for Bounty {
    const TABLE: Table = Table::Bounties;

    fn primary_key(&self) -> Vec<u8> {
        self.hash().0.to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        vec![(Index::BountyByClaimant, self.claimant.0.to_vec())]
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::Claimant(self.claimant)]
    }
}

impl Record for Hookin {
    const TABLE: Table = Table::Hookins;

    fn primary_key(&self) -> Vec<u8> {
        self.hash().0.to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        vec![(Index::HookinByAddress, str_value(&self.bitcoin_address))]
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::BitcoinAddress(self.bitcoin_address.clone())]
    }
}

impl Record for Hookout {
    const TABLE: Table = Table::Hookouts;

    fn primary_key(&self) -> Vec<u8> {
        self.hash().0.to_vec()
    }
}

impl Record for ClaimRecord {
    const TABLE: Table = Table::Claims;

    /// Keyed by the hash of the thing claimed.
    fn primary_key(&self) -> Vec<u8> {
        self.contents.claim_request.claim_hash().0.to_vec()
    }
}

impl Record for StoredCoin {
    const TABLE: Table = Table::Coins;

    fn primary_key(&self) -> Vec<u8> {
        self.hash().0.to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        vec![(Index::CoinByClaim, self.claim_hash.0.to_vec())]
    }
}

impl Record for TransferRecord {
    const TABLE: Table = Table::Transfers;

    fn primary_key(&self) -> Vec<u8> {
        self.hash.0.to_vec()
    }

    fn index_entries(&self) -> Vec<(Index, Vec<u8>)> {
        let mut entries: Vec<(Index, Vec<u8>)> = self
            .input_hashes()
            .into_iter()
            .map(|h| (Index::TransferByCoin, h.0.to_vec()))
            .collect();
        if let Some(hookout) = &self.transfer.hookout {
            entries.push((Index::TransferByHookout, hookout.hash().0.to_vec()));
        }
        entries.push((Index::TransferByStatus, vec![self.status.code()]));
        entries
    }

    fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .input_hashes()
            .into_iter()
            .map(Topic::CoinInput)
            .collect();
        if let Some(hookout) = &self.transfer.hookout {
            topics.push(Topic::Hookout(hookout.hash()));
        }
        topics
    }
}
