//! Outgoing transfers: build, finalize, reconcile, discard.
//!
//! ```text
//! PENDING ──submit ok──────────▶ ACKNOWLEDGED
//!    │
//!    ├──INPUT_SPENT / discard──▶ CONFLICTED
//! ```
//!
//! A transfer is stored as pending before it is submitted, so a crash
//! between the two leaves something to finalize or discard later. Once the
//! custodian reports `INPUT_SPENT` the transfer is conflicted, even if
//! fetching the winning transfer fails; sync picks that up later.

use std::collections::HashSet;

use futures_util::future::join_all;
use hookpay_crypto::{aggregate_sign, public_from_private, validate_bitcoin_address, verify_ack};
use hookpay_messages::{Bounty, Hashable, Hookout, Transfer};
use hookpay_store::{DirectAddressRow, ReadOps, TransferRecord, TransferStatus};
use hookpay_types::{Hash, PublicKey, MAX_MONEY};
use tracing::{debug, info, warn};

use crate::balance::unspent_coins;
use crate::discovery::SyncReport;
use crate::engine::{append_direct_address, Engine};
use crate::error::WalletError;
use crate::selector::select_coins;

/// Weight units of the on-chain output a hookout adds.
pub const HOOKOUT_WEIGHT: u64 = 172;

/// Fee for an immediate hookout at `fee_rate` sat/vbyte.
pub fn hookout_fee(fee_rate: u64) -> u64 {
    (fee_rate.saturating_mul(HOOKOUT_WEIGHT)).div_ceil(4)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Off-chain, as a bounty to a claimant key.
    Direct(PublicKey),
    /// On-chain, as a hookout. A zero `fee_rate` queues a free batched
    /// payout.
    Bitcoin { address: String, fee_rate: u64 },
}

impl Engine {
    /// Select coins, assemble and sign a transfer, and store it as pending.
    pub(crate) fn build_transfer(
        &self,
        destination: Destination,
        amount: u64,
    ) -> Result<TransferRecord, WalletError> {
        let keys = self.keys()?;
        let config = self.config()?;
        if amount == 0 || amount > MAX_MONEY {
            return Err(WalletError::InvalidAmount(amount));
        }
        let fee = match &destination {
            Destination::Direct(_) => config.custodian.fees.direct,
            Destination::Bitcoin { address, fee_rate } => {
                if !validate_bitcoin_address(address, config.custodian.network) {
                    return Err(WalletError::InvalidAddress(address.clone()));
                }
                hookout_fee(*fee_rate)
            }
        };
        let target = amount
            .checked_add(fee)
            .ok_or(WalletError::InvalidAmount(amount))?;

        self.store.transact(|txn| -> Result<TransferRecord, WalletError> {
            let unspent = unspent_coins(&*txn)?;
            let selection = select_coins(&unspent, target)?;

            let mut outputs = Vec::new();
            let hookout = match destination {
                Destination::Direct(claimant) => {
                    outputs.push(Bounty::new(amount, claimant));
                    None
                }
                Destination::Bitcoin { address, fee_rate } => {
                    Some(Hookout::new(amount, address, fee_rate > 0))
                }
            };
            if selection.excess > 0 {
                let change = append_direct_address(txn, &config, true)?;
                outputs.push(Bounty::new(selection.excess, change.claimant));
            }

            let mut inputs: Vec<_> = selection.coins.iter().map(|c| c.claimed()).collect();
            Transfer::sort_canonical(&mut inputs, &mut outputs);
            let commitment = Transfer::commitment(&inputs, &outputs, hookout.as_ref());

            let mut owner_keys = Vec::with_capacity(selection.coins.len());
            for coin in &selection.coins {
                let key = keys.derive_owner(&coin.claim_hash, &coin.blinding_nonce);
                if public_from_private(&key) != coin.owner {
                    return Err(WalletError::Invariant(format!(
                        "re-derived owner key does not match coin {}",
                        coin.hash()
                    )));
                }
                owner_keys.push(key);
            }
            let key_refs: Vec<_> = owner_keys.iter().collect();
            let authorization = aggregate_sign(commitment.as_bytes(), &key_refs)?;

            let transfer = Transfer {
                inputs,
                outputs,
                hookout,
                authorization,
            };
            if !transfer.verify_authorization() {
                return Err(WalletError::Invariant(
                    "aggregate authorization does not verify".into(),
                ));
            }

            for bounty in &transfer.outputs {
                txn.insert_if_absent(bounty)?;
            }
            if let Some(hookout) = &transfer.hookout {
                txn.put(hookout)?;
            }
            let record = TransferRecord::new(transfer, TransferStatus::Pending);
            if record.hash != commitment {
                return Err(WalletError::Invariant(format!(
                    "transfer hash {} differs from its commitment {commitment}",
                    record.hash
                )));
            }
            txn.put(&record)?;
            debug!(
                transfer = %record.hash,
                amount,
                fee,
                inputs = record.transfer.inputs.len(),
                change = selection.excess,
                "built transfer"
            );
            Ok(record)
        })
    }

    fn pending_transfer(&self, hash: Hash) -> Result<TransferRecord, WalletError> {
        let record = self
            .store
            .get::<TransferRecord>(&hash.0)?
            .ok_or(WalletError::TransferNotFound(hash))?;
        if !record.status.is_pending() {
            return Err(WalletError::InvalidTransferState {
                hash,
                status: record.status,
            });
        }
        Ok(record)
    }

    fn advance(&self, hash: Hash, status: TransferStatus) -> Result<TransferRecord, WalletError> {
        self.store.transact(|txn| -> Result<TransferRecord, WalletError> {
            let mut record = txn
                .get::<TransferRecord>(&hash.0)?
                .ok_or(WalletError::TransferNotFound(hash))?;
            if !record.status.is_pending() {
                return Err(WalletError::InvalidTransferState {
                    hash,
                    status: record.status,
                });
            }
            record.status = status;
            txn.put(&record)?;
            Ok(record)
        })
    }

    /// Submit a pending transfer.
    ///
    /// On success the transfer becomes acknowledged and its outputs to local
    /// claimants are queued for self-claiming. On `INPUT_SPENT` the
    /// conflicting transfers are fetched, the transfer becomes conflicted and
    /// the error is returned. Any other error leaves it pending.
    pub(crate) async fn finalize_transfer(
        &self,
        hash: Hash,
    ) -> Result<TransferRecord, WalletError> {
        let record = self.pending_transfer(hash)?;
        let recomputed = record.transfer.hash();
        if recomputed != record.hash {
            return Err(WalletError::Invariant(format!(
                "stored transfer {hash} recomputes to {recomputed}"
            )));
        }
        let config = self.config()?;

        match self.api.submit_transfer(&record.transfer).await {
            Ok(ack) => {
                if !verify_ack(&config.custodian.ack_key, &hash, &ack) {
                    return Err(WalletError::Invariant(format!(
                        "acknowledgement for transfer {hash} does not verify"
                    )));
                }
                let record = self.advance(hash, TransferStatus::Acknowledged(ack))?;
                info!(transfer = %hash, "transfer acknowledged");
                for bounty in &record.transfer.outputs {
                    if self.store.contains::<DirectAddressRow>(&bounty.claimant.0)? {
                        self.self_claims.enqueue(bounty.clone());
                    }
                }
                Ok(record)
            }
            Err(e) if e.is_input_spent() => {
                warn!(transfer = %hash, error = %e, "transfer inputs already spent, reconciling");
                self.advance(hash, TransferStatus::Conflicted)?;
                match self.reconcile_conflict(&record).await {
                    Ok(()) => {}
                    Err(invariant @ WalletError::Invariant(_)) => return Err(invariant),
                    Err(other) => warn!(
                        transfer = %hash,
                        error = %other,
                        "could not fetch the conflicting transfer, sync will retry"
                    ),
                }
                Err(WalletError::Settlement(e))
            }
            Err(e) => {
                warn!(transfer = %hash, error = %e, "transfer submission failed, left pending");
                Err(e.into())
            }
        }
    }

    /// Store the transfers that actually spent `record`'s inputs.
    async fn reconcile_conflict(&self, record: &TransferRecord) -> Result<(), WalletError> {
        let mut seen = HashSet::new();
        for input in &record.transfer.inputs {
            let Some(spender) = self.api.lookup_coin(&input.owner).await? else {
                continue;
            };
            if spender == record.hash || !seen.insert(spender) {
                continue;
            }
            if self.adopt_spender(spender).await? {
                info!(transfer = %spender, conflicting_with = %record.hash, "stored conflicting transfer");
            }
        }
        Ok(())
    }

    /// Ask the custodian which unspent coins are already spent and store
    /// the spending transfers. Lookup failures are logged and retried on
    /// the next sync.
    pub(crate) async fn refresh_spent(&self, report: &mut SyncReport) -> Result<(), WalletError> {
        let unspent = unspent_coins(self.store.as_ref())?;
        let api = self.api.as_ref();
        let lookups = join_all(unspent.iter().map(|coin| api.lookup_coin(&coin.owner))).await;

        let mut seen = HashSet::new();
        for (coin, lookup) in unspent.iter().zip(lookups) {
            let spender = match lookup {
                Ok(Some(spender)) => spender,
                Ok(None) => continue,
                Err(e) => {
                    warn!(coin = %coin.hash(), error = %e, "coin lookup failed");
                    continue;
                }
            };
            if !seen.insert(spender) {
                continue;
            }
            match self.adopt_spender(spender).await {
                Ok(true) => {
                    info!(transfer = %spender, coin = %coin.hash(), "learned transfer spending a local coin");
                    report.new_transfers += 1;
                }
                Ok(false) => {}
                Err(invariant @ WalletError::Invariant(_)) => return Err(invariant),
                Err(e) => warn!(transfer = %spender, error = %e, "could not fetch spending transfer"),
            }
        }
        Ok(())
    }

    /// Fetch, verify and store `spender` as acknowledged. A pending local
    /// copy is upgraded; a settled local copy is left alone. Returns whether
    /// anything was written.
    async fn adopt_spender(&self, spender: Hash) -> Result<bool, WalletError> {
        if let Some(local) = self.store.get::<TransferRecord>(&spender.0)? {
            if !local.status.is_pending() {
                return Ok(false);
            }
        }
        let ack_key = self.config()?.custodian.ack_key;
        let Some(fetched) = self.api.lookup_transfer(&spender).await? else {
            warn!(transfer = %spender, "custodian reports a spender it cannot produce");
            return Ok(false);
        };
        if fetched.contents.hash() != spender {
            return Err(WalletError::Invariant(format!(
                "custodian returned the wrong transfer for {spender}"
            )));
        }
        if !fetched.verify(&ack_key) {
            return Err(WalletError::Invariant(format!(
                "acknowledgement for conflicting transfer {spender} does not verify"
            )));
        }

        let status = TransferStatus::Acknowledged(fetched.acknowledgement);
        self.store.transact(|txn| -> Result<bool, WalletError> {
            match txn.get::<TransferRecord>(&spender.0)? {
                Some(mut local) if local.status.is_pending() => {
                    local.status = status;
                    txn.put(&local)?;
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => {
                    txn.put(&TransferRecord::new(fetched.contents, status))?;
                    Ok(true)
                }
            }
        })
    }

    /// Give up on a pending transfer, returning its inputs to the pool.
    pub(crate) fn discard_transfer(&self, hash: Hash) -> Result<TransferRecord, WalletError> {
        self.pending_transfer(hash)?;
        let record = self.advance(hash, TransferStatus::Conflicted)?;
        info!(transfer = %hash, "transfer discarded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hookout_fee_rounds_up_to_whole_satoshis() {
        assert_eq!(hookout_fee(0), 0);
        assert_eq!(hookout_fee(1), 43);
        assert_eq!(hookout_fee(3), 129);
        assert_eq!(hookout_fee(5), 215);
    }
}
