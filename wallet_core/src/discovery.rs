//! Address discovery and the sync sweep.
//!
//! Bitcoin deposit addresses and both direct claimant lineages are found by
//! gap-limit scanning: probe successive derivation indices and stop once
//! more than `gap_limit` consecutive indices turned up nothing. A hit
//! persists every address up to `hit + gap_limit`; an all-empty run past
//! the limit is never persisted, so raising the gap limit later rescans it.
//!
//! Known addresses are re-probed first (concurrently), since deposits and
//! bounties can arrive at any address already handed out. Sync ends by
//! asking the custodian which local coins are already spent, so a restored
//! wallet learns about transfers an earlier copy made.

use std::collections::HashSet;
use std::future::Future;

use futures_util::future::join_all;
use hookpay_messages::{BitcoinReceive, Bounty, Claimable, Hashable, Hookin};
use hookpay_store::table::u32_value;
use hookpay_store::{BitcoinAddressRow, DirectAddressRow, ReadOps};
use hookpay_types::{Hash, MAX_MONEY};
use tracing::{debug, info, warn};

use crate::claim::ClaimOutcome;
use crate::engine::{
    bitcoin_address_row, direct_addresses, generator, next_bitcoin_index, next_direct_index,
    Engine,
};
use crate::error::WalletError;
use crate::keys::{derive_public, Lineage};

/// What a sync found and did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new_bitcoin_addresses: usize,
    pub new_direct_addresses: usize,
    pub new_hookins: usize,
    pub new_bounties: usize,
    pub claimed: usize,
    pub claim_failures: usize,
    /// Transfers learned from the custodian because they spent local coins.
    pub new_transfers: usize,
    attempted: HashSet<Hash>,
}

/// Result of one gap-limit scan.
#[derive(Debug)]
pub(crate) struct GapScan<T> {
    pub hits: Vec<(u32, T)>,
    pub last_probed: Option<u32>,
}

impl<T> GapScan<T> {
    /// Highest index whose address should be stored, if the scan hit.
    pub fn persist_through(&self, gap_limit: u32) -> Option<u32> {
        let (last_hit, _) = self.hits.last()?;
        let bound = last_hit.saturating_add(gap_limit);
        Some(self.last_probed.map_or(*last_hit, |probed| bound.min(probed)))
    }
}

/// Probe indices from `start` until the empty run exceeds `gap_limit`.
///
/// `initial_gap` carries over empty indices immediately below `start`. A
/// failed probe ends the scan; what was found so far is kept.
pub(crate) async fn gap_scan<T, F, Fut>(
    start: u32,
    initial_gap: u32,
    gap_limit: u32,
    mut probe: F,
) -> GapScan<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, WalletError>>,
{
    let mut scan = GapScan {
        hits: Vec::new(),
        last_probed: None,
    };
    let mut gap = initial_gap;
    let mut index = start;
    while gap <= gap_limit {
        match probe(index).await {
            Ok(Some(found)) => {
                scan.hits.push((index, found));
                gap = 0;
            }
            Ok(None) => gap += 1,
            Err(e) => {
                warn!(index, error = %e, "discovery probe failed, stopping scan");
                break;
            }
        }
        scan.last_probed = Some(index);
        index = match index.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    scan
}

/// Empty indices at the top of a known range `0..next`.
fn trailing_gap(next: u32, last_hit: Option<u32>) -> u32 {
    match last_hit {
        Some(hit) => next.saturating_sub(hit + 1),
        None => next,
    }
}

impl Engine {
    /// Find deposits at known and newly scanned bitcoin addresses, store
    /// them as hookins and claim the new ones.
    pub(crate) async fn discover_bitcoin(
        &self,
        report: &mut SyncReport,
    ) -> Result<(), WalletError> {
        let config = self.config()?;
        let known: Vec<BitcoinAddressRow> = self.store.list()?;
        let api = self.api.as_ref();

        let reprobes = join_all(
            known
                .iter()
                .map(|row| api.fetch_bitcoin_receives(&row.address)),
        )
        .await;
        let mut found: Vec<(BitcoinAddressRow, Vec<BitcoinReceive>)> = Vec::new();
        let mut last_known_hit = None;
        for (row, result) in known.iter().zip(reprobes) {
            match result {
                Ok(receives) if !receives.is_empty() => {
                    last_known_hit = Some(row.index);
                    found.push((row.clone(), receives));
                }
                Ok(_) => {}
                Err(e) => warn!(address = %row.address, error = %e, "deposit lookup failed"),
            }
        }

        let start = next_bitcoin_index(self.store.as_ref())?;
        let config_ref = &config;
        let scan = gap_scan(
            start,
            trailing_gap(start, last_known_hit),
            config.gap_limit,
            move |index| async move {
                let row = bitcoin_address_row(config_ref, index)?;
                let receives = api.fetch_bitcoin_receives(&row.address).await?;
                Ok((!receives.is_empty()).then_some((row, receives)))
            },
        )
        .await;
        let through = scan.persist_through(config.gap_limit);
        found.extend(scan.hits.into_iter().map(|(_, hit)| hit));

        let new_hookins = self.store.transact(|txn| -> Result<Vec<Hookin>, WalletError> {
            if let Some(through) = through {
                for index in start..=through {
                    if !txn.contains::<BitcoinAddressRow>(&u32_value(index))? {
                        txn.put(&bitcoin_address_row(&config, index)?)?;
                        report.new_bitcoin_addresses += 1;
                    }
                }
            }
            let mut new = Vec::new();
            for (row, receives) in &found {
                for receive in receives.iter().filter(|r| r.amount > 0) {
                    if receive.amount > MAX_MONEY {
                        warn!(
                            address = %row.address,
                            txid = %receive.txid,
                            amount = receive.amount,
                            "skipping receive above the bitcoin supply"
                        );
                        continue;
                    }
                    let hookin = Hookin {
                        txid: receive.txid.clone(),
                        vout: receive.vout,
                        amount: receive.amount,
                        claimant: row.claimant,
                        bitcoin_address: row.address.clone(),
                    };
                    if txn.insert_if_absent(&hookin)? {
                        new.push(hookin);
                    }
                }
            }
            Ok(new)
        })?;

        debug!(
            addresses = report.new_bitcoin_addresses,
            hookins = new_hookins.len(),
            "bitcoin discovery done"
        );
        report.new_hookins += new_hookins.len();
        for hookin in new_hookins {
            self.claim_best_effort(Claimable::Hookin(hookin), report).await;
        }
        Ok(())
    }

    /// Find bounties addressed to known and newly scanned claimants of one
    /// lineage, store them and claim the new ones. The internal lineage
    /// holds change, so scanning it is what recovers change after a restore.
    pub(crate) async fn discover_bounties(
        &self,
        lineage: Lineage,
        report: &mut SyncReport,
    ) -> Result<(), WalletError> {
        let internal = lineage == Lineage::Internal;
        let config = self.config()?;
        let known = direct_addresses(self.store.as_ref(), internal)?;
        let api = self.api.as_ref();

        let reprobes = join_all(known.iter().map(|row| api.lookup_bounties(&row.claimant))).await;
        let mut found: Vec<Bounty> = Vec::new();
        let mut last_known_hit = None;
        for (row, result) in known.iter().zip(reprobes) {
            match result {
                Ok(bounties) if !bounties.is_empty() => {
                    last_known_hit = Some(row.index);
                    found.extend(bounties);
                }
                Ok(_) => {}
                Err(e) => warn!(claimant = %row.claimant, error = %e, "bounty lookup failed"),
            }
        }

        let start = next_direct_index(self.store.as_ref(), internal)?;
        let lineage_key = *generator(&config, lineage);
        let scan = gap_scan(
            start,
            trailing_gap(start, last_known_hit),
            config.gap_limit,
            move |index| async move {
                let claimant = derive_public(&lineage_key, index)?;
                let bounties = api.lookup_bounties(&claimant).await?;
                Ok((!bounties.is_empty()).then_some(bounties))
            },
        )
        .await;
        let through = scan.persist_through(config.gap_limit);
        found.extend(scan.hits.into_iter().flat_map(|(_, hit)| hit));

        let new_bounties = self.store.transact(|txn| -> Result<Vec<Bounty>, WalletError> {
            if let Some(through) = through {
                for index in start..=through {
                    let claimant = derive_public(&lineage_key, index)?;
                    if !txn.contains::<DirectAddressRow>(&claimant.0)? {
                        txn.put(&DirectAddressRow {
                            claimant,
                            index,
                            internal,
                        })?;
                        report.new_direct_addresses += 1;
                    }
                }
            }
            let mut new = Vec::new();
            for bounty in &found {
                if !txn.contains::<DirectAddressRow>(&bounty.claimant.0)? {
                    warn!(bounty = %bounty.hash(), "custodian returned a bounty for a foreign claimant");
                    continue;
                }
                if bounty.amount > MAX_MONEY {
                    warn!(
                        bounty = %bounty.hash(),
                        amount = bounty.amount,
                        "skipping bounty above the bitcoin supply"
                    );
                    continue;
                }
                if txn.insert_if_absent(bounty)? {
                    new.push(bounty.clone());
                }
            }
            Ok(new)
        })?;

        debug!(
            %lineage,
            addresses = report.new_direct_addresses,
            bounties = new_bounties.len(),
            "bounty discovery done"
        );
        report.new_bounties += new_bounties.len();
        for bounty in new_bounties {
            self.claim_best_effort(Claimable::Bounty(bounty), report).await;
        }
        Ok(())
    }

    /// Claim every stored hookin, and every stored bounty with a local
    /// claimant, that has no claim record yet.
    pub(crate) async fn claim_sweep(&self, report: &mut SyncReport) -> Result<(), WalletError> {
        let mut unclaimed: Vec<Claimable> = Vec::new();
        for hookin in self.store.list::<Hookin>()? {
            if !self.is_claimed(&hookin.hash())? {
                unclaimed.push(Claimable::Hookin(hookin));
            }
        }
        for bounty in self.store.list::<Bounty>()? {
            if !self.store.contains::<DirectAddressRow>(&bounty.claimant.0)? {
                continue;
            }
            if !self.is_claimed(&bounty.hash())? {
                unclaimed.push(Claimable::Bounty(bounty));
            }
        }
        for claimable in unclaimed {
            if !report.attempted.contains(&claimable.hash()) {
                self.claim_best_effort(claimable, report).await;
            }
        }
        Ok(())
    }

    /// Bitcoin discovery, bounty discovery on both lineages, the claim
    /// sweep, then the spent-coin refresh.
    pub(crate) async fn sync(&self) -> Result<SyncReport, WalletError> {
        let mut report = SyncReport::default();
        self.discover_bitcoin(&mut report).await?;
        self.discover_bounties(Lineage::External, &mut report).await?;
        self.discover_bounties(Lineage::Internal, &mut report).await?;
        self.claim_sweep(&mut report).await?;
        self.refresh_spent(&mut report).await?;
        info!(
            hookins = report.new_hookins,
            bounties = report.new_bounties,
            transfers = report.new_transfers,
            claimed = report.claimed,
            failures = report.claim_failures,
            "sync complete"
        );
        Ok(report)
    }

    async fn claim_best_effort(&self, claimable: Claimable, report: &mut SyncReport) {
        let hash = claimable.hash();
        report.attempted.insert(hash);
        let kind = claimable.kind();
        match self.claim_claimable(claimable).await {
            Ok(ClaimOutcome::Claimed { .. }) => report.claimed += 1,
            Ok(ClaimOutcome::AlreadyClaimed) => {}
            Err(e) => {
                report.claim_failures += 1;
                warn!(claim = %hash, kind, error = %e, "claim failed, will retry on next sync");
            }
        }
    }
}
