//! Transfers: atomic spends of coins into bounties and an optional hookout.

use hookpay_crypto::{aggregate_public_keys, hash_labeled, verify_signature};
use hookpay_types::{Hash, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::{Bounty, ClaimedCoin, Hashable, Hookout};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Input coins, sorted by coin hash.
    pub inputs: Vec<ClaimedCoin>,
    /// Output bounties, sorted by bounty hash.
    pub outputs: Vec<Bounty>,
    pub hookout: Option<Hookout>,
    /// Aggregate signature over the commitment hash by every input owner.
    pub authorization: Signature,
}

impl Transfer {
    /// Sort inputs and outputs into the canonical hash order.
    pub fn sort_canonical(inputs: &mut [ClaimedCoin], outputs: &mut [Bounty]) {
        inputs.sort_by_cached_key(|c| c.hash());
        outputs.sort_by_cached_key(|b| b.hash());
    }

    /// The commitment hash over canonically ordered parts.
    pub fn commitment(
        inputs: &[ClaimedCoin],
        outputs: &[Bounty],
        hookout: Option<&Hookout>,
    ) -> Hash {
        let input_hashes: Vec<Hash> = inputs.iter().map(Hashable::hash).collect();
        let output_hashes: Vec<Hash> = outputs.iter().map(Hashable::hash).collect();
        let hookout_hash = hookout.map(Hashable::hash);
        let input_count = (inputs.len() as u32).to_le_bytes();
        let output_count = (outputs.len() as u32).to_le_bytes();

        let mut parts: Vec<&[u8]> = Vec::with_capacity(input_hashes.len() + output_hashes.len() + 3);
        parts.push(&input_count);
        parts.extend(input_hashes.iter().map(|h| &h.0[..]));
        parts.push(&output_count);
        parts.extend(output_hashes.iter().map(|h| &h.0[..]));
        parts.push(hookout_hash.as_ref().map(|h| &h.0[..]).unwrap_or(&[]));
        hash_labeled("transfer", &parts)
    }

    pub fn is_canonical(&self) -> bool {
        let inputs_sorted = self
            .inputs
            .windows(2)
            .all(|w| w[0].hash() <= w[1].hash());
        let outputs_sorted = self
            .outputs
            .windows(2)
            .all(|w| w[0].hash() <= w[1].hash());
        inputs_sorted && outputs_sorted
    }

    pub fn input_amount(&self) -> u64 {
        self.inputs.iter().map(ClaimedCoin::amount).sum()
    }

    /// Value leaving through bounties and the hookout.
    pub fn output_amount(&self) -> u64 {
        let bounties: u64 = self.outputs.iter().map(|b| b.amount).sum();
        bounties + self.hookout.as_ref().map_or(0, |h| h.amount)
    }

    /// Implied fee, or `None` if outputs exceed inputs.
    pub fn fee(&self) -> Option<u64> {
        self.input_amount().checked_sub(self.output_amount())
    }

    pub fn owners(&self) -> Vec<PublicKey> {
        self.inputs.iter().map(|c| c.owner).collect()
    }

    /// Whether `authorization` verifies under the sum of input owner keys.
    pub fn verify_authorization(&self) -> bool {
        let Ok(aggregate) = aggregate_public_keys(&self.owners()) else {
            return false;
        };
        verify_signature(self.hash().as_bytes(), &self.authorization, &aggregate)
    }
}

impl Hashable for Transfer {
    fn hash(&self) -> Hash {
        Self::commitment(&self.inputs, &self.outputs, self.hookout.as_ref())
    }
}
