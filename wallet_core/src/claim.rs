//! Claim orchestration: turning a bounty or hookin into coins.
//!
//! 1. Resolve the claimant's private key from its derivation row.
//! 2. Decompose the amount into one coin request per magnitude.
//! 3. For every coin, blind a fresh owner key (derived from the claim hash
//!    and the custodian's signer nonce) and send the signed request.
//!    Owner keys and blinding secrets re-derive from the seed, so a
//!    response to an earlier request for the same claimable is just as
//!    usable as one to this request.
//! 4. Unblind each returned signature and verify it as the coin's existence
//!    proof under that magnitude's signer key.
//! 5. Store the coins and the acknowledged claim in one transaction.
//!
//! A stored claim record means "already claimed": claiming again is a no-op.

use hookpay_crypto::{blind_message, public_from_private, sign_message, unblind, UnblindingFactor};
use hookpay_messages::{ClaimRequest, Claimable, ClaimedCoin, CoinRequest, Hashable};
use hookpay_store::table::str_value;
use hookpay_store::{
    BitcoinAddressRow, ClaimRecord, ConfigRow, DirectAddressRow, Index, ReadOps, StoredCoin,
};
use hookpay_types::{decompose, Hash, Magnitude, PrivateKey, PublicKey, MAX_MONEY};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::WalletError;
use crate::keys::{KeyChain, Lineage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed { coins: Vec<StoredCoin> },
    AlreadyClaimed,
}

struct PendingCoin {
    owner: PublicKey,
    magnitude: Magnitude,
    nonce: PublicKey,
    signer: PublicKey,
    factor: UnblindingFactor,
}

fn prepare_coin(
    keys: &KeyChain,
    config: &ConfigRow,
    claim_hash: &Hash,
    magnitude: Magnitude,
    nonce: PublicKey,
) -> Result<(CoinRequest, PendingCoin), WalletError> {
    let signer = *config.custodian.signer_key(magnitude).ok_or_else(|| {
        WalletError::Invariant(format!("custodian has no signer key for {magnitude}"))
    })?;
    let owner = public_from_private(&keys.derive_owner(claim_hash, &nonce));
    let secret = keys.derive_blinding_secret(claim_hash, &nonce);
    let (blinded_owner, factor) = blind_message(owner.as_bytes(), &signer, &nonce, &secret[..])?;
    Ok((
        CoinRequest {
            blinding_nonce: nonce,
            blinded_owner,
            magnitude,
        },
        PendingCoin {
            owner,
            magnitude,
            nonce,
            signer,
            factor,
        },
    ))
}

impl Engine {
    pub(crate) fn is_claimed(&self, claim_hash: &Hash) -> Result<bool, WalletError> {
        Ok(self.store.contains::<ClaimRecord>(&claim_hash.0)?)
    }

    /// Private key for a claimable's claimant, if this wallet derived it.
    pub(crate) fn claimant_key(
        &self,
        keys: &KeyChain,
        claimable: &Claimable,
    ) -> Result<PrivateKey, WalletError> {
        let key = match claimable {
            Claimable::Bounty(bounty) => {
                let row = self
                    .store
                    .get::<DirectAddressRow>(&bounty.claimant.0)?
                    .ok_or(WalletError::UnknownClaimant)?;
                let lineage = if row.internal {
                    Lineage::Internal
                } else {
                    Lineage::External
                };
                keys.derive(lineage, row.index)
            }
            Claimable::Hookin(hookin) => {
                let rows: Vec<BitcoinAddressRow> = self.store.find(
                    Index::BitcoinAddressByAddress,
                    &str_value(&hookin.bitcoin_address),
                )?;
                let row = rows.first().ok_or(WalletError::UnknownClaimant)?;
                if row.claimant != hookin.claimant {
                    return Err(WalletError::UnknownClaimant);
                }
                keys.derive(Lineage::Bitcoin, row.index)
            }
        };
        if public_from_private(&key) != *claimable.claimant() {
            return Err(WalletError::Invariant(format!(
                "derived key does not match claimant of {} {}",
                claimable.kind(),
                claimable.hash()
            )));
        }
        Ok(key)
    }

    /// Run the claim protocol for `claimable`. The caller holds the
    /// operation lock.
    pub(crate) async fn claim_claimable(
        &self,
        claimable: Claimable,
    ) -> Result<ClaimOutcome, WalletError> {
        let claim_hash = claimable.hash();
        if self.is_claimed(&claim_hash)? {
            debug!(claim = %claim_hash, "already claimed");
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        let amount = claimable.amount();
        if amount == 0 || amount > MAX_MONEY {
            return Err(WalletError::InvalidAmount(amount));
        }

        let keys = self.keys()?;
        let config = self.config()?;
        let claimant_key = self.claimant_key(&keys, &claimable)?;

        let magnitudes = decompose(amount);
        let nonces = self.api.gen_nonces(magnitudes.len()).await?;
        if nonces.len() != magnitudes.len() {
            return Err(WalletError::Invariant(format!(
                "asked for {} signer nonces, got {}",
                magnitudes.len(),
                nonces.len()
            )));
        }

        let mut pending = Vec::with_capacity(magnitudes.len());
        let mut coin_requests = Vec::with_capacity(magnitudes.len());
        for (magnitude, nonce) in magnitudes.into_iter().zip(nonces) {
            let (coin_request, coin) = prepare_coin(&keys, &config, &claim_hash, magnitude, nonce)?;
            coin_requests.push(coin_request);
            pending.push(coin);
        }

        let signing_hash = ClaimRequest::signing_hash(&claimable, &coin_requests);
        let request = ClaimRequest {
            claimable,
            coin_requests,
            authorization: sign_message(signing_hash.as_bytes(), &claimant_key),
        };

        let response = self.api.claim(&request).await?;
        if !response.verify(&config.custodian.ack_key) {
            return Err(WalletError::ClaimVerification(format!(
                "acknowledgement for claim {claim_hash} does not verify"
            )));
        }
        let answered = &response.contents.claim_request;
        if answered.claim_hash() != claim_hash {
            return Err(WalletError::Invariant(format!(
                "claim response for {claim_hash} answers claim {}",
                answered.claim_hash()
            )));
        }
        if *answered != request {
            // The custodian already answered an earlier request for this
            // claimable (a restored wallet, or a lost response). Its coins
            // are ours if every blinded owner re-derives from our seed.
            debug!(claim = %claim_hash, "custodian answered an earlier request");
            pending = Vec::with_capacity(answered.coin_requests.len());
            for coin_request in &answered.coin_requests {
                let (rederived, coin) = prepare_coin(
                    &keys,
                    &config,
                    &claim_hash,
                    coin_request.magnitude,
                    coin_request.blinding_nonce,
                )?;
                if rederived.blinded_owner != coin_request.blinded_owner {
                    return Err(WalletError::Invariant(format!(
                        "blinded owner mismatch in claim {claim_hash}"
                    )));
                }
                pending.push(coin);
            }
        }
        let proofs = &response.contents.blinded_existence_proofs;
        if proofs.len() != pending.len() {
            return Err(WalletError::ClaimVerification(format!(
                "expected {} blinded proofs, got {}",
                pending.len(),
                proofs.len()
            )));
        }

        let mut coins = Vec::with_capacity(pending.len());
        for (coin, blinded) in pending.iter().zip(proofs) {
            let existence_proof = unblind(blinded, &coin.factor)
                .map_err(|e| WalletError::ClaimVerification(e.to_string()))?;
            let claimed = ClaimedCoin {
                owner: coin.owner,
                magnitude: coin.magnitude,
                existence_proof,
            };
            if !claimed.verify(&coin.signer) {
                return Err(WalletError::ClaimVerification(format!(
                    "existence proof for {} coin of claim {claim_hash} does not verify",
                    coin.magnitude
                )));
            }
            coins.push(StoredCoin {
                owner: claimed.owner,
                magnitude: claimed.magnitude,
                existence_proof,
                claim_hash,
                blinding_nonce: coin.nonce,
            });
        }

        let outcome = self.store.transact(|txn| -> Result<ClaimOutcome, WalletError> {
            if txn.contains::<ClaimRecord>(&claim_hash.0)? {
                return Ok(ClaimOutcome::AlreadyClaimed);
            }
            match &response.contents.claim_request.claimable {
                Claimable::Bounty(bounty) => {
                    txn.insert_if_absent(bounty)?;
                }
                Claimable::Hookin(hookin) => {
                    txn.insert_if_absent(hookin)?;
                }
            }
            for coin in &coins {
                txn.put(coin)?;
            }
            txn.put(&response)?;
            Ok(ClaimOutcome::Claimed {
                coins: coins.clone(),
            })
        })?;

        if let ClaimOutcome::Claimed { coins } = &outcome {
            info!(
                claim = %claim_hash,
                amount = request.requested_amount(),
                coins = coins.len(),
                "claimed"
            );
        }
        Ok(outcome)
    }
}
