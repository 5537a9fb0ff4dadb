//! Nullable settlement custodian: a complete custodian in memory.
//!
//! Keys are derived from fixed labels, so two instances sign identically.
//! Claims are idempotent per claimable, spends are tracked per coin owner,
//! and a spend of an already-spent coin fails with `INPUT_SPENT`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use hookpay_crypto::{
    ack_key_from_secret, blind_sign, deposit_address, hmac_sha512, private_key_from_wide,
    public_from_private, random_private_key, sign_ack,
};
use hookpay_messages::{
    Acknowledged, BitcoinReceive, Bounty, ClaimRequest, ClaimResponse, Claimable,
    CustodianInfo, FeeSchedule, Hashable, SettlementError, Transfer,
};
use hookpay_types::{AckSignature, Hash, Magnitude, Network, PrivateKey, PublicKey};
use hookpay_wallet_core::{SettlementApi, SettlementResult};
use tracing::debug;

/// The secp256k1 generator point, a valid compressed key.
pub const FUNDING_KEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

fn fixed_key(label: &[u8], index: u8) -> PrivateKey {
    private_key_from_wide(&hmac_sha512(label, &[index]))
}

#[derive(Default)]
struct State {
    /// Outstanding signer nonce secrets by public nonce.
    nonces: HashMap<PublicKey, PrivateKey>,
    claims: HashMap<Hash, Acknowledged<ClaimResponse>>,
    bounties: BTreeMap<Hash, Bounty>,
    receives: HashMap<String, Vec<BitcoinReceive>>,
    /// Coin owner -> hash of the transfer that spent it.
    spent: HashMap<PublicKey, Hash>,
    transfers: HashMap<Hash, Acknowledged<Transfer>>,
    receive_probes: Vec<String>,
    bounty_probes: Vec<PublicKey>,
    next_txid: u64,
    fail_next_submit: Option<SettlementError>,
    fail_next_claim: Option<SettlementError>,
    fail_next_coin_lookup: Option<SettlementError>,
}

pub struct NullSettlement {
    signer_keys: Vec<PrivateKey>,
    ack_secret: PrivateKey,
    info: CustodianInfo,
    state: Mutex<State>,
}

impl NullSettlement {
    pub fn new() -> Self {
        Self::with_fees(FeeSchedule::default())
    }

    pub fn with_fees(fees: FeeSchedule) -> Self {
        let signer_keys: Vec<PrivateKey> = Magnitude::all()
            .map(|m| fixed_key(b"null-custodian/signer", m.exponent()))
            .collect();
        let ack_secret = fixed_key(b"null-custodian/ack", 0);
        let info = CustodianInfo {
            blind_coin_keys: signer_keys.iter().map(public_from_private).collect(),
            ack_key: ack_key_from_secret(&ack_secret),
            funding_key: FUNDING_KEY.to_string(),
            fees,
            network: Network::Regtest,
        };
        Self {
            signer_keys,
            ack_secret,
            info,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn info(&self) -> &CustodianInfo {
        &self.info
    }

    /// The deposit address a claimant key pays into.
    pub fn deposit_address_for(&self, claimant: &PublicKey) -> String {
        deposit_address(claimant, &self.info.funding_key, self.info.network)
            .unwrap_or_else(|_| unreachable!("FUNDING_KEY is a valid compressed key"))
    }

    /// Record an on-chain payment to `address`.
    pub fn add_receive(&self, address: &str, amount: u64) -> BitcoinReceive {
        let mut state = self.state();
        state.next_txid += 1;
        let receive = BitcoinReceive {
            txid: format!("{:064x}", state.next_txid),
            vout: 0,
            amount,
        };
        state
            .receives
            .entry(address.to_string())
            .or_default()
            .push(receive.clone());
        receive
    }

    /// Issue a bounty to `claimant`, as if someone paid it.
    pub fn issue_bounty(&self, claimant: PublicKey, amount: u64) -> Bounty {
        let bounty = Bounty::new(amount, claimant);
        self.state().bounties.insert(bounty.hash(), bounty.clone());
        bounty
    }

    /// Addresses queried for receives, in order.
    pub fn receive_probes(&self) -> Vec<String> {
        self.state().receive_probes.clone()
    }

    /// Claimants queried for bounties, in order.
    pub fn bounty_probes(&self) -> Vec<PublicKey> {
        self.state().bounty_probes.clone()
    }

    pub fn clear_probes(&self) {
        let mut state = self.state();
        state.receive_probes.clear();
        state.bounty_probes.clear();
    }

    pub fn claim_count(&self) -> usize {
        self.state().claims.len()
    }

    pub fn transfer(&self, hash: &Hash) -> Option<Acknowledged<Transfer>> {
        self.state().transfers.get(hash).cloned()
    }

    /// Fail the next transfer submission with `error`.
    pub fn fail_next_submit(&self, error: SettlementError) {
        self.state().fail_next_submit = Some(error);
    }

    /// Fail the next claim with `error`.
    pub fn fail_next_claim(&self, error: SettlementError) {
        self.state().fail_next_claim = Some(error);
    }

    /// Fail the next coin lookup with `error`.
    pub fn fail_next_coin_lookup(&self, error: SettlementError) {
        self.state().fail_next_coin_lookup = Some(error);
    }

    fn check_claimable(&self, state: &State, claimable: &Claimable) -> SettlementResult<()> {
        match claimable {
            Claimable::Bounty(bounty) => {
                if !state.bounties.contains_key(&bounty.hash()) {
                    return Err(SettlementError::not_found("unknown bounty"));
                }
            }
            Claimable::Hookin(hookin) => {
                if self.deposit_address_for(&hookin.claimant) != hookin.bitcoin_address {
                    return Err(bad_request("CLAIMANT_MISMATCH", "address does not commit to claimant"));
                }
                let received = state
                    .receives
                    .get(&hookin.bitcoin_address)
                    .is_some_and(|receives| {
                        receives.iter().any(|r| {
                            r.txid == hookin.txid && r.vout == hookin.vout && r.amount == hookin.amount
                        })
                    });
                if !received {
                    return Err(SettlementError::not_found("no such deposit"));
                }
            }
        }
        Ok(())
    }

    fn check_transfer(&self, transfer: &Transfer) -> SettlementResult<()> {
        if transfer.inputs.is_empty() {
            return Err(bad_request("NO_INPUTS", "transfer spends nothing"));
        }
        if !transfer.is_canonical() {
            return Err(bad_request("NOT_CANONICAL", "inputs or outputs out of order"));
        }
        for input in &transfer.inputs {
            let signer = self
                .info
                .signer_key(input.magnitude)
                .ok_or_else(|| bad_request("BAD_MAGNITUDE", "no signer for magnitude"))?;
            if !input.verify(signer) {
                return Err(bad_request("INVALID_COIN", "existence proof does not verify"));
            }
        }
        if !transfer.verify_authorization() {
            return Err(bad_request("INVALID_AUTHORIZATION", "aggregate signature does not verify"));
        }
        let fee = transfer
            .fee()
            .ok_or_else(|| bad_request("OVERSPEND", "outputs exceed inputs"))?;
        if transfer.hookout.is_none() && fee < self.info.fees.direct {
            return Err(bad_request("FEE_TOO_LOW", format!("fee {fee} below {}", self.info.fees.direct)));
        }
        Ok(())
    }
}

impl Default for NullSettlement {
    fn default() -> Self {
        Self::new()
    }
}

fn bad_request(code: &str, message: impl Into<String>) -> SettlementError {
    SettlementError::new(400, code, message)
}

#[async_trait]
impl SettlementApi for NullSettlement {
    async fn custodian_info(&self) -> SettlementResult<CustodianInfo> {
        Ok(self.info.clone())
    }

    async fn gen_nonces(&self, count: usize) -> SettlementResult<Vec<PublicKey>> {
        let mut state = self.state();
        let mut nonces = Vec::with_capacity(count);
        for _ in 0..count {
            let secret = random_private_key();
            let public = public_from_private(&secret);
            state.nonces.insert(public, secret);
            nonces.push(public);
        }
        Ok(nonces)
    }

    async fn claim(&self, request: &ClaimRequest) -> SettlementResult<Acknowledged<ClaimResponse>> {
        let mut state = self.state();
        if let Some(error) = state.fail_next_claim.take() {
            return Err(error);
        }
        if !request.verify_authorization() {
            return Err(bad_request("INVALID_AUTHORIZATION", "claim is not signed by the claimant"));
        }
        let claim_hash = request.claim_hash();
        if let Some(existing) = state.claims.get(&claim_hash) {
            debug!(claim = %claim_hash, "replaying earlier claim response");
            return Ok(existing.clone());
        }
        self.check_claimable(&state, &request.claimable)?;
        if request.requested_amount() != request.claimable.amount() {
            return Err(bad_request("AMOUNT_MISMATCH", "coins do not add up to the claimable"));
        }

        let mut proofs = Vec::with_capacity(request.coin_requests.len());
        for coin in &request.coin_requests {
            let nonce_secret = state
                .nonces
                .remove(&coin.blinding_nonce)
                .ok_or_else(|| bad_request("UNKNOWN_NONCE", "nonce was not issued or was used"))?;
            let signer = &self.signer_keys[coin.magnitude.index()];
            let proof = blind_sign(signer, &nonce_secret, &coin.blinded_owner)
                .map_err(|e| bad_request("INVALID_BLINDING", e.to_string()))?;
            proofs.push(proof);
        }

        let response = ClaimResponse {
            claim_request: request.clone(),
            blinded_existence_proofs: proofs,
        };
        let acknowledgement = sign_ack(&self.ack_secret, &response.hash());
        let acknowledged = Acknowledged::new(response, acknowledgement);
        state.claims.insert(claim_hash, acknowledged.clone());
        Ok(acknowledged)
    }

    async fn submit_transfer(&self, transfer: &Transfer) -> SettlementResult<AckSignature> {
        let mut state = self.state();
        if let Some(error) = state.fail_next_submit.take() {
            return Err(error);
        }
        self.check_transfer(transfer)?;

        let hash = transfer.hash();
        if let Some(existing) = state.transfers.get(&hash) {
            return Ok(existing.acknowledgement);
        }
        for input in &transfer.inputs {
            if let Some(spender) = state.spent.get(&input.owner) {
                return Err(SettlementError::input_spent(format!(
                    "coin {} already spent by {spender}",
                    input.owner
                )));
            }
        }

        for input in &transfer.inputs {
            state.spent.insert(input.owner, hash);
        }
        for bounty in &transfer.outputs {
            state.bounties.insert(bounty.hash(), bounty.clone());
        }
        let acknowledgement = sign_ack(&self.ack_secret, &hash);
        state
            .transfers
            .insert(hash, Acknowledged::new(transfer.clone(), acknowledgement));
        Ok(acknowledgement)
    }

    async fn lookup_coin(&self, owner: &PublicKey) -> SettlementResult<Option<Hash>> {
        let mut state = self.state();
        if let Some(error) = state.fail_next_coin_lookup.take() {
            return Err(error);
        }
        Ok(state.spent.get(owner).copied())
    }

    async fn lookup_transfer(
        &self,
        hash: &Hash,
    ) -> SettlementResult<Option<Acknowledged<Transfer>>> {
        Ok(self.state().transfers.get(hash).cloned())
    }

    async fn lookup_bounties(&self, claimant: &PublicKey) -> SettlementResult<Vec<Bounty>> {
        let mut state = self.state();
        state.bounty_probes.push(*claimant);
        Ok(state
            .bounties
            .values()
            .filter(|b| b.claimant == *claimant)
            .cloned()
            .collect())
    }

    async fn fetch_bitcoin_receives(
        &self,
        address: &str,
    ) -> SettlementResult<Vec<BitcoinReceive>> {
        let mut state = self.state();
        state.receive_probes.push(address.to_string());
        Ok(state.receives.get(address).cloned().unwrap_or_default())
    }
}
