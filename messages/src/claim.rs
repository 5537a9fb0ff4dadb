//! The blind-signature claim protocol messages.

use hookpay_crypto::{hash_labeled, verify_signature};
use hookpay_types::{
    BlindedMessage, BlindedSignature, Hash, Magnitude, PublicKey, Signature,
};
use serde::{Deserialize, Serialize};

use crate::{Bounty, Hashable, Hookin};

/// Something that can be converted into coins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claimable {
    Bounty(Bounty),
    Hookin(Hookin),
}

impl Claimable {
    pub fn amount(&self) -> u64 {
        match self {
            Self::Bounty(b) => b.amount,
            Self::Hookin(h) => h.amount,
        }
    }

    pub fn claimant(&self) -> &PublicKey {
        match self {
            Self::Bounty(b) => &b.claimant,
            Self::Hookin(h) => &h.claimant,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bounty(_) => "bounty",
            Self::Hookin(_) => "hookin",
        }
    }
}

impl Hashable for Claimable {
    /// The claim hash: the hash of the thing claimed.
    fn hash(&self) -> Hash {
        match self {
            Self::Bounty(b) => b.hash(),
            Self::Hookin(h) => h.hash(),
        }
    }
}

/// One blinded coin to be signed.
///
/// `blinding_nonce` is the custodian's committed signer nonce for this coin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRequest {
    pub blinding_nonce: PublicKey,
    pub blinded_owner: BlindedMessage,
    pub magnitude: Magnitude,
}

/// A request to convert a claimable into blinded coins, signed by the
/// claimant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub claimable: Claimable,
    pub coin_requests: Vec<CoinRequest>,
    pub authorization: Signature,
}

impl ClaimRequest {
    /// The hash the claimant signs.
    pub fn signing_hash(claimable: &Claimable, coin_requests: &[CoinRequest]) -> Hash {
        let claim_hash = claimable.hash();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(1 + coin_requests.len() * 3);
        parts.push(claim_hash.as_bytes());
        let magnitudes: Vec<[u8; 1]> = coin_requests
            .iter()
            .map(|r| [r.magnitude.exponent()])
            .collect();
        for (request, magnitude) in coin_requests.iter().zip(&magnitudes) {
            parts.push(request.blinding_nonce.as_bytes());
            parts.push(&request.blinded_owner.0);
            parts.push(magnitude);
        }
        hash_labeled("claim-request", &parts)
    }

    pub fn claim_hash(&self) -> Hash {
        self.claimable.hash()
    }

    /// Requested amount across all coin requests.
    pub fn requested_amount(&self) -> u64 {
        self.coin_requests
            .iter()
            .map(|r| r.magnitude.amount())
            .sum()
    }

    /// Whether the claimant's authorization signature is valid.
    pub fn verify_authorization(&self) -> bool {
        let hash = Self::signing_hash(&self.claimable, &self.coin_requests);
        verify_signature(
            hash.as_bytes(),
            &self.authorization,
            self.claimable.claimant(),
        )
    }
}

impl Hashable for ClaimRequest {
    fn hash(&self) -> Hash {
        Self::signing_hash(&self.claimable, &self.coin_requests)
    }
}

/// The custodian's answer: one blind signature per coin request, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claim_request: ClaimRequest,
    pub blinded_existence_proofs: Vec<BlindedSignature>,
}

impl Hashable for ClaimResponse {
    fn hash(&self) -> Hash {
        let request_hash = self.claim_request.hash();
        let mut parts: Vec<&[u8]> = vec![request_hash.as_bytes()];
        parts.extend(self.blinded_existence_proofs.iter().map(|p| &p.0[..]));
        hash_labeled("claim-response", &parts)
    }
}

/// An unblinded coin as presented in a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedCoin {
    pub owner: PublicKey,
    pub magnitude: Magnitude,
    pub existence_proof: Signature,
}

impl ClaimedCoin {
    pub fn amount(&self) -> u64 {
        self.magnitude.amount()
    }

    /// Whether the existence proof authenticates `owner` under the signer
    /// key for this coin's magnitude.
    pub fn verify(&self, signer: &PublicKey) -> bool {
        verify_signature(self.owner.as_bytes(), &self.existence_proof, signer)
    }
}

impl Hashable for ClaimedCoin {
    fn hash(&self) -> Hash {
        hash_labeled(
            "coin",
            &[
                self.owner.as_bytes(),
                &[self.magnitude.exponent()],
                self.existence_proof.as_bytes(),
            ],
        )
    }
}
