//! Deterministic key derivation from the wallet seed.
//!
//! Three generators are derived from the seed under fixed labels, one per
//! lineage: bitcoin deposit claimants, internal (change) claimants and
//! external claimants. A generator derives child `i` additively:
//!
//! ```text
//! child_priv = g + H(G, i)
//! child_pub  = G + H(G, i)·B
//! ```
//!
//! so the public generators kept in the config row derive every claimant
//! public key without the seed.
//!
//! Coin owner keys and blinding secrets are not indexed; they are keyed by
//! `(claim hash, blinding nonce)` and re-derived whenever needed.

use std::fmt;

use hookpay_crypto::{
    hash_labeled, hmac_sha512, private_key_from_wide, public_from_private, seed_from_mnemonic,
    tweak_private_key, tweak_public_key,
};
use hookpay_types::{Hash, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::error::WalletError;

const SEED_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lineage {
    Bitcoin,
    Internal,
    External,
}

impl Lineage {
    fn label(&self) -> &'static [u8] {
        match self {
            Lineage::Bitcoin => b"hookpay/generator/bitcoin",
            Lineage::Internal => b"hookpay/generator/internal",
            Lineage::External => b"hookpay/generator/external",
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lineage::Bitcoin => "bitcoin",
            Lineage::Internal => "internal",
            Lineage::External => "external",
        })
    }
}

fn child_tweak(generator: &PublicKey, index: u32) -> [u8; 36] {
    let mut tweak = [0u8; 36];
    tweak[..32].copy_from_slice(generator.as_bytes());
    tweak[32..].copy_from_slice(&index.to_be_bytes());
    tweak
}

/// Derive child `index` of a generator from its public key alone.
pub fn derive_public(generator: &PublicKey, index: u32) -> Result<PublicKey, WalletError> {
    Ok(tweak_public_key(generator, &child_tweak(generator, index))?)
}

/// A private generator for one lineage.
pub struct Generator {
    root: PrivateKey,
    public: PublicKey,
}

impl Generator {
    fn from_seed(seed: &[u8; SEED_LEN], lineage: Lineage) -> Self {
        let wide = Zeroizing::new(hmac_sha512(lineage.label(), seed));
        let root = private_key_from_wide(&wide);
        let public = public_from_private(&root);
        Self { root, public }
    }

    pub fn public(&self) -> PublicKey {
        self.public
    }

    pub fn derive(&self, index: u32) -> PrivateKey {
        tweak_private_key(&self.root, &child_tweak(&self.public, index))
    }
}

/// Every secret derived from an unlocked seed.
pub struct KeyChain {
    mnemonic: Zeroizing<String>,
    seed: Zeroizing<[u8; SEED_LEN]>,
    bitcoin: Generator,
    internal: Generator,
    external: Generator,
}

impl KeyChain {
    pub fn from_mnemonic(mnemonic: &str, passphrase: &str) -> Result<Self, WalletError> {
        let seed = seed_from_mnemonic(mnemonic, passphrase)?;
        Ok(Self::from_parts(mnemonic.to_string(), *seed))
    }

    fn from_parts(mnemonic: String, seed: [u8; SEED_LEN]) -> Self {
        let seed = Zeroizing::new(seed);
        Self {
            mnemonic: Zeroizing::new(mnemonic),
            bitcoin: Generator::from_seed(&seed, Lineage::Bitcoin),
            internal: Generator::from_seed(&seed, Lineage::Internal),
            external: Generator::from_seed(&seed, Lineage::External),
            seed,
        }
    }

    /// `seed ++ mnemonic`, the plaintext sealed in the keystore.
    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(SEED_LEN + self.mnemonic.len()));
        bytes.extend_from_slice(self.seed.as_ref());
        bytes.extend_from_slice(self.mnemonic.as_bytes());
        bytes
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        if bytes.len() < SEED_LEN {
            return Err(WalletError::Keystore("sealed secret is truncated".into()));
        }
        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(&bytes[..SEED_LEN]);
        let mnemonic = std::str::from_utf8(&bytes[SEED_LEN..])
            .map_err(|_| WalletError::Keystore("sealed mnemonic is not utf-8".into()))?
            .to_string();
        let chain = Self::from_parts(mnemonic, seed);
        seed.fill(0);
        Ok(chain)
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn generator(&self, lineage: Lineage) -> &Generator {
        match lineage {
            Lineage::Bitcoin => &self.bitcoin,
            Lineage::Internal => &self.internal,
            Lineage::External => &self.external,
        }
    }

    pub fn derive(&self, lineage: Lineage, index: u32) -> PrivateKey {
        self.generator(lineage).derive(index)
    }

    /// The private key that will own the coin blinded under
    /// `(claim_hash, blinding_nonce)`.
    pub fn derive_owner(&self, claim_hash: &Hash, blinding_nonce: &PublicKey) -> PrivateKey {
        let mut msg = [0u8; 64 + 13];
        msg[..13].copy_from_slice(b"hookpay/owner");
        msg[13..45].copy_from_slice(claim_hash.as_bytes());
        msg[45..].copy_from_slice(blinding_nonce.as_bytes());
        let wide = Zeroizing::new(hmac_sha512(self.seed.as_ref(), &msg));
        private_key_from_wide(&wide)
    }

    /// The blinding secret for the coin request under
    /// `(claim_hash, blinding_nonce)`.
    pub fn derive_blinding_secret(
        &self,
        claim_hash: &Hash,
        blinding_nonce: &PublicKey,
    ) -> Zeroizing<[u8; 32]> {
        let hash = hash_labeled(
            "hookpay/blinding-secret",
            &[
                &self.seed[..],
                claim_hash.as_bytes(),
                blinding_nonce.as_bytes(),
            ],
        );
        Zeroizing::new(hash.0)
    }
}
