//! HTTP client for the settlement custodian.
//!
//! JSON bodies over a REST-ish surface:
//!
//! | call | request |
//! |---|---|
//! | custodian info | `GET  /info` |
//! | signer nonces | `POST /nonces` `{ "count": n }` |
//! | claim | `POST /claim` |
//! | submit transfer | `POST /transfer` |
//! | coin lookup | `GET  /coin/{owner}` |
//! | transfer lookup | `GET  /transfer/{hash}` |
//! | bounties | `GET  /bounties/{claimant}` |
//! | bitcoin receives | `GET  /receives/{address}` |
//!
//! Non-2xx responses carry a [`SettlementError`] body; when they do not, one
//! is built from the status line.

use std::time::Duration;

use async_trait::async_trait;
use hookpay_messages::{
    Acknowledged, BitcoinReceive, Bounty, ClaimRequest, ClaimResponse, CustodianInfo,
    SettlementError, Transfer,
};
use hookpay_types::{AckSignature, Hash, PublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WalletError;
use crate::settlement::{SettlementApi, SettlementResult};

#[derive(Serialize)]
struct NoncesRequest {
    count: usize,
}

#[derive(Deserialize)]
struct NoncesResponse {
    nonces: Vec<PublicKey>,
}

#[derive(Deserialize)]
struct CoinLookupResponse {
    spent_by: Option<Hash>,
}

#[derive(Deserialize)]
struct TransferAck {
    acknowledgement: AckSignature,
}

/// [`SettlementApi`] over HTTP.
#[derive(Clone)]
pub struct HttpSettlement {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSettlement {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WalletError> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WalletError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> SettlementResult<T> {
        debug!(path, "settlement GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SettlementError::transport(format!("request failed: {e}")))?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SettlementResult<T> {
        debug!(path, "settlement POST");
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SettlementError::transport(format!("request failed: {e}")))?;
        decode(response).await
    }

    /// `GET` where a 404 means "no such thing".
    async fn lookup<T: DeserializeOwned>(&self, path: &str) -> SettlementResult<Option<T>> {
        match self.get(path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> SettlementResult<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| SettlementError::transport(format!("failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(serde_json::from_slice::<SettlementError>(&body).unwrap_or_else(|_| {
            SettlementError::new(
                status.as_u16(),
                status.canonical_reason().unwrap_or("HTTP_ERROR"),
                String::from_utf8_lossy(&body).into_owned(),
            )
        }));
    }

    serde_json::from_slice(&body).map_err(|e| {
        SettlementError::new(status.as_u16(), "INVALID_RESPONSE", format!("invalid JSON: {e}"))
    })
}

#[async_trait]
impl SettlementApi for HttpSettlement {
    async fn custodian_info(&self) -> SettlementResult<CustodianInfo> {
        self.get("/info").await
    }

    async fn gen_nonces(&self, count: usize) -> SettlementResult<Vec<PublicKey>> {
        let response: NoncesResponse = self.post("/nonces", &NoncesRequest { count }).await?;
        Ok(response.nonces)
    }

    async fn claim(&self, request: &ClaimRequest) -> SettlementResult<Acknowledged<ClaimResponse>> {
        self.post("/claim", request).await
    }

    async fn submit_transfer(&self, transfer: &Transfer) -> SettlementResult<AckSignature> {
        let response: TransferAck = self.post("/transfer", transfer).await?;
        Ok(response.acknowledgement)
    }

    async fn lookup_coin(&self, owner: &PublicKey) -> SettlementResult<Option<Hash>> {
        let response: Option<CoinLookupResponse> =
            self.lookup(&format!("/coin/{owner}")).await?;
        Ok(response.and_then(|r| r.spent_by))
    }

    async fn lookup_transfer(
        &self,
        hash: &Hash,
    ) -> SettlementResult<Option<Acknowledged<Transfer>>> {
        self.lookup(&format!("/transfer/{hash}")).await
    }

    async fn lookup_bounties(&self, claimant: &PublicKey) -> SettlementResult<Vec<Bounty>> {
        self.get(&format!("/bounties/{claimant}")).await
    }

    async fn fetch_bitcoin_receives(
        &self,
        address: &str,
    ) -> SettlementResult<Vec<BitcoinReceive>> {
        self.get(&format!("/receives/{address}")).await
    }
}
