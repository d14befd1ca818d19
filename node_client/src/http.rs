//! `reqwest` implementation of [`NodeApi`].

use std::time::Duration;

use async_trait::async_trait;
use modulr_types::{SignedTransaction, TxId};
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use crate::api::{AccountState, NodeApi, TxLookup};
use crate::NodeError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse and check a node base URL. Only `http` and `https` are accepted.
pub fn parse_node_url(node_url: &str) -> Result<Url, NodeError> {
    let url = Url::parse(node_url.trim())
        .map_err(|e| NodeError::InvalidUrl(format!("{node_url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(NodeError::InvalidUrl(format!(
            "{node_url}: expected an http(s) URL"
        )));
    }
    Ok(url)
}

/// HTTP client for a Modulr node's REST API.
#[derive(Clone, Debug)]
pub struct HttpNodeClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpNodeClient {
    /// Create a client for `node_url` (e.g. `http://localhost:7332`). Every
    /// request is bounded by `timeout`.
    pub fn new(node_url: &str, timeout: Duration) -> Result<Self, NodeError> {
        let base = parse_node_url(node_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| NodeError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, base })
    }

    /// The configured base URL.
    pub fn node_url(&self) -> &str {
        self.base.as_str()
    }

    /// `{base}/{segments...}`, each segment percent-encoded. Trailing slashes
    /// on the base are ignored.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, NodeError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| NodeError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn error_from(response: reqwest::Response) -> NodeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        NodeError::Status { status, body }
    }
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn fetch_account(&self, account: &str) -> Result<AccountState, NodeError> {
        let url = self.endpoint(&["account", account])?;
        debug!(%url, "fetching account");
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json().await?)
    }

    async fn submit_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<serde_json::Value, NodeError> {
        let url = self.endpoint(&["transaction"])?;
        debug!(%url, nonce = tx.draft.nonce, "submitting transaction");
        let response = self.http.post(url).json(tx).send().await?;
        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            warn!(error = %err, "node rejected transaction");
            return Err(err);
        }
        Ok(response.json().await?)
    }

    async fn fetch_transaction(&self, id: &TxId) -> Result<TxLookup, NodeError> {
        let url = self.endpoint(&["transaction", &id.to_hex()])?;
        debug!(%url, "looking up transaction");
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(TxLookup::not_found());
        }
        if !response.status().is_success() {
            return match Self::error_from(response).await {
                NodeError::Status { body, .. } if body.to_ascii_lowercase().contains("not found") => {
                    Ok(TxLookup::not_found())
                }
                err => Err(err),
            };
        }
        TxLookup::from_response(response.json().await?)
    }
}
