//! Beacon API HTTP client and the `StateStore` adapter built on top of it.
//!
//! Unlike a client that fetches individual named fields as JSON, this one
//! always pulls the full SSZ-encoded state: the query layer needs to be able
//! to prove an arbitrary field path, not just the handful a bespoke endpoint
//! happens to expose.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use ssz_merkle_core::error::CoreError;
use ssz_merkle_core::primitives::{Root, Slot, Version};
use ssz_merkle_core::query::{BlockId, StateStore};
use ssz_merkle_core::schema::{BeaconBlockHeader, BeaconState};
use ssz_merkle_core::ssz::SimpleSerialize;
use thiserror::Error;
use tracing::instrument;

/// Errors from the raw HTTP/JSON layer, before they're folded into
/// [`CoreError`] at the `StateStore` boundary.
#[derive(Debug, Error)]
pub enum BeaconClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("state not found for state_id {0}")]
    StateNotFound(String),

    #[error("header not found for block_id {0}")]
    HeaderNotFound(String),
}

/// Thin wrapper over the standard Beacon API, fetching SSZ-encoded states,
/// JSON headers, and fork versions.
#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: Client,
    base_url: String,
}

impl BeaconClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }

    /// `GET /eth/v2/debug/beacon/states/{state_id}` as raw SSZ bytes.
    #[instrument(skip(self))]
    pub async fn get_state_ssz(&self, state_id: &str) -> Result<Vec<u8>, BeaconClientError> {
        let url = format!("{}/eth/v2/debug/beacon/states/{state_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/octet-stream")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BeaconClientError::StateNotFound(state_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(BeaconClientError::InvalidResponse(format!(
                "unexpected status: {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// `GET /eth/v1/beacon/headers/{block_id}`.
    #[instrument(skip(self))]
    pub async fn get_header(&self, block_id: &str) -> Result<BeaconBlockHeader, BeaconClientError> {
        let url = format!("{}/eth/v1/beacon/headers/{block_id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BeaconClientError::HeaderNotFound(block_id.to_string()));
        }

        #[derive(Deserialize)]
        struct HeaderResponse {
            data: HeaderData,
        }
        #[derive(Deserialize)]
        struct HeaderData {
            header: HeaderMessageWrapper,
        }
        #[derive(Deserialize)]
        struct HeaderMessageWrapper {
            message: HeaderMessage,
        }
        #[derive(Deserialize)]
        struct HeaderMessage {
            slot: String,
            proposer_index: String,
            parent_root: String,
            state_root: String,
            body_root: String,
        }

        let resp: HeaderResponse = response.json().await?;
        let msg = resp.data.header.message;
        Ok(BeaconBlockHeader {
            slot: parse_u64(&msg.slot)?,
            proposer_index: parse_u64(&msg.proposer_index)?,
            parent_root: parse_hex32(&msg.parent_root)?,
            state_root: parse_hex32(&msg.state_root)?,
            body_root: parse_hex32(&msg.body_root)?,
        })
    }

    /// `GET /eth/v1/beacon/states/{state_id}/fork`, the current fork version
    /// that determines which gindex formulas apply.
    #[instrument(skip(self))]
    pub async fn get_fork(&self, state_id: &str) -> Result<Version, BeaconClientError> {
        let url = format!("{}/eth/v1/beacon/states/{state_id}/fork", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BeaconClientError::StateNotFound(state_id.to_string()));
        }

        #[derive(Deserialize)]
        struct ForkResponse {
            data: ForkData,
        }
        #[derive(Deserialize)]
        struct ForkData {
            current_version: String,
        }

        let resp: ForkResponse = response.json().await?;
        let bytes = parse_hex_vec(&resp.data.current_version)?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| BeaconClientError::InvalidResponse("fork version must be 4 bytes".to_string()))?;
        Ok(Version(arr))
    }
}

fn parse_u64(s: &str) -> Result<u64, BeaconClientError> {
    s.parse().map_err(|e| BeaconClientError::InvalidResponse(format!("invalid integer {s}: {e}")))
}

fn parse_hex_vec(s: &str) -> Result<Vec<u8>, BeaconClientError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| BeaconClientError::InvalidResponse(format!("invalid hex: {e}")))
}

fn parse_hex32(s: &str) -> Result<[u8; 32], BeaconClientError> {
    let bytes = parse_hex_vec(s)?;
    bytes.try_into().map_err(|_| BeaconClientError::InvalidResponse("expected 32 bytes".to_string()))
}

fn block_id_to_path_segment(block_id: BlockId) -> String {
    match block_id {
        BlockId::Head => "head".to_string(),
        BlockId::Genesis => "genesis".to_string(),
        BlockId::Finalized => "finalized".to_string(),
        BlockId::Justified => "justified".to_string(),
        BlockId::Slot(slot) => slot.to_string(),
        BlockId::Root(root) => root.to_string(),
    }
}

fn to_core_error(err: BeaconClientError, block_id: BlockId) -> CoreError {
    match err {
        BeaconClientError::StateNotFound(_) | BeaconClientError::HeaderNotFound(_) => {
            CoreError::NotFound { block_id: format!("{block_id:?}") }
        }
        BeaconClientError::Http(_) | BeaconClientError::InvalidResponse(_) => {
            CoreError::Internal(err.to_string())
        }
    }
}

/// `StateStore` backed by a live Beacon API node.
///
/// `StateStore` is a synchronous trait (the query façade it backs is meant
/// to be usable outside an async context), so this adapter drives its
/// internal async HTTP client against a handle to the ambient Tokio runtime.
/// Callers running inside an async handler should invoke it through
/// `tokio::task::spawn_blocking`.
pub struct HttpBeaconStore {
    client: BeaconClient,
    runtime: tokio::runtime::Handle,
}

impl HttpBeaconStore {
    /// # Panics
    /// Panics if called outside a Tokio runtime context, same as
    /// `Handle::current()`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: BeaconClient::new(base_url), runtime: tokio::runtime::Handle::current() }
    }
}

impl StateStore for HttpBeaconStore {
    fn state_at_slot(&self, block_id: BlockId) -> Result<(BeaconState, Version), CoreError> {
        let id = block_id_to_path_segment(block_id);
        self.runtime.block_on(async {
            let bytes = self.client.get_state_ssz(&id).await.map_err(|e| to_core_error(e, block_id))?;
            let state = BeaconState::deserialize(&bytes)?;
            let fork = self.client.get_fork(&id).await.map_err(|e| to_core_error(e, block_id))?;
            Ok((state, fork))
        })
    }

    fn header_at_slot(&self, block_id: BlockId) -> Result<BeaconBlockHeader, CoreError> {
        let id = block_id_to_path_segment(block_id);
        self.runtime
            .block_on(async { self.client.get_header(&id).await })
            .map_err(|e| to_core_error(e, block_id))
    }

    fn slot_of(&self, block_id: BlockId) -> Result<Slot, CoreError> {
        self.header_at_slot(block_id).map(|header| Slot(header.slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_state_ssz_returns_body_bytes() {
        let mock_server = MockServer::start().await;
        let ssz_bytes = vec![1, 2, 3, 4];
        Mock::given(method("GET"))
            .and(path("/eth/v2/debug/beacon/states/head"))
            .and(header("Accept", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(ssz_bytes.clone()))
            .mount(&mock_server)
            .await;

        let client = BeaconClient::new(mock_server.uri());
        let got = client.get_state_ssz("head").await.unwrap();
        assert_eq!(got, ssz_bytes);
    }

    #[tokio::test]
    async fn get_state_ssz_maps_404_to_state_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eth/v2/debug/beacon/states/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = BeaconClient::new(mock_server.uri());
        let err = client.get_state_ssz("999").await.unwrap_err();
        assert!(matches!(err, BeaconClientError::StateNotFound(_)));
    }

    #[tokio::test]
    async fn get_header_parses_message() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "data": {
                "header": {
                    "message": {
                        "slot": "100",
                        "proposer_index": "7",
                        "parent_root": "0x0101010101010101010101010101010101010101010101010101010101010101",
                        "state_root": "0x0202020202020202020202020202020202020202020202020202020202020202",
                        "body_root": "0x0303030303030303030303030303030303030303030303030303030303030303"
                    }
                }
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/eth/v1/beacon/headers/100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let client = BeaconClient::new(mock_server.uri());
        let header = client.get_header("100").await.unwrap();
        assert_eq!(header.slot, 100);
        assert_eq!(header.proposer_index, 7);
        assert_eq!(header.parent_root[0], 0x01);
    }

    #[tokio::test]
    async fn get_fork_parses_current_version() {
        let mock_server = MockServer::start().await;
        let body = r#"{"data": {"current_version": "0x04000000"}}"#;
        Mock::given(method("GET"))
            .and(path("/eth/v1/beacon/states/head/fork"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let client = BeaconClient::new(mock_server.uri());
        let fork = client.get_fork("head").await.unwrap();
        assert_eq!(fork.0, [0x04, 0, 0, 0]);
    }

    #[test]
    fn block_id_path_segments_match_named_and_numeric_forms() {
        assert_eq!(block_id_to_path_segment(BlockId::Head), "head");
        assert_eq!(block_id_to_path_segment(BlockId::Slot(42)), "42");
        assert_eq!(block_id_to_path_segment(BlockId::Root(Root([0xab; 32]))), Root([0xab; 32]).to_string());
    }
}
