//! Alchemy NFT API (v3) client.
//!
//! Endpoints:
//! - `GET {base}/nft/v3/{apiKey}/getNFTsForOwner?owner=..&withMetadata=true`
//! - `GET {base}/nft/v3/{apiKey}/getNFTMetadata?contractAddress=..&tokenId=..`
//!
//! Only the first page of owned NFTs is requested; `pageKey` is recorded
//! but never followed.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use nft_indexer_core::{Asset, IndexerPort, OwnedAssetCollection, PortError, TokenType};

use crate::IndexerConfig;

#[derive(Debug, Clone)]
pub struct AlchemyAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedNftsResponse {
    owned_nfts: Vec<NftRecord>,
    #[serde(default)]
    total_count: u64,
    page_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NftRecord {
    contract: ContractRecord,
    token_id: String,
    token_type: Option<TokenType>,
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    image: Option<ImageRecord>,
    raw: Option<RawRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractRecord {
    address: Address,
    name: Option<String>,
    token_type: Option<TokenType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageRecord {
    cached_url: Option<String>,
    original_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    metadata: Value,
}

impl NftRecord {
    fn into_asset(self) -> Asset {
        let image_uri = self
            .raw
            .as_ref()
            .and_then(|raw| raw.metadata.get("image"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .and_then(non_empty)
            .or_else(|| {
                self.image.as_ref().and_then(|image| {
                    image
                        .original_url
                        .clone()
                        .and_then(non_empty)
                        .or_else(|| image.cached_url.clone().and_then(non_empty))
                })
            });
        let title = self
            .name
            .and_then(non_empty)
            .or_else(|| self.title.and_then(non_empty))
            .or_else(|| self.contract.name.clone().and_then(non_empty))
            .unwrap_or_default();

        Asset {
            contract_address: self.contract.address,
            token_id: self.token_id,
            title,
            token_type: self
                .token_type
                .or(self.contract.token_type)
                .unwrap_or(TokenType::Unknown),
            description: self.description.and_then(non_empty),
            image_uri,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

impl AlchemyAdapter {
    pub fn with_config(config: &IndexerConfig) -> Result<Self, PortError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PortError::Policy("NFT_INDEXER_API_KEY is not configured".to_owned())
        })?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: config.indexer_base_url(),
            api_key,
            client,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/nft/v3/{}/{}", self.base_url, self.api_key, name)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PortError> {
        tracing::debug!(endpoint, "indexer request");
        let response = self
            .client
            .get(self.endpoint(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("{endpoint} request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(PortError::NotFound(format!("{endpoint}: {body}")));
            }
            return Err(PortError::Transport(format!(
                "{endpoint} status {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("{endpoint} json decode failed: {e}")))
    }
}

#[async_trait]
impl IndexerPort for AlchemyAdapter {
    async fn get_nfts_for_owner(&self, owner: &str) -> Result<OwnedAssetCollection, PortError> {
        let response: OwnedNftsResponse = self
            .get_json(
                "getNFTsForOwner",
                &[("owner", owner), ("withMetadata", "true")],
            )
            .await?;
        Ok(OwnedAssetCollection {
            assets: response
                .owned_nfts
                .into_iter()
                .map(NftRecord::into_asset)
                .collect(),
            total_count: response.total_count,
            page_key: response.page_key,
        })
    }

    async fn get_nft_metadata(
        &self,
        contract_address: Address,
        token_id: &str,
    ) -> Result<Asset, PortError> {
        let contract = contract_address.to_string();
        let record: NftRecord = self
            .get_json(
                "getNFTMetadata",
                &[("contractAddress", contract.as_str()), ("tokenId", token_id)],
            )
            .await?;
        Ok(record.into_asset())
    }
}
