use alloy::primitives::Address;
use async_trait::async_trait;

use nft_indexer_core::{Asset, IndexerPort, OwnedAssetCollection, PortError};

use crate::{AlchemyAdapter, InMemoryIndexer, IndexerConfig};

/// Indexer selected from configuration at startup.
#[derive(Debug, Clone)]
pub enum IndexerAdapter {
    Alchemy(AlchemyAdapter),
    InMemory(InMemoryIndexer),
}

impl IndexerAdapter {
    /// Alchemy when an API key is configured. Without one, the development
    /// profile falls back to the in-memory sample collection owned by
    /// `sample_owner`; production fails.
    pub fn from_config(config: &IndexerConfig, sample_owner: Address) -> Result<Self, PortError> {
        match AlchemyAdapter::with_config(config) {
            Ok(adapter) => Ok(Self::Alchemy(adapter)),
            Err(err) if config.strict_runtime_required() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "using in-memory sample indexer");
                Ok(Self::InMemory(InMemoryIndexer::with_sample_collection(
                    sample_owner,
                )))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Alchemy(_) => "alchemy",
            Self::InMemory(_) => "in-memory",
        }
    }
}

#[async_trait]
impl IndexerPort for IndexerAdapter {
    async fn get_nfts_for_owner(&self, owner: &str) -> Result<OwnedAssetCollection, PortError> {
        match self {
            Self::Alchemy(adapter) => adapter.get_nfts_for_owner(owner).await,
            Self::InMemory(adapter) => adapter.get_nfts_for_owner(owner).await,
        }
    }

    async fn get_nft_metadata(
        &self,
        contract_address: Address,
        token_id: &str,
    ) -> Result<Asset, PortError> {
        match self {
            Self::Alchemy(adapter) => adapter.get_nft_metadata(contract_address, token_id).await,
            Self::InMemory(adapter) => adapter.get_nft_metadata(contract_address, token_id).await,
        }
    }
}
