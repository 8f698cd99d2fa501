use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use async_trait::async_trait;

use nft_indexer_core::{Asset, IndexerPort, OwnedAssetCollection, PortError, TokenType};

/// Indexer backed by a fixed owner → assets table. Owner keys are matched
/// case-insensitively; unknown owners own nothing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndexer {
    owners: Arc<Mutex<HashMap<String, Vec<Asset>>>>,
}

impl InMemoryIndexer {
    pub fn insert(&self, owner: &str, assets: Vec<Asset>) -> Result<(), PortError> {
        self.owners
            .lock()
            .map_err(|e| PortError::State(format!("in-memory indexer lock poisoned: {e}")))?
            .insert(owner.to_lowercase(), assets);
        Ok(())
    }

    /// Fixture used when no indexer credential is configured: the default
    /// deterministic wallet owns three sample tokens.
    pub fn with_sample_collection(owner: Address) -> Self {
        let indexer = Self::default();
        let assets = (1..=3u8)
            .map(|n| Asset {
                contract_address: Address::with_last_byte(0xA0 + n),
                token_id: n.to_string(),
                title: format!("Sample Piggy #{n}"),
                token_type: TokenType::Erc721,
                description: Some("Offline sample token".to_owned()),
                image_uri: None,
            })
            .collect();
        if let Ok(mut owners) = indexer.owners.lock() {
            owners.insert(owner.to_string().to_lowercase(), assets);
        }
        indexer
    }

    fn owned(&self, owner: &str) -> Result<Vec<Asset>, PortError> {
        let owners = self
            .owners
            .lock()
            .map_err(|e| PortError::State(format!("in-memory indexer lock poisoned: {e}")))?;
        Ok(owners.get(&owner.to_lowercase()).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl IndexerPort for InMemoryIndexer {
    async fn get_nfts_for_owner(&self, owner: &str) -> Result<OwnedAssetCollection, PortError> {
        let assets = self.owned(owner)?;
        Ok(OwnedAssetCollection {
            total_count: assets.len() as u64,
            assets,
            page_key: None,
        })
    }

    async fn get_nft_metadata(
        &self,
        contract_address: Address,
        token_id: &str,
    ) -> Result<Asset, PortError> {
        let owners = self
            .owners
            .lock()
            .map_err(|e| PortError::State(format!("in-memory indexer lock poisoned: {e}")))?;
        owners
            .values()
            .flatten()
            .find(|a| a.contract_address == contract_address && a.token_id == token_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("{contract_address}/{token_id}")))
    }
}
