#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

use nft_indexer_core::ports::{
    ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, USER_REJECTED_CODE, WALLET_REQUEST_PERMISSIONS,
};
use nft_indexer_core::{
    Asset, IndexerPort, ListenerRegistry, NftFetchWorkflow, OwnedAssetCollection, PortError,
    ProviderSubscription, SessionManager, TokenType, WalletProviderPort,
};

#[derive(Debug, Default)]
pub struct MockProvider {
    pub accounts: Mutex<Vec<Address>>,
    pub reject_permissions: AtomicBool,
    pub fail_accounts: AtomicBool,
    pub calls: Mutex<Vec<String>>,
    pub registry: ListenerRegistry,
}

impl MockProvider {
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl WalletProviderPort for MockProvider {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, PortError> {
        self.calls.lock().expect("calls lock").push(method.to_owned());
        match method {
            WALLET_REQUEST_PERMISSIONS => {
                if self.reject_permissions.load(Ordering::SeqCst) {
                    return Err(PortError::Rejected {
                        code: USER_REJECTED_CODE,
                        message: "User rejected the request.".to_owned(),
                    });
                }
                Ok(serde_json::json!([{ "parentCapability": "eth_accounts" }]))
            }
            ETH_REQUEST_ACCOUNTS => {
                if self.fail_accounts.load(Ordering::SeqCst) {
                    return Err(PortError::Transport("wallet unavailable".to_owned()));
                }
                let accounts = self.accounts.lock().expect("accounts lock");
                Ok(serde_json::json!(accounts
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()))
            }
            ETH_CHAIN_ID => Ok(serde_json::json!("0x1")),
            _ => Err(PortError::NotImplemented("mock provider method")),
        }
    }

    fn subscribe(&self) -> Result<ProviderSubscription, PortError> {
        self.registry.subscribe()
    }
}

#[derive(Debug, Default)]
pub struct MockIndexer {
    pub assets: Vec<Asset>,
    pub owner_delay: HashMap<String, Duration>,
    /// Delay applied to the metadata lookup of the asset at each index.
    pub metadata_delay: Vec<Duration>,
    pub fail_owner: bool,
    pub fail_metadata_token: Option<String>,
    pub owner_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub metadata_completed: AtomicUsize,
}

impl MockIndexer {
    pub fn with_assets(count: u8) -> Self {
        Self {
            assets: (1..=count).map(asset).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl IndexerPort for MockIndexer {
    async fn get_nfts_for_owner(&self, owner: &str) -> Result<OwnedAssetCollection, PortError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.owner_delay.get(owner) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_owner {
            return Err(PortError::Transport("indexer returned 500".to_owned()));
        }
        Ok(OwnedAssetCollection {
            assets: self.assets.clone(),
            total_count: self.assets.len() as u64,
            page_key: None,
        })
    }

    async fn get_nft_metadata(
        &self,
        contract_address: Address,
        token_id: &str,
    ) -> Result<Asset, PortError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let index = self
            .assets
            .iter()
            .position(|a| a.contract_address == contract_address && a.token_id == token_id)
            .ok_or_else(|| PortError::NotFound(format!("{contract_address}/{token_id}")))?;
        if let Some(delay) = self.metadata_delay.get(index) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_metadata_token.as_deref() == Some(token_id) {
            return Err(PortError::Transport("metadata lookup failed".to_owned()));
        }
        self.metadata_completed.fetch_add(1, Ordering::SeqCst);
        let mut asset = self.assets[index].clone();
        asset.description = Some(format!("metadata for #{token_id}"));
        Ok(asset)
    }
}

pub fn asset(n: u8) -> Asset {
    Asset {
        contract_address: Address::with_last_byte(n),
        token_id: n.to_string(),
        title: format!("Piggy #{n}"),
        token_type: TokenType::Erc721,
        description: None,
        image_uri: Some(format!("ipfs://piggies/{n}.png")),
    }
}

pub fn account(n: u8) -> Address {
    Address::with_last_byte(n)
}

pub type TestSession = SessionManager<MockProvider, MockIndexer>;

pub fn new_session(provider: MockProvider, indexer: MockIndexer) -> TestSession {
    let workflow = Arc::new(NftFetchWorkflow::new(Arc::new(indexer)));
    SessionManager::new(Arc::new(provider), workflow, 1)
}

/// Yields until `cond` holds; the mocks only advance when polled.
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
