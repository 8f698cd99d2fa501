use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{Asset, OwnedAssetCollection, ProviderEvent, ProviderEventKind};

pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const WALLET_REQUEST_PERMISSIONS: &str = "wallet_requestPermissions";

/// EIP-1193 `4001`: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("provider rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("state error: {0}")]
    State(String),
}

impl PortError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, PortError::Rejected { code, .. } if *code == USER_REJECTED_CODE)
    }
}

#[async_trait]
pub trait WalletProviderPort: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;

    /// Registers a listener for `accountsChanged` / `chainChanged`.
    /// The listener is removed when the returned subscription is dropped.
    fn subscribe(&self) -> Result<ProviderSubscription, PortError>;

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        let result = self
            .request(ETH_REQUEST_ACCOUNTS, serde_json::json!([]))
            .await?;
        parse_accounts(&result)
    }

    async fn request_permissions(&self) -> Result<Value, PortError> {
        self.request(
            WALLET_REQUEST_PERMISSIONS,
            serde_json::json!([{ "eth_accounts": {} }]),
        )
        .await
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        let result = self.request(ETH_CHAIN_ID, serde_json::json!([])).await?;
        json_chain_id_to_u64(&result)
    }
}

#[async_trait]
pub trait IndexerPort: Send + Sync {
    async fn get_nfts_for_owner(&self, owner: &str) -> Result<OwnedAssetCollection, PortError>;
    async fn get_nft_metadata(
        &self,
        contract_address: Address,
        token_id: &str,
    ) -> Result<Asset, PortError>;
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport("accounts result must be array".to_owned()))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| PortError::Transport("account entry must be string".to_owned()))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

pub fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

pub fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    sequence: u64,
    listeners: BTreeMap<u64, mpsc::UnboundedSender<ProviderEvent>>,
}

/// Fan-out point adapters use to deliver provider events to subscribers.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ListenerRegistry {
    pub fn subscribe(&self) -> Result<ProviderSubscription, PortError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut g = self
            .inner
            .lock()
            .map_err(|e| PortError::State(format!("listener registry lock poisoned: {e}")))?;
        g.next_id = g.next_id.saturating_add(1);
        let id = g.next_id;
        g.listeners.insert(id, tx);
        Ok(ProviderSubscription {
            id,
            events: rx,
            registry: self.clone(),
        })
    }

    /// Stamps the event with the next sequence number and delivers it to
    /// every live listener. Returns the number of listeners reached.
    pub fn emit(&self, kind: ProviderEventKind) -> Result<usize, PortError> {
        let mut g = self
            .inner
            .lock()
            .map_err(|e| PortError::State(format!("listener registry lock poisoned: {e}")))?;
        g.sequence = g.sequence.saturating_add(1);
        let event = ProviderEvent {
            sequence: g.sequence,
            kind,
        };
        g.listeners
            .retain(|_, listener| listener.send(event.clone()).is_ok());
        Ok(g.listeners.len())
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|g| g.listeners.len()).unwrap_or(0)
    }

    fn remove(&self, id: u64) {
        if let Ok(mut g) = self.inner.lock() {
            g.listeners.remove(&id);
        }
    }
}

/// Live registration with a provider. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ProviderSubscription {
    id: u64,
    events: mpsc::UnboundedReceiver<ProviderEvent>,
    registry: ListenerRegistry,
}

impl ProviderSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn try_next(&mut self) -> Option<ProviderEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
