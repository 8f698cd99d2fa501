use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

use nft_indexer_core::ports::{
    json_chain_id_to_u64, parse_accounts, ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS,
    USER_REJECTED_CODE, WALLET_REQUEST_PERMISSIONS,
};
use nft_indexer_core::{
    ListenerRegistry, PortError, ProviderEventKind, ProviderSubscription, WalletProviderPort,
};

use crate::IndexerConfig;

/// EIP-1193 `4200`: the provider does not support the method.
const UNSUPPORTED_METHOD_CODE: i64 = 4200;

/// Account held by the deterministic wallet unless told otherwise.
pub const DETERMINISTIC_ACCOUNT: Address = Address::with_last_byte(1);

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    listeners: ListenerRegistry,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    permitted: bool,
    reject_requests: bool,
    request_seq: u64,
    /// Accounts and chain seen by the last proxy poll. `None` until the
    /// first poll, which only records a baseline.
    observed: Option<(Vec<Address>, u64)>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec![DETERMINISTIC_ACCOUNT],
            chain_id: 1,
            permitted: false,
            reject_requests: false,
            request_seq: 0,
            observed: None,
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(IndexerConfig::default())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: IndexerConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.request_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                    "failed to initialize EIP-1193 proxy client in production profile: {e}"
                )),
                Err(e) => {
                    tracing::warn!(
                        "EIP-1193 proxy client unavailable, using deterministic wallet: {e}"
                    );
                    ProviderMode::Deterministic
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        let state = ProviderState {
            chain_id: config.expected_chain_id,
            ..ProviderState::default()
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(state)),
            listeners: ListenerRegistry::default(),
        }
    }

    /// In-memory wallet holding `accounts`, for tests and offline runs.
    pub fn deterministic(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState {
                accounts,
                chain_id,
                ..ProviderState::default()
            })),
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            ProviderMode::Disabled(_) => "disabled",
            ProviderMode::Deterministic => "deterministic",
            ProviderMode::Proxy(_) => "proxy",
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }

    /// Makes the deterministic wallet answer every request with a 4001 rejection.
    pub fn debug_set_reject_requests(&self, reject: bool) -> Result<(), PortError> {
        self.lock_state()?.reject_requests = reject;
        Ok(())
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.accounts = accounts.clone();
        self.listeners
            .emit(ProviderEventKind::AccountsChanged(accounts))?;
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock_state()?.chain_id = chain_id;
        self.listeners
            .emit(ProviderEventKind::ChainChanged(chain_id))?;
        Ok(())
    }

    /// Re-reads accounts and chain from the proxied wallet and emits change
    /// events for anything that differs from the last snapshot. The first
    /// poll records the snapshot and emits nothing. Returns the number of
    /// events emitted. Only the proxy mode has anything to poll.
    pub async fn poll(&self) -> Result<usize, PortError> {
        self.check_mode()?;
        if !matches!(self.mode, ProviderMode::Proxy(_)) {
            return Ok(0);
        }

        let accounts = self.proxy_call(ETH_ACCOUNTS, serde_json::json!([])).await?;
        let accounts = parse_accounts(&accounts)?;
        let chain_id = self.proxy_call(ETH_CHAIN_ID, serde_json::json!([])).await?;
        let chain_id = json_chain_id_to_u64(&chain_id)?;

        let (accounts_changed, chain_changed) = {
            let mut g = self.lock_state()?;
            let changes = match &g.observed {
                Some((seen_accounts, seen_chain)) => {
                    (*seen_accounts != accounts, *seen_chain != chain_id)
                }
                None => {
                    tracing::debug!(chain_id, "recorded initial wallet snapshot");
                    (false, false)
                }
            };
            g.observed = Some((accounts.clone(), chain_id));
            g.accounts = accounts.clone();
            g.chain_id = chain_id;
            changes
        };

        let mut emitted = 0;
        if accounts_changed {
            self.listeners
                .emit(ProviderEventKind::AccountsChanged(accounts))?;
            emitted += 1;
        }
        if chain_changed {
            self.listeners
                .emit(ProviderEventKind::ChainChanged(chain_id))?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::State(format!("provider lock poisoned: {e}")))
    }

    fn deterministic_request(&self, method: &str) -> Result<Value, PortError> {
        let mut g = self.lock_state()?;
        if g.reject_requests && method != ETH_CHAIN_ID && method != ETH_ACCOUNTS {
            return Err(PortError::Rejected {
                code: USER_REJECTED_CODE,
                message: "User rejected the request.".to_owned(),
            });
        }
        match method {
            WALLET_REQUEST_PERMISSIONS => {
                g.permitted = true;
                Ok(serde_json::json!([{
                    "parentCapability": "eth_accounts",
                    "invoker": "nft-indexer",
                    "caveats": [],
                }]))
            }
            ETH_REQUEST_ACCOUNTS => {
                g.permitted = true;
                Ok(accounts_json(&g.accounts))
            }
            ETH_ACCOUNTS if g.permitted => Ok(accounts_json(&g.accounts)),
            ETH_ACCOUNTS => Ok(serde_json::json!([])),
            ETH_CHAIN_ID => Ok(Value::String(format!("0x{:x}", g.chain_id))),
            other => Err(PortError::Rejected {
                code: UNSUPPORTED_METHOD_CODE,
                message: format!("unsupported method: {other}"),
            }),
        }
    }

    async fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let (proxy, id) = match &self.mode {
            ProviderMode::Proxy(proxy) => {
                let mut g = self.lock_state()?;
                g.request_seq = g.request_seq.saturating_add(1);
                (proxy, g.request_seq)
            }
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented(
                    "eip1193 proxy runtime not enabled",
                ))
            }
        };

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "eip1193 proxy request");
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }
}

#[async_trait]
impl WalletProviderPort for Eip1193Adapter {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Proxy(_) => self.proxy_call(method, params).await,
            _ => self.deterministic_request(method),
        }
    }

    fn subscribe(&self) -> Result<ProviderSubscription, PortError> {
        self.check_mode()?;
        self.listeners.subscribe()
    }
}

fn accounts_json(accounts: &[Address]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|a| Value::String(a.to_string()))
            .collect(),
    )
}

fn rpc_error(err: &Value) -> PortError {
    let code = err.get("code").and_then(Value::as_i64);
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown provider error")
        .to_owned();
    match code {
        Some(code) => PortError::Rejected { code, message },
        None => PortError::Transport(format!("eip1193 proxy returned error: {err}")),
    }
}
