//! Bridge between the egui shell and the indexer workspace crates.
//! This must remain the only shell-facing boundary for wallet and fetch operations.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use nft_indexer_adapters::eip1193::DETERMINISTIC_ACCOUNT;
use nft_indexer_adapters::{Eip1193Adapter, IndexerAdapter, IndexerConfig};
use nft_indexer_core::{FetchState, NftFetchWorkflow, PortError, Session, SessionManager};

type IndexerSession = SessionManager<Eip1193Adapter, IndexerAdapter>;

#[derive(Clone)]
pub struct IndexerBridge {
    session: Arc<IndexerSession>,
    explorer_base_url: String,
    poll_interval: Duration,
}

impl IndexerBridge {
    pub fn from_config(config: &IndexerConfig) -> Result<Self, PortError> {
        let provider = Eip1193Adapter::with_config(config.clone());
        let indexer = IndexerAdapter::from_config(config, DETERMINISTIC_ACCOUNT)?;
        tracing::info!(
            provider = provider.mode_label(),
            indexer = indexer.label(),
            network = %config.network,
            "indexer bridge ready"
        );

        let workflow = Arc::new(NftFetchWorkflow::new(Arc::new(indexer)));
        let session = SessionManager::new(Arc::new(provider), workflow, config.expected_chain_id);
        Ok(Self {
            session: Arc::new(session),
            explorer_base_url: config.explorer_base_url.clone(),
            poll_interval: Duration::from_millis(config.provider_poll_interval_ms.max(100)),
        })
    }

    pub fn explorer_base_url(&self) -> &str {
        &self.explorer_base_url
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.session
            .workflow()
            .snapshot()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "fetch state unavailable");
                FetchState::default()
            })
    }

    pub fn connect(&self, handle: &Handle, ctx: &egui::Context) {
        let session = Arc::clone(&self.session);
        let ctx = ctx.clone();
        handle.spawn(async move {
            session.request_connect().await;
            ctx.request_repaint();
        });
    }

    pub fn disconnect(&self, handle: &Handle, ctx: &egui::Context) {
        let session = Arc::clone(&self.session);
        let ctx = ctx.clone();
        handle.spawn(async move {
            session.request_disconnect().await;
            ctx.request_repaint();
        });
    }

    pub fn fetch(&self, handle: &Handle, ctx: &egui::Context, address: String) {
        let session = Arc::clone(&self.session);
        let task_ctx = ctx.clone();
        handle.spawn(async move {
            match session.workflow().fetch_owned_assets(&address).await {
                Ok(summary) => tracing::info!(
                    owned = summary.owned,
                    metadata = summary.metadata_resolved,
                    "assets ready"
                ),
                Err(PortError::Cancelled) => tracing::debug!("fetch superseded"),
                Err(err) => tracing::warn!(error = %err, "fetch failed"),
            }
            task_ctx.request_repaint();
        });
        // Show the cleared grid and spinner right away.
        ctx.request_repaint();
    }

    /// Subscribes to wallet events once and applies them on a background
    /// task. Aborting the returned handle and calling [`Self::shutdown`]
    /// releases the subscription.
    pub fn start_event_pump(&self, handle: &Handle, ctx: &egui::Context) -> Option<JoinHandle<()>> {
        if let Err(err) = self.session.attach() {
            tracing::warn!(error = %err, "wallet events unavailable");
            return None;
        }

        let session = Arc::clone(&self.session);
        let ctx = ctx.clone();
        let poll_interval = self.poll_interval;
        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                if let Err(err) = session.provider().poll().await {
                    tracing::debug!(error = %err, "wallet poll failed");
                }
                if session.process_events() > 0 {
                    ctx.request_repaint();
                }
            }
        }))
    }

    pub fn shutdown(&self) {
        self.session.detach();
        if let Err(err) = self.session.workflow().cancel() {
            tracing::warn!(error = %err, "failed to cancel fetch on shutdown");
        }
    }
}
