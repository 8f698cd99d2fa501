//! NFT fetch workflow.
//!
//! One owner lookup, then one metadata lookup per owned token joined
//! all-or-nothing. Every fetch carries a generation number and a
//! cancellation token; starting a new fetch (or resetting) cancels the
//! previous one, and results whose generation is no longer current are
//! dropped instead of being written back.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::domain::{Asset, FetchState, FetchSummary, OwnedAssetCollection};
use crate::ports::{IndexerPort, PortError};
use crate::state_machine::{fetch_transition, FetchAction};

struct Inner {
    state: FetchState,
    active: Option<CancellationToken>,
}

pub struct NftFetchWorkflow<I>
where
    I: IndexerPort,
{
    indexer: Arc<I>,
    inner: Mutex<Inner>,
}

impl<I> NftFetchWorkflow<I>
where
    I: IndexerPort,
{
    pub fn new(indexer: Arc<I>) -> Self {
        Self {
            indexer,
            inner: Mutex::new(Inner {
                state: FetchState::default(),
                active: None,
            }),
        }
    }

    pub fn indexer(&self) -> &Arc<I> {
        &self.indexer
    }

    pub fn snapshot(&self) -> Result<FetchState, PortError> {
        Ok(self.lock()?.state.clone())
    }

    pub async fn fetch_owned_assets(&self, address: &str) -> Result<FetchSummary, PortError> {
        let owner = address.trim().to_owned();
        let (generation, token) = self.begin()?;
        tracing::info!(%owner, generation, "fetching owned assets");

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(PortError::Cancelled),
            result = self.lookup(&owner) => result,
        };

        self.finish(generation, outcome)
    }

    /// Cancels the outstanding fetch, if any. Its results will be discarded.
    pub fn cancel(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if let Some(token) = g.active.take() {
            token.cancel();
            g.state.generation = g.state.generation.saturating_add(1);
            let (status, transition) = fetch_transition(g.state.status, FetchAction::Cancel)?;
            tracing::debug!(?transition, "fetch cancelled");
            g.state.status = status;
        }
        Ok(())
    }

    /// Cancels any outstanding fetch and clears results and the has-fetched flag.
    pub fn reset(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if let Some(token) = g.active.take() {
            token.cancel();
        }
        let (status, _) = fetch_transition(g.state.status, FetchAction::Reset)?;
        g.state = FetchState {
            status,
            generation: g.state.generation.saturating_add(1),
            ..FetchState::default()
        };
        Ok(())
    }

    fn begin(&self) -> Result<(u64, CancellationToken), PortError> {
        let mut g = self.lock()?;
        if let Some(previous) = g.active.take() {
            tracing::debug!(
                generation = g.state.generation,
                "superseding outstanding fetch"
            );
            previous.cancel();
        }
        let (status, _) = fetch_transition(g.state.status, FetchAction::Start)?;
        let generation = g.state.generation.saturating_add(1);
        g.state = FetchState {
            status,
            generation,
            ..FetchState::default()
        };
        let token = CancellationToken::new();
        g.active = Some(token.clone());
        Ok((generation, token))
    }

    async fn lookup(
        &self,
        owner: &str,
    ) -> Result<(OwnedAssetCollection, Vec<Asset>), PortError> {
        let collection = self.indexer.get_nfts_for_owner(owner).await?;
        let metadata = try_join_all(collection.assets.iter().map(|asset| {
            self.indexer
                .get_nft_metadata(asset.contract_address, &asset.token_id)
        }))
        .await?;
        Ok((collection, metadata))
    }

    fn finish(
        &self,
        generation: u64,
        outcome: Result<(OwnedAssetCollection, Vec<Asset>), PortError>,
    ) -> Result<FetchSummary, PortError> {
        let mut g = self.lock()?;
        if g.state.generation != generation {
            tracing::debug!(
                generation,
                current = g.state.generation,
                "discarding stale fetch result"
            );
            return Err(PortError::Cancelled);
        }
        g.active = None;

        match outcome {
            Ok((collection, metadata)) => {
                let (status, transition) =
                    fetch_transition(g.state.status, FetchAction::Complete)?;
                let summary = FetchSummary {
                    generation,
                    owned: collection.len(),
                    metadata_resolved: metadata.len(),
                };
                tracing::info!(
                    owned = summary.owned,
                    total = collection.total_count,
                    reason = transition.reason,
                    "fetch completed"
                );
                g.state.status = status;
                g.state.collection = Some(collection);
                g.state.metadata = metadata;
                g.state.has_fetched = true;
                g.state.error = None;
                Ok(summary)
            }
            Err(PortError::Cancelled) => {
                let (status, _) = fetch_transition(g.state.status, FetchAction::Cancel)?;
                g.state.status = status;
                Err(PortError::Cancelled)
            }
            Err(err) => {
                let (status, _) = fetch_transition(g.state.status, FetchAction::Fail)?;
                tracing::warn!(error = %err, generation, "fetch failed");
                g.state.status = status;
                g.state.collection = None;
                g.state.metadata = Vec::new();
                g.state.has_fetched = false;
                g.state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, PortError> {
        self.inner
            .lock()
            .map_err(|e| PortError::State(format!("fetch state lock poisoned: {e}")))
    }
}
