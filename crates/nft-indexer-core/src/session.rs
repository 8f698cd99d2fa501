use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;

use crate::domain::{ConnectionState, ProviderEvent, ProviderEventKind, Session};
use crate::fetch::NftFetchWorkflow;
use crate::ports::{IndexerPort, PortError, ProviderSubscription, WalletProviderPort};
use crate::state_machine::{session_transition, SessionAction};

/// Wallet connection lifecycle.
///
/// Provider failures are logged and leave the session in a consistent
/// state; none of the public operations return them. Disconnects and chain
/// changes also reset the attached fetch workflow.
pub struct SessionManager<P, I>
where
    P: WalletProviderPort,
    I: IndexerPort,
{
    provider: Arc<P>,
    workflow: Arc<NftFetchWorkflow<I>>,
    expected_chain_id: u64,
    session: Mutex<Session>,
    subscription: Mutex<Option<ProviderSubscription>>,
    reloads: AtomicU64,
}

impl<P, I> SessionManager<P, I>
where
    P: WalletProviderPort,
    I: IndexerPort,
{
    pub fn new(provider: Arc<P>, workflow: Arc<NftFetchWorkflow<I>>, expected_chain_id: u64) -> Self {
        Self {
            provider,
            workflow,
            expected_chain_id,
            session: Mutex::new(Session::default()),
            subscription: Mutex::new(None),
            reloads: AtomicU64::new(0),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn workflow(&self) -> &Arc<NftFetchWorkflow<I>> {
        &self.workflow
    }

    pub fn snapshot(&self) -> Session {
        self.lock_session().clone()
    }

    /// Number of full resets triggered by chain changes.
    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Subscribes to provider events once. Calling it again while attached
    /// is a no-op.
    pub fn attach(&self) -> Result<(), PortError> {
        let mut g = self
            .subscription
            .lock()
            .map_err(|e| PortError::State(format!("subscription lock poisoned: {e}")))?;
        if g.is_none() {
            let subscription = self.provider.subscribe()?;
            tracing::debug!(id = subscription.id(), "subscribed to provider events");
            *g = Some(subscription);
        }
        Ok(())
    }

    /// Drops the provider subscription.
    pub fn detach(&self) {
        if let Ok(mut g) = self.subscription.lock() {
            if let Some(subscription) = g.take() {
                tracing::debug!(id = subscription.id(), "unsubscribed from provider events");
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    /// Applies every queued provider event. Returns how many were applied.
    pub fn process_events(&self) -> usize {
        let events: Vec<ProviderEvent> = match self.subscription.lock() {
            Ok(mut g) => match g.as_mut() {
                Some(subscription) => std::iter::from_fn(|| subscription.try_next()).collect(),
                None => Vec::new(),
            },
            Err(e) => {
                tracing::warn!("subscription lock poisoned: {e}");
                Vec::new()
            }
        };
        let applied = events.len();
        for event in events {
            tracing::debug!(sequence = event.sequence, "provider event");
            match event.kind {
                ProviderEventKind::AccountsChanged(accounts) => self.on_accounts_changed(&accounts),
                ProviderEventKind::ChainChanged(chain_id) => self.on_chain_changed(chain_id),
            }
        }
        applied
    }

    pub async fn request_connect(&self) -> Session {
        if self.snapshot().is_connected() {
            return self.snapshot();
        }

        if let Err(err) = self.provider.request_permissions().await {
            log_provider_failure("wallet_requestPermissions", &err);
            return self.snapshot();
        }

        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                log_provider_failure("eth_requestAccounts", &err);
                return self.snapshot();
            }
        };
        let Some(first) = accounts.first() else {
            tracing::warn!("provider granted access but returned no accounts");
            return self.snapshot();
        };

        let mut g = self.lock_session();
        match session_transition(g.state, SessionAction::Grant) {
            Ok((state, transition)) => {
                tracing::info!(address = %first, reason = transition.reason, "wallet connected");
                g.state = state;
                g.address = Some(first.to_string());
            }
            // Another connect finished while this one was awaiting the provider.
            Err(err) => tracing::debug!("{err}"),
        }
        g.clone()
    }

    pub async fn request_disconnect(&self) -> Session {
        if let Err(err) = self.provider.request_accounts().await {
            log_provider_failure("eth_requestAccounts", &err);
        }
        self.reset_fetch();

        let mut g = self.lock_session();
        if let Ok((state, transition)) = session_transition(g.state, SessionAction::Disconnect) {
            tracing::info!(reason = transition.reason, "wallet disconnected");
            g.state = state;
        }
        g.address = None;
        g.clone()
    }

    pub fn on_accounts_changed(&self, accounts: &[Address]) {
        let mut g = self.lock_session();
        match accounts.first() {
            Some(first) => {
                if let Ok((state, _)) = session_transition(g.state, SessionAction::AccountsChanged) {
                    g.state = state;
                }
                tracing::info!(address = %first, "accounts changed");
                g.address = Some(first.to_string());
            }
            None if g.state == ConnectionState::Connected => {
                if let Ok((state, transition)) =
                    session_transition(g.state, SessionAction::AccountsRevoked)
                {
                    tracing::info!(reason = transition.reason, "wallet disconnected");
                    g.state = state;
                }
                g.address = None;
                drop(g);
                self.reset_fetch();
            }
            None => {
                g.address = None;
            }
        }
    }

    /// Chain switches are not reconciled in place: everything resets to the
    /// initial state, as a page reload would.
    pub fn on_chain_changed(&self, chain_id: u64) {
        if chain_id != self.expected_chain_id {
            tracing::warn!(
                chain_id,
                expected = self.expected_chain_id,
                "wallet switched to an unsupported chain"
            );
        }
        tracing::info!(chain_id, "chain changed, resetting client state");
        self.reset_fetch();
        {
            let mut g = self.lock_session();
            if let Ok((state, _)) = session_transition(g.state, SessionAction::ChainChanged) {
                g.state = state;
            }
            g.address = None;
        }
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_fetch(&self) {
        if let Err(err) = self.workflow.reset() {
            tracing::warn!(error = %err, "failed to reset fetch state");
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("session lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn log_provider_failure(method: &str, err: &PortError) {
    if err.is_user_rejection() {
        tracing::warn!(method, "user rejected wallet request");
    } else {
        tracing::warn!(method, error = %err, "wallet request failed");
    }
}
