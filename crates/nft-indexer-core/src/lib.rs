pub mod domain;
pub mod fetch;
pub mod ports;
pub mod session;
pub mod state_machine;

pub use domain::{
    explorer_url, Asset, ConnectionState, FetchState, FetchStatus, FetchSummary,
    OwnedAssetCollection, ProviderEvent, ProviderEventKind, Session, TokenType,
};
pub use fetch::NftFetchWorkflow;
pub use ports::{
    IndexerPort, ListenerRegistry, PortError, ProviderSubscription, WalletProviderPort,
};
pub use session::SessionManager;
pub use state_machine::{
    fetch_transition, session_transition, FetchAction, SessionAction, StateTransition,
};
