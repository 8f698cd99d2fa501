use crate::domain::{ConnectionState, FetchStatus};
use crate::ports::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Grant,
    Disconnect,
    AccountsChanged,
    AccountsRevoked,
    ChainChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAction {
    Start,
    Complete,
    Fail,
    Cancel,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition<S> {
    pub from: S,
    pub to: S,
    pub reason: &'static str,
}

pub fn session_transition(
    from: ConnectionState,
    action: SessionAction,
) -> Result<(ConnectionState, StateTransition<ConnectionState>), PortError> {
    use ConnectionState::{Connected, Disconnected};

    let (to, reason) = match (from, action) {
        (Disconnected, SessionAction::Grant) => (Connected, "permission granted"),
        (_, SessionAction::Disconnect) => (Disconnected, "user disconnect"),
        (state, SessionAction::AccountsChanged) => (state, "accounts changed"),
        (_, SessionAction::AccountsRevoked) => (Disconnected, "accounts revoked"),
        (_, SessionAction::ChainChanged) => (Disconnected, "chain changed, full reset"),
        (Connected, SessionAction::Grant) => {
            return Err(PortError::State(format!(
                "illegal session transition: {from:?} + {action:?}"
            )))
        }
    };
    Ok((to, StateTransition { from, to, reason }))
}

pub fn fetch_transition(
    from: FetchStatus,
    action: FetchAction,
) -> Result<(FetchStatus, StateTransition<FetchStatus>), PortError> {
    use FetchStatus::{Failed, Fetching, Idle, Ready};

    let (to, reason) = match (from, action) {
        (_, FetchAction::Start) => (Fetching, "fetch started"),
        (Fetching, FetchAction::Complete) => (Ready, "fetch completed"),
        (Fetching, FetchAction::Fail) => (Failed, "fetch failed"),
        (Fetching, FetchAction::Cancel) => (Idle, "fetch superseded"),
        (_, FetchAction::Reset) => (Idle, "fetch state reset"),
        (Idle | Ready | Failed, FetchAction::Complete | FetchAction::Fail | FetchAction::Cancel) => {
            return Err(PortError::State(format!(
                "illegal fetch transition: {from:?} + {action:?}"
            )))
        }
    };
    Ok((to, StateTransition { from, to, reason }))
}
