use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Wallet connection as seen by the rendering layer.
///
/// `address` is always `Some` and non-empty while `state` is `Connected`.
/// A disconnected session may still carry an address delivered by an
/// `accountsChanged` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: ConnectionState,
    pub address: Option<String>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
    #[serde(other)]
    Unknown,
}

impl TokenType {
    pub fn label(&self) -> &'static str {
        match self {
            TokenType::Erc721 => "ERC721",
            TokenType::Erc1155 => "ERC1155",
            TokenType::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub contract_address: Address,
    pub token_id: String,
    pub title: String,
    pub token_type: TokenType,
    pub description: Option<String>,
    pub image_uri: Option<String>,
}

/// One page of assets owned by an address, replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedAssetCollection {
    pub assets: Vec<Asset>,
    pub total_count: u64,
    /// Cursor for the next upstream page. Recorded, never followed.
    pub page_key: Option<String>,
}

impl OwnedAssetCollection {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub status: FetchStatus,
    pub collection: Option<OwnedAssetCollection>,
    /// Per-token metadata, index-aligned with `collection.assets`.
    pub metadata: Vec<Asset>,
    pub has_fetched: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl FetchState {
    pub fn in_progress(&self) -> bool {
        self.status == FetchStatus::Fetching
    }

    /// Assets to render: empty unless the last fetch completed.
    pub fn displayed(&self) -> &[Asset] {
        match (&self.collection, self.has_fetched) {
            (Some(collection), true) => &collection.assets,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub generation: u64,
    pub owned: usize,
    pub metadata_resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
}

/// Block-explorer link for a contract: `<base>/<contract>`.
pub fn explorer_url(base: &str, contract: &Address) -> String {
    format!("{}/{}", base.trim_end_matches('/'), contract)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_url_joins_with_single_slash() {
        let contract: Address = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D"
            .parse()
            .expect("contract");
        let expected = "https://etherscan.io/address/0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";
        assert_eq!(explorer_url("https://etherscan.io/address", &contract), expected);
        assert_eq!(explorer_url("https://etherscan.io/address/", &contract), expected);
    }

    #[test]
    fn token_type_parses_upstream_labels() {
        let parsed: Vec<TokenType> =
            serde_json::from_str(r#"["ERC721","ERC1155","NO_SUPPORTED_NFT_STANDARD"]"#)
                .expect("token types");
        assert_eq!(
            parsed,
            vec![TokenType::Erc721, TokenType::Erc1155, TokenType::Unknown]
        );
    }

    #[test]
    fn displayed_is_empty_until_fetch_completes() {
        let mut state = FetchState {
            status: FetchStatus::Fetching,
            collection: Some(OwnedAssetCollection::default()),
            ..FetchState::default()
        };
        assert!(state.displayed().is_empty());
        assert!(state.in_progress());
        state.status = FetchStatus::Ready;
        state.has_fetched = true;
        assert!(!state.in_progress());
    }
}
