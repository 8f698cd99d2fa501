use alloy::primitives::Address;
use nft_indexer_core::{Asset, ConnectionState, OwnedAssetCollection, Session, TokenType};

#[test]
fn fresh_session_is_disconnected_without_address() {
    let session = Session::default();
    assert_eq!(session.state, ConnectionState::Disconnected);
    assert!(session.address.is_none());
    assert!(!session.is_connected());
}

#[test]
fn asset_serializes_contract_as_hex_and_token_type_as_upstream_label() {
    let asset = Asset {
        contract_address: "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D"
            .parse::<Address>()
            .expect("contract"),
        token_id: "42".to_owned(),
        title: "Bored Ape #42".to_owned(),
        token_type: TokenType::Erc721,
        description: None,
        image_uri: Some("ipfs://QmApe/42".to_owned()),
    };
    let json = serde_json::to_value(&asset).expect("serialize asset");
    assert_eq!(
        json["contract_address"]
            .as_str()
            .expect("address string")
            .to_lowercase(),
        "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"
    );
    assert_eq!(json["token_type"], "ERC721");
}

#[test]
fn collection_reports_length() {
    let collection = OwnedAssetCollection {
        assets: Vec::new(),
        total_count: 12,
        page_key: Some("next".to_owned()),
    };
    assert!(collection.is_empty());
    assert_eq!(collection.len(), 0);
    assert_eq!(collection.total_count, 12);
}
