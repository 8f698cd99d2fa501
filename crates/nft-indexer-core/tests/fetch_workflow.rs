mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use nft_indexer_core::{FetchStatus, NftFetchWorkflow, PortError};

use common::{wait_until, MockIndexer};

const OWNER: &str = "0x00000000000000000000000000000000000000aa";

#[tokio::test]
async fn zero_owned_tokens_completes_with_empty_collection() {
    let indexer = Arc::new(MockIndexer::with_assets(0));
    let workflow = NftFetchWorkflow::new(Arc::clone(&indexer));

    let summary = workflow.fetch_owned_assets(OWNER).await.expect("fetch");
    assert_eq!(summary.owned, 0);
    assert_eq!(summary.metadata_resolved, 0);
    assert_eq!(indexer.metadata_calls.load(Ordering::SeqCst), 0);

    let state = workflow.snapshot().expect("snapshot");
    assert!(!state.in_progress());
    assert!(state.has_fetched);
    assert_eq!(state.status, FetchStatus::Ready);
    assert!(state.displayed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn metadata_order_matches_owned_order() {
    let mut indexer = MockIndexer::with_assets(3);
    // Later tokens resolve first.
    indexer.metadata_delay = vec![
        Duration::from_millis(300),
        Duration::from_millis(200),
        Duration::from_millis(100),
    ];
    let indexer = Arc::new(indexer);
    let workflow = NftFetchWorkflow::new(Arc::clone(&indexer));

    let summary = workflow.fetch_owned_assets(OWNER).await.expect("fetch");
    assert_eq!(summary.owned, 3);
    assert_eq!(summary.metadata_resolved, 3);
    assert_eq!(indexer.owner_calls.load(Ordering::SeqCst), 1);
    assert_eq!(indexer.metadata_calls.load(Ordering::SeqCst), 3);

    let state = workflow.snapshot().expect("snapshot");
    let owned = &state.collection.as_ref().expect("collection").assets;
    assert_eq!(state.metadata.len(), owned.len());
    for (token, metadata) in owned.iter().zip(&state.metadata) {
        assert_eq!(token.contract_address, metadata.contract_address);
        assert_eq!(token.token_id, metadata.token_id);
    }
    assert_eq!(state.displayed().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn metadata_lookups_run_concurrently() {
    let mut indexer = MockIndexer::with_assets(3);
    indexer.metadata_delay = vec![Duration::from_secs(1); 3];
    let workflow = NftFetchWorkflow::new(Arc::new(indexer));

    let started = tokio::time::Instant::now();
    workflow.fetch_owned_assets(OWNER).await.expect("fetch");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn owner_lookup_failure_clears_in_progress() {
    let mut indexer = MockIndexer::with_assets(2);
    indexer.fail_owner = true;
    let workflow = NftFetchWorkflow::new(Arc::new(indexer));

    let err = workflow.fetch_owned_assets(OWNER).await.expect_err("must fail");
    assert!(matches!(err, PortError::Transport(_)));

    let state = workflow.snapshot().expect("snapshot");
    assert_eq!(state.status, FetchStatus::Failed);
    assert!(!state.in_progress());
    assert!(!state.has_fetched);
    assert!(state.collection.is_none());
    assert!(state.error.as_deref().unwrap_or_default().contains("500"));
}

#[tokio::test]
async fn single_metadata_failure_fails_whole_fetch() {
    let mut indexer = MockIndexer::with_assets(3);
    indexer.fail_metadata_token = Some("2".to_owned());
    let workflow = NftFetchWorkflow::new(Arc::new(indexer));

    workflow.fetch_owned_assets(OWNER).await.expect_err("must fail");

    let state = workflow.snapshot().expect("snapshot");
    assert_eq!(state.status, FetchStatus::Failed);
    assert!(state.metadata.is_empty());
    assert!(state.displayed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn new_fetch_clears_previous_results_before_data_arrives() {
    let mut indexer = MockIndexer::with_assets(3);
    indexer
        .owner_delay
        .insert("0xslow".to_owned(), Duration::from_secs(5));
    let indexer = Arc::new(indexer);
    let workflow = Arc::new(NftFetchWorkflow::new(Arc::clone(&indexer)));

    workflow.fetch_owned_assets(OWNER).await.expect("first fetch");
    assert_eq!(workflow.snapshot().expect("snapshot").displayed().len(), 3);

    let pending = tokio::spawn({
        let workflow = Arc::clone(&workflow);
        async move { workflow.fetch_owned_assets("0xslow").await }
    });
    wait_until(|| indexer.owner_calls.load(Ordering::SeqCst) == 2).await;

    let state = workflow.snapshot().expect("snapshot");
    assert!(state.in_progress());
    assert!(!state.has_fetched);
    assert!(state.collection.is_none());
    assert!(state.metadata.is_empty());

    pending.await.expect("join").expect("second fetch");
    let state = workflow.snapshot().expect("snapshot");
    assert!(!state.in_progress());
    assert_eq!(state.displayed().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_is_cancelled_and_never_overwrites() {
    let mut indexer = MockIndexer::with_assets(2);
    indexer
        .owner_delay
        .insert("0xslow".to_owned(), Duration::from_secs(5));
    let indexer = Arc::new(indexer);
    let workflow = Arc::new(NftFetchWorkflow::new(Arc::clone(&indexer)));

    let stale = tokio::spawn({
        let workflow = Arc::clone(&workflow);
        async move { workflow.fetch_owned_assets("0xslow").await }
    });
    wait_until(|| indexer.owner_calls.load(Ordering::SeqCst) == 1).await;

    let summary = workflow.fetch_owned_assets(OWNER).await.expect("fresh fetch");
    let stale = stale.await.expect("join");
    assert!(matches!(stale, Err(PortError::Cancelled)));

    let state = workflow.snapshot().expect("snapshot");
    assert_eq!(state.generation, summary.generation);
    assert_eq!(state.status, FetchStatus::Ready);
    assert_eq!(state.displayed().len(), 2);
    // Only the fresh fetch resolved metadata.
    assert_eq!(indexer.metadata_completed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_in_flight_metadata_lookups() {
    let mut indexer = MockIndexer::with_assets(3);
    indexer.metadata_delay = vec![Duration::from_secs(10); 3];
    let indexer = Arc::new(indexer);
    let workflow = Arc::new(NftFetchWorkflow::new(Arc::clone(&indexer)));

    let pending = tokio::spawn({
        let workflow = Arc::clone(&workflow);
        async move { workflow.fetch_owned_assets(OWNER).await }
    });
    wait_until(|| indexer.metadata_calls.load(Ordering::SeqCst) == 3).await;

    workflow.cancel().expect("cancel");
    let result = pending.await.expect("join");
    assert!(matches!(result, Err(PortError::Cancelled)));
    assert_eq!(indexer.metadata_completed.load(Ordering::SeqCst), 0);

    let state = workflow.snapshot().expect("snapshot");
    assert_eq!(state.status, FetchStatus::Idle);
    assert!(!state.in_progress());
    assert!(state.collection.is_none());
}
