//! NFT Indexer: connect a wallet and browse the NFTs an address owns

use eframe::egui;
use eyre::WrapErr;

use nft_indexer_adapters::IndexerConfig;

mod app;
mod indexer_bridge;
mod ui;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting NFT Indexer");

    let config = IndexerConfig::from_env().wrap_err("invalid NFT_INDEXER_* configuration")?;
    config
        .validate()
        .wrap_err("configuration rejected for this runtime profile")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("nft-indexer-io")
        .build()
        .wrap_err("failed to start async runtime")?;

    let bridge = indexer_bridge::IndexerBridge::from_config(&config)
        .wrap_err("failed to initialize indexer")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("NFT Indexer")
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "NFT Indexer",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, runtime, bridge)))),
    )
    .map_err(|e| eyre::eyre!("eframe exited with error: {e}"))
}
