//! Main application state and update loop

use eframe::egui;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use nft_indexer_core::{explorer_url, Asset, FetchStatus};

use crate::indexer_bridge::IndexerBridge;
use crate::ui;

const GRID_COLUMNS: usize = 4;
const CARD_WIDTH: f32 = 200.0;

/// The main application state
pub struct App {
    runtime: Runtime,
    bridge: IndexerBridge,
    /// Address typed into the fetch box
    address_input: String,
    /// Session address seen on the previous frame, used to prefill the input
    last_session_address: Option<String>,
    event_pump: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime, bridge: IndexerBridge) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        let event_pump = bridge.start_event_pump(runtime.handle(), &cc.egui_ctx);

        Self {
            runtime,
            bridge,
            address_input: String::new(),
            last_session_address: None,
            event_pump,
        }
    }

    /// Follow the wallet: when the connected account changes, replace the
    /// input unless the user typed something else.
    fn sync_address_input(&mut self, session_address: Option<String>) {
        if session_address == self.last_session_address {
            return;
        }
        let untouched = self.address_input.is_empty()
            || self.last_session_address.as_deref() == Some(self.address_input.as_str());
        if untouched {
            self.address_input = session_address.clone().unwrap_or_default();
        }
        self.last_session_address = session_address;
    }

    fn render_header(&self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let session = self.bridge.session();
        ui.horizontal(|ui| {
            ui.heading(
                egui::RichText::new("🖼 NFT Indexer")
                    .size(22.0)
                    .color(egui::Color32::from_rgb(0, 212, 170)),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui::wallet_button(ui, session.is_connected()).clicked() {
                    if session.is_connected() {
                        self.bridge.disconnect(self.runtime.handle(), ctx);
                    } else {
                        self.bridge.connect(self.runtime.handle(), ctx);
                    }
                }
                let status = match session.address.as_deref() {
                    Some(address) if session.is_connected() => {
                        format!("connected address: {address}")
                    }
                    _ => "not connected".to_owned(),
                };
                ui.label(egui::RichText::new(status).monospace().weak());
            });
        });
    }

    fn render_fetch_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, busy: bool) {
        ui::styled_heading(ui, "NFT Indexer");
        ui.label("Plug in an address and this website will return all of its NFTs!");
        ui.add_space(15.0);

        ui.label("Get all the ERC-721 tokens of this address:");
        ui.horizontal(|ui| {
            let response = ui::address_input(ui, &mut self.address_input);
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui::primary_button_enabled(ui, "Fetch NFTs", !busy).clicked();
            if clicked || (submitted && !busy) {
                self.bridge
                    .fetch(self.runtime.handle(), ctx, self.address_input.clone());
            }
        });
    }

    fn render_assets(&self, ui: &mut egui::Ui, assets: &[Asset]) {
        ui::section_header(ui, "Here are your NFTs:");
        if assets.is_empty() {
            ui.label(egui::RichText::new("No NFTs found for this address.").weak());
            return;
        }

        egui::Grid::new("nft_grid")
            .num_columns(GRID_COLUMNS)
            .spacing([12.0, 12.0])
            .show(ui, |ui| {
                for (i, asset) in assets.iter().enumerate() {
                    self.render_asset_card(ui, asset);
                    if (i + 1) % GRID_COLUMNS == 0 {
                        ui.end_row();
                    }
                }
            });
    }

    fn render_asset_card(&self, ui: &mut egui::Ui, asset: &Asset) {
        ui::card(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                if let Some(uri) = asset.image_uri.as_deref() {
                    ui.add(
                        egui::Image::from_uri(ui::displayable_image_uri(uri))
                            .max_width(CARD_WIDTH)
                            .rounding(4.0),
                    );
                }
                ui.label(egui::RichText::new(&asset.title).strong());
                ui.label(format!("Type: {}", asset.token_type.label()));
                if let Some(description) = asset.description.as_deref() {
                    ui.label(egui::RichText::new(description).small());
                }

                let url = explorer_url(self.bridge.explorer_base_url(), &asset.contract_address);
                if ui.link("View on explorer").on_hover_text(&url).clicked() {
                    ui::open_url_new_tab(&url);
                }
            });
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        let session = self.bridge.session();
        let connected = session.is_connected();
        self.sync_address_input(session.address.filter(|_| connected));
        let fetch = self.bridge.fetch_state();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            self.render_header(ui, ctx);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "{} · {}",
                    env!("GIT_HASH"),
                    env!("BUILD_TIME")
                ))
                .small()
                .weak(),
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                self.render_fetch_form(ui, ctx, fetch.in_progress());
                ui.add_space(15.0);

                match fetch.status {
                    FetchStatus::Fetching => ui::loading_spinner(ui),
                    FetchStatus::Failed => ui::error_message(
                        ui,
                        fetch.error.as_deref().unwrap_or("Failed to fetch NFTs"),
                    ),
                    FetchStatus::Ready if fetch.has_fetched => {
                        self.render_assets(ui, fetch.displayed())
                    }
                    _ => {}
                }
                ui.add_space(20.0);
            });
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(pump) = self.event_pump.take() {
            pump.abort();
        }
        self.bridge.shutdown();
    }
}
