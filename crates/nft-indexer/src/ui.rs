//! UI helper components

use eframe::egui;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);
const CONNECT_FILL: egui::Color32 = egui::Color32::from_rgb(0x00, 0xa8, 0x6b);
const DISCONNECT_FILL: egui::Color32 = egui::Color32::from_rgb(0xab, 0x4e, 0x52);

/// Public gateway used to render `ipfs://` image URIs.
const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Open URL in the system browser
pub fn open_url_new_tab(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "failed to open url");
    }
}

/// Rewrites `ipfs://` URIs so the http image loader can fetch them.
pub fn displayable_image_uri(uri: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(path) => format!("{}{}", IPFS_GATEWAY, path.trim_start_matches("ipfs/")),
        None => uri.to_owned(),
    }
}

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).color(ACCENT));
}

/// Section header with separator
pub fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.add_space(10.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(text).strong().size(14.0));
    });
    ui.separator();
}

/// Create a styled text edit for address input
pub fn address_input(ui: &mut egui::Ui, value: &mut String) -> egui::Response {
    ui.add(
        egui::TextEdit::singleline(value)
            .hint_text("0x123....789")
            .desired_width(400.0)
            .font(egui::TextStyle::Monospace),
    )
}

/// Loading spinner
pub fn loading_spinner(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label("Loading...");
    });
}

/// Error message display
pub fn error_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("❌").size(16.0));
        ui.label(egui::RichText::new(message).color(egui::Color32::from_rgb(220, 80, 80)));
    });
}

// =============================================================================
// STYLED BUTTONS
// =============================================================================

/// Primary action button - teal/accent colored, prominent
pub fn primary_button_enabled(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(130.0, 34.0))
        .fill(egui::Color32::from_rgb(0, 180, 150));
    ui.add_enabled(enabled, btn)
}

/// Wallet toggle: green while disconnected, red while connected.
pub fn wallet_button(ui: &mut egui::Ui, connected: bool) -> egui::Response {
    let (text, fill) = if connected {
        ("Disconnect", DISCONNECT_FILL)
    } else {
        ("Connect Wallet", CONNECT_FILL)
    };
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(130.0, 30.0))
        .fill(fill);
    ui.add(btn)
}

// =============================================================================
// VISUAL GROUPING
// =============================================================================

/// Render content in a subtle card/frame
pub fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}
