//! Mobilization Dashboard - Interactive reporting over the mobilization sheet
//!
//! Loads the sheet, removes duplicate sign-ups and shows a filterable
//! county breakdown with CSV / XLSX downloads.

use eframe::egui;
use mobilization_dashboard::bootstrap::setup_logging;
use mobilization_dashboard::config::DashboardConfig;
use mobilization_dashboard::gui::DashboardApp;

fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::resolve()?;
    setup_logging(&config.log_level);
    tracing::info!(source = %config.source_url, "starting dashboard");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Mobilization Analysis"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Mobilization Analysis",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start window: {e}"))
}
