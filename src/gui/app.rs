//! Mobilization Dashboard Main Application
//! Main window with control panel and dashboard view.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{DataLoader, DataSource, FileSource, HttpSource, LoadedDataset, SessionCache};
use crate::export::Exporter;
use crate::gui::{ControlPanel, ControlPanelAction, DataViewer};
use crate::pipeline::{DashboardView, Pipeline};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

const CHART_PNG_SIZE: (u32, u32) = (1400, 800);

/// Source loading result from background thread
enum LoadResult {
    Complete(LoadedDataset),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    source: Arc<dyn DataSource>,
    cache: SessionCache,
    control_panel: ControlPanel,
    viewer: DataViewer,
    view: Option<DashboardView>,

    // Async source fetch
    load_rx: Option<Receiver<LoadResult>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let source: Arc<dyn DataSource> = Arc::new(Self::remote_source(&config));
        let mut app = Self {
            control_panel: ControlPanel::new(source.describe()),
            config,
            source,
            cache: SessionCache::new(),
            viewer: DataViewer::new(),
            view: None,
            load_rx: None,
        };
        app.start_load();
        app
    }

    fn remote_source(config: &DashboardConfig) -> HttpSource {
        HttpSource::new(config.source_url.clone(), config.request_timeout())
    }

    /// Fetch the source in a background thread unless the cache already holds it.
    fn start_load(&mut self) {
        if self.load_rx.is_some() {
            return; // Already loading
        }

        if !self.cache.is_empty() {
            self.recompute();
            return;
        }

        self.control_panel.is_loading = true;
        self.control_panel.set_status("Fetching data...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let source = Arc::clone(&self.source);
        let schema = self.config.schema.clone();

        thread::spawn(move || {
            let result = match DataLoader::load(source.as_ref(), &schema) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for source loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dataset)) => {
                let rows = dataset.df.height();
                self.cache.store(Arc::new(dataset));
                self.control_panel.is_loading = false;
                let at = self
                    .cache
                    .fetched_at()
                    .map(|t| t.format(" at %H:%M:%S").to_string())
                    .unwrap_or_default();
                self.control_panel
                    .set_status(format!("Loaded {} records{}", rows, at));
                self.recompute();
            }
            Ok(LoadResult::Error(e)) => {
                error!(error = %e, "load failed");
                self.control_panel.is_loading = false;
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(format!("Error: {}", e));
                self.view = None;
                self.viewer.set_error(e);
            }
            Err(_) => {
                // Still loading
                self.load_rx = Some(rx);
            }
        }
    }

    /// Re-run the whole pipeline against the cached dataset.
    fn recompute(&mut self) {
        let Some(dataset) = self.cache.get() else {
            return;
        };

        let schema = &self.config.schema;
        self.control_panel.has_timestamp = dataset.has_timestamp;
        let params = self.control_panel.filter_params();

        match Pipeline::run(&dataset.df, schema, &params) {
            Ok(view) => {
                self.control_panel
                    .update_categories(view.category_options.clone());
                self.control_panel.export_enabled = true;
                self.viewer.set_view(&view, &schema.category_column);
                self.view = Some(view);
            }
            Err(e) => {
                error!(error = %e, "pipeline failed");
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(format!("Error: {}", e));
                self.view = None;
                self.viewer.set_error(e.to_string());
            }
        }
    }

    fn handle_reload(&mut self) {
        self.cache.invalidate();
        self.viewer.clear();
        self.view = None;
        self.start_load();
    }

    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.switch_source(Arc::new(FileSource::new(path)));
        }
    }

    fn switch_source(&mut self, source: Arc<dyn DataSource>) {
        info!(source = %source.describe(), "switching data source");
        self.control_panel.source_label = source.describe();
        self.source = source;
        self.handle_reload();
    }

    /// Ask for a target path and write `bytes` there.
    fn save_bytes(&mut self, name: &str, filter: (&str, &[&str]), bytes: Vec<u8>) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter(filter.0, filter.1)
            .set_file_name(name)
            .save_file()
        else {
            return; // User cancelled
        };

        match std::fs::write(&path, bytes) {
            Ok(()) => {
                info!(path = %path.display(), "export saved");
                self.control_panel
                    .set_status(format!("Saved {}", path.display()));
            }
            Err(e) => {
                self.control_panel
                    .set_status(format!("Error: failed to write {}: {}", path.display(), e));
            }
        }
    }

    fn handle_export(&mut self, action: ControlPanelAction) {
        let Some(view) = &self.view else {
            self.control_panel.set_status("No data to export");
            return;
        };
        let names = self.config.export.clone();

        let result = match action {
            ControlPanelAction::ExportCleanCsv => Exporter::to_csv(&view.clean)
                .map(|b| (names.clean_csv, ("CSV", &["csv"][..]), b))
                .map_err(|e| e.to_string()),
            ControlPanelAction::ExportFilteredCsv => Exporter::to_csv(&view.filtered)
                .map(|b| (names.filtered_csv, ("CSV", &["csv"][..]), b))
                .map_err(|e| e.to_string()),
            ControlPanelAction::ExportBreakdownXlsx => view
                .counts_frame(&self.config.schema)
                .map_err(|e| e.to_string())
                .and_then(|frame| Exporter::to_spreadsheet(&frame).map_err(|e| e.to_string()))
                .map(|b| (names.breakdown_xlsx, ("Excel Workbook", &["xlsx"][..]), b)),
            ControlPanelAction::ExportChartPng => StaticChartRenderer::render_bar_chart_png(
                &view.category_counts,
                "County Breakdown",
                CHART_PNG_SIZE.0,
                CHART_PNG_SIZE.1,
            )
            .map(|b| (names.breakdown_png, ("PNG Image", &["png"][..]), b))
            .map_err(|e| e.to_string()),
            _ => return,
        };

        match result {
            Ok((name, filter, bytes)) => self.save_bytes(&name, filter, bytes),
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel.set_status(format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.load_rx.is_some() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::UseRemote => {
                            let source = Arc::new(Self::remote_source(&self.config));
                            self.switch_source(source);
                        }
                        ControlPanelAction::FiltersChanged => self.recompute(),
                        ControlPanelAction::ExportCleanCsv
                        | ControlPanelAction::ExportFilteredCsv
                        | ControlPanelAction::ExportBreakdownXlsx
                        | ControlPanelAction::ExportChartPng => self.handle_export(action),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(ui);
        });
    }
}
