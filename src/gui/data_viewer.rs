//! Data Viewer Widget
//! Central panel: before/after metrics, county breakdown and the filtered table.

use crate::charts::{ChartPlotter, TILE_COLORS};
use crate::data::DataProcessor;
use crate::pipeline::DashboardView;
use crate::stats::{CategoryCount, DatasetStats};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 320.0;

// Filtered table geometry
const TABLE_HEIGHT: f32 = 420.0;
const ROW_HEIGHT: f32 = 18.0;
const CHAR_WIDTH: f32 = 7.0;
const MIN_COL_WIDTH: f32 = 60.0;
const MAX_COL_WIDTH: f32 = 260.0;

/// Display copy of the latest pipeline output.
#[derive(Default)]
pub struct DataViewer {
    raw_stats: DatasetStats,
    clean_stats: DatasetStats,
    filtered_rows: usize,
    counts: Vec<CategoryCount>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<f32>,
    category_label: String,
    error: Option<String>,
    has_data: bool,
}

impl DataViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a fresh pipeline result. Table cells are formatted once here.
    pub fn set_view(&mut self, view: &DashboardView, category_label: &str) {
        self.raw_stats = view.raw_stats;
        self.clean_stats = view.clean_stats;
        self.filtered_rows = view.filtered.height();
        self.counts = view.category_counts.clone();
        self.category_label = category_label.to_string();
        self.header = view
            .filtered
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        match DataProcessor::to_display_rows(&view.filtered) {
            Ok(rows) => {
                self.col_widths = Self::column_widths(&self.header, &rows);
                self.rows = rows;
                self.error = None;
                self.has_data = true;
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Show a blocking error instead of the dashboard body.
    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
        self.has_data = false;
        self.rows.clear();
        self.col_widths.clear();
        self.counts.clear();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("📊 Mobilization Data Analysis Dashboard")
                .size(24.0)
                .strong(),
        );
        ui.add_space(10.0);

        if let Some(error) = &self.error {
            egui::Frame::none()
                .rounding(8.0)
                .stroke(egui::Stroke::new(2.0, Color32::from_rgb(220, 53, 69)))
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(format!("⚠ {}", error))
                            .size(14.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                    ui.label("Use Reload to try again.");
                });
            return;
        }

        if !self.has_data {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Data Overview (Before Deduplication)")
                        .size(16.0)
                        .strong(),
                );
                ChartPlotter::draw_metric_tiles(ui, &self.raw_stats, TILE_COLORS[0]);
                ui.add_space(10.0);

                ui.label(
                    RichText::new("Data Overview (After Deduplication)")
                        .size(16.0)
                        .strong(),
                );
                ChartPlotter::draw_metric_tiles(ui, &self.clean_stats, TILE_COLORS[1]);
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!(
                        "{} duplicate records removed · {} records match the filters",
                        self.raw_stats
                            .total_records
                            .saturating_sub(self.clean_stats.total_records),
                        self.filtered_rows
                    ))
                    .color(TILE_COLORS[2]),
                );

                ui.add_space(15.0);
                ui.separator();

                ui.label(RichText::new("County Breakdown").size(16.0).strong());
                ui.add_space(5.0);
                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| {
                        ui.set_width(260.0);
                        ChartPlotter::draw_counts_table(ui, &self.counts, &self.category_label);
                    });
                    ui.vertical(|ui| {
                        ChartPlotter::draw_bar_chart(ui, &self.counts, CHART_HEIGHT);
                    });
                });

                ui.add_space(15.0);
                ui.separator();

                ui.label(RichText::new("Filtered Data").size(16.0).strong());
                ui.label(
                    RichText::new(format!("{} rows", self.rows.len()))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(5.0);
                self.draw_table(ui);
            });
    }

    /// Width per column from the longest cell, clamped.
    fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<f32> {
        header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let longest = rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.trim().chars().count()))
                    .max()
                    .unwrap_or(0);
                (longest as f32 * CHAR_WIDTH).clamp(MIN_COL_WIDTH, MAX_COL_WIDTH)
            })
            .collect()
    }

    /// Header plus a virtualised body: only visible rows are laid out.
    fn draw_table(&self, ui: &mut egui::Ui) {
        ScrollArea::horizontal()
            .id_salt("filtered_table_h")
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        for (name, width) in self.header.iter().zip(&self.col_widths) {
                            ui.add_sized(
                                [*width, ROW_HEIGHT],
                                egui::Label::new(RichText::new(name.trim()).strong().size(11.0))
                                    .truncate(),
                            );
                        }
                    });
                    ui.separator();

                    ScrollArea::vertical()
                        .id_salt("filtered_table_rows")
                        .max_height(TABLE_HEIGHT)
                        .auto_shrink([false, true])
                        .show_rows(ui, ROW_HEIGHT, self.rows.len(), |ui, row_range| {
                            for row in &self.rows[row_range] {
                                ui.horizontal(|ui| {
                                    for (cell, width) in row.iter().zip(&self.col_widths) {
                                        ui.add_sized(
                                            [*width, ROW_HEIGHT],
                                            egui::Label::new(RichText::new(cell).size(11.0))
                                                .truncate(),
                                        );
                                    }
                                });
                            }
                        });
                });
            });
    }
}
