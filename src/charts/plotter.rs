//! Chart Plotter Module
//! Interactive county breakdown using egui_plot.

use crate::stats::{CategoryCount, DatasetStats};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Plot};

pub const BAR_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

/// Accent colors for the metric tiles (before, after, filtered).
pub const TILE_COLORS: [Color32; 3] = [
    Color32::from_rgb(96, 125, 139),  // Blue Grey
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(243, 156, 18), // Orange
];

/// Draws the dashboard's charts and summary tables.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Bar chart of counts per category, in the order given.
    pub fn draw_bar_chart(ui: &mut egui::Ui, counts: &[CategoryCount], height: f32) {
        let labels: Vec<String> = counts.iter().map(|c| c.category.clone()).collect();

        let bars: Vec<Bar> = counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Bar::new(i as f64, c.count as f64)
                    .name(&c.category)
                    .width(0.6)
                    .fill(BAR_COLOR)
            })
            .collect();

        Plot::new("category_breakdown")
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label("County")
            .y_axis_label("Count")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx < 0.0 || (mark.value - idx).abs() > f64::EPSILON {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("Count"));
            });
    }

    /// Category / count table.
    pub fn draw_counts_table(ui: &mut egui::Ui, counts: &[CategoryCount], category_label: &str) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("category_counts_table")
                    .striped(true)
                    .min_col_width(80.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new(category_label).strong().size(12.0));
                        ui.label(RichText::new("Count").strong().size(12.0));
                        ui.end_row();

                        for c in counts {
                            ui.label(RichText::new(&c.category).size(12.0));
                            ui.label(RichText::new(c.count.to_string()).size(12.0));
                            ui.end_row();
                        }
                    });
            });
    }

    /// Row of three metric tiles for one snapshot.
    pub fn draw_metric_tiles(ui: &mut egui::Ui, stats: &DatasetStats, accent: Color32) {
        ui.columns(3, |cols| {
            let tiles = [
                ("Total Records", stats.total_records),
                ("Unique IDs", stats.unique_ids),
                ("Unique Phones", stats.unique_phones),
            ];
            for (col, (label, value)) in cols.iter_mut().zip(tiles) {
                Self::draw_tile(col, label, value, accent);
            }
        });
    }

    fn draw_tile(ui: &mut egui::Ui, label: &str, value: usize, accent: Color32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, accent))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new(label).size(12.0).color(Color32::GRAY));
                ui.label(RichText::new(value.to_string()).size(26.0).strong());
            });
    }
}
